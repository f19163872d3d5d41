//! Hamlet - test framework converter
//!
//! Hamlet is a CLI tool and library for translating test suites between
//! framework dialects (Cypress to Playwright, Jest to Vitest, pytest to
//! unittest, JUnit 4 to JUnit 5, and back). Each conversion produces the
//! target-framework source, a confidence report, and in-band TODO
//! markers for anything that could not be translated faithfully.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer (user-facing commands)
//! - `config`: Configuration file loading and parsing
//! - `emitter`: Emission strategies and structural IR emitters
//! - `error`: Error taxonomy shared by the core
//! - `frameworks`: Built-in framework plugins (regex tables)
//! - `ir`: Intermediate representation of test files
//! - `markers`: In-band TODO/WARNING diagnostic markers
//! - `migrate`: Project-wide migration engine
//! - `pipeline`: Per-file detect/parse/transform/emit/score pipeline
//! - `registry`: Framework plugin contract and registry
//! - `score`: Confidence scoring and IR coverage

pub mod cli;
pub mod config;
pub mod emitter;
pub mod error;
pub mod frameworks;
pub mod ir;
pub mod markers;
pub mod migrate;
pub mod pipeline;
pub mod registry;
pub mod score;
