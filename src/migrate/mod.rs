//! Project-wide migration.
//!
//! The engine drives one migration run end to end: scan, classify,
//! dependency graph, topologically ordered conversion, import
//! rewriting, checklist, and resumable persisted state.
//!
//! ## Module Structure
//!
//! - `engine`: the orchestrator and its options
//! - `scanner`: include/ignore aware project walk
//! - `classify`: test/helper/config/fixture/type-def classification
//! - `imports`: JS-family import specifier extraction
//! - `graph`: resolution, cycle detection, topological sort
//! - `normalize`: BOM/CRLF/binary handling
//! - `recovery`: line-by-line fallback after parse failures
//! - `validate`: structural output checks (confidence cap)
//! - `rename`: target filename conventions
//! - `rewrite`: import rewriting after renames
//! - `state`: persisted state document (atomic, versioned)
//! - `checklist`: markdown checklist generation
//! - `report`: machine-readable report types

mod checklist;
mod classify;
mod engine;
mod graph;
mod imports;
mod normalize;
mod recovery;
mod rename;
mod report;
mod rewrite;
mod scanner;
mod state;
mod validate;

pub use checklist::{ChecklistEntry, generate_checklist};
pub use classify::{Classification, FileKind, classify};
pub use engine::{
    DEFAULT_STATE_DIR, FileResult, MigrateOptions, MigrationEngine, MigrationOutcome,
    ProgressStatus,
};
pub use graph::{DependencyGraph, GraphBuild, build_graph, resolve_relative, topo_sort};
pub use imports::{ExtractedImport, extract_import_specifiers};
pub use normalize::{NormalizeOutcome, Normalized, normalize};
pub use recovery::{RECOVERY_CONFIDENCE, recover_line_by_line};
pub use rename::renamed_file_name;
pub use report::{FailureReport, FileReport, MigrationReport, MigrationSummary};
pub use rewrite::rewrite_imports;
pub use scanner::{ScanResult, scan_files};
pub use state::{FileEntry, FileStatus, LoadedState, MigrationState, StateStore};
pub use validate::{VALIDATION_CONFIDENCE_CAP, ValidationIssue, validate_output};
