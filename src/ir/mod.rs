//! Intermediate representation of test files.
//!
//! The IR is a tree of tagged variants using an enum + trait pattern:
//! - Each construct is a separate struct with its specific fields
//! - Position enums (`FileItem`, `SuiteItem`, `CaseItem`) wrap the structs
//!   and statically restrict what may appear where
//! - The `IrItem` trait provides a common metadata interface
//!
//! Trees are built once by a parser and never mutated afterwards;
//! transforms produce new trees. `walk` provides the deterministic
//! pre-order traversal every consumer (scorer, router, validators) uses.

mod node;
mod walk;

pub use node::{
    Assertion, AssertionKind, CaseItem, Comment, Confidence, FileItem, Hook, HookType,
    ImportBindings, ImportStatement, IrItem, MockCall, MockKind, Modifier, ModifierType,
    Navigation, NavigationAction, NodeKind, NodeMeta, ParameterSet, RawCode, SharedVariable,
    SourceLocation, SuiteItem, TestCase, TestFile, TestSuite,
};
pub use walk::{IrRef, walk_ir};
