//! Emitter routing.
//!
//! Every target plugin has a regex baseline (`FrameworkPlugin::emit`).
//! Some targets additionally have a structural IR emitter, registered
//! here by target name. The router selects between four strategies:
//!
//! - `legacy`: regex baseline only
//! - `ir-patch`: per-node structural emission patched into the baseline
//! - `ir-full`: whole-file structural emission, falling back to ir-patch
//! - `auto`: ir-full → ir-patch → legacy
//!
//! `None` in the emitter table is a valid state and means "no IR emitter
//! for this target", which is the legacy path.

mod patch;
mod playwright;
mod vitest;

use std::collections::BTreeMap;
use std::sync::Arc;

use clap::ValueEnum;

pub use patch::patch_baseline;

use crate::ir::{Assertion, IrRef, MockCall, Navigation, NodeMeta, TestFile, walk_ir};
use crate::registry::FrameworkPlugin;
use crate::score::{EmitAttempts, IrCoverage};

/// Emission strategy requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmitterStrategy {
    /// Regex baseline from the target plugin.
    Legacy,
    /// Structural emission per supported node, baseline for the rest.
    IrPatch,
    /// Whole-file structural emission when available.
    IrFull,
    /// ir-full, then ir-patch, then legacy.
    Auto,
}

impl EmitterStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmitterStrategy::Legacy => "legacy",
            EmitterStrategy::IrPatch => "ir-patch",
            EmitterStrategy::IrFull => "ir-full",
            EmitterStrategy::Auto => "auto",
        }
    }
}

/// A leaf node a structural emitter may be asked to produce.
#[derive(Debug, Clone, Copy)]
pub enum EmittableNode<'a> {
    Assertion(&'a Assertion),
    Navigation(&'a Navigation),
    MockCall(&'a MockCall),
}

impl<'a> EmittableNode<'a> {
    pub fn meta(&self) -> &'a NodeMeta {
        match self {
            EmittableNode::Assertion(n) => &n.meta,
            EmittableNode::Navigation(n) => &n.meta,
            EmittableNode::MockCall(n) => &n.meta,
        }
    }

    pub fn original_source(&self) -> &'a str {
        &self.meta().original_source
    }

    /// Kind string used in coverage reporting.
    pub fn kind_label(&self) -> String {
        match self {
            EmittableNode::Assertion(n) => n.assertion_kind.as_str().to_string(),
            EmittableNode::Navigation(n) => n.action.to_string(),
            EmittableNode::MockCall(n) => n.mock_kind.to_string(),
        }
    }
}

/// Output of `IrEmitter::emit_node`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedNode {
    pub supported: bool,
    pub code: String,
}

impl EmittedNode {
    pub fn supported(code: impl Into<String>) -> Self {
        Self {
            supported: true,
            code: code.into(),
        }
    }

    pub fn unsupported() -> Self {
        Self {
            supported: false,
            code: String::new(),
        }
    }
}

/// Structural emitter for one target framework.
pub trait IrEmitter: Send + Sync {
    /// One line of target code for a leaf node, or unsupported.
    fn emit_node(&self, node: EmittableNode<'_>) -> EmittedNode;

    /// Whether `line` (already trimmed) is the baseline's rendition of
    /// `node`. Drives the per-node patch replacement.
    fn matches_baseline(&self, line: &str, node: EmittableNode<'_>) -> bool;

    /// Whole-file emission, or `None` when not implemented.
    fn emit_full_file(&self, ir: &TestFile) -> Option<String>;
}

/// Which strategy actually produced the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitPath {
    Legacy,
    IrPatch,
    IrFull,
}

impl EmitPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmitPath::Legacy => "legacy",
            EmitPath::IrPatch => "ir-patch",
            EmitPath::IrFull => "ir-full",
        }
    }
}

/// Routed emission result.
#[derive(Debug, Clone)]
pub struct EmitOutcome {
    pub code: String,
    pub path: EmitPath,
    pub attempts: Option<EmitAttempts>,
    pub coverage: Option<IrCoverage>,
}

/// Table of structural emitters, keyed by target framework name.
#[derive(Default)]
pub struct EmitterRouter {
    emitters: BTreeMap<String, Arc<dyn IrEmitter>>,
}

impl EmitterRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Router preloaded with the built-in structural emitters.
    pub fn with_builtins() -> Self {
        let mut router = Self::new();
        router.register("vitest", Arc::new(vitest::VitestIrEmitter::new()));
        router.register("playwright", Arc::new(playwright::PlaywrightIrEmitter::new()));
        router
    }

    pub fn register(&mut self, target: &str, emitter: Arc<dyn IrEmitter>) {
        self.emitters.insert(target.to_string(), emitter);
    }

    /// `None` means the target has no structural emitter (legacy path).
    pub fn get(&self, target: &str) -> Option<Arc<dyn IrEmitter>> {
        self.emitters.get(target).cloned()
    }

    /// Emit `ir` for `target` under the requested strategy.
    pub fn emit(
        &self,
        ir: &TestFile,
        src: &str,
        target: &dyn FrameworkPlugin,
        strategy: EmitterStrategy,
    ) -> EmitOutcome {
        let emitter = self.get(target.name());
        match strategy {
            EmitterStrategy::Legacy => legacy_outcome(ir, src, target),
            EmitterStrategy::IrPatch => match emitter {
                Some(emitter) => patch_outcome(ir, src, target, emitter.as_ref()),
                None => legacy_outcome(ir, src, target),
            },
            EmitterStrategy::IrFull | EmitterStrategy::Auto => match emitter {
                Some(emitter) => match emitter.emit_full_file(ir) {
                    Some(code) => full_outcome(ir, code, emitter.as_ref()),
                    None => patch_outcome(ir, src, target, emitter.as_ref()),
                },
                None => legacy_outcome(ir, src, target),
            },
        }
    }
}

fn legacy_outcome(ir: &TestFile, src: &str, target: &dyn FrameworkPlugin) -> EmitOutcome {
    EmitOutcome {
        code: target.emit(ir, src),
        path: EmitPath::Legacy,
        attempts: None,
        coverage: None,
    }
}

fn patch_outcome(
    ir: &TestFile,
    src: &str,
    target: &dyn FrameworkPlugin,
    emitter: &dyn IrEmitter,
) -> EmitOutcome {
    let baseline = target.emit(ir, src);
    let (code, attempts) = patch_baseline(&baseline, ir, emitter);
    EmitOutcome {
        code,
        path: EmitPath::IrPatch,
        attempts: Some(attempts),
        coverage: Some(compute_coverage(ir, emitter)),
    }
}

fn full_outcome(ir: &TestFile, code: String, emitter: &dyn IrEmitter) -> EmitOutcome {
    let coverage = compute_coverage(ir, emitter);
    let attempts = EmitAttempts {
        attempted: coverage.total(),
        succeeded: coverage.supported(),
    };
    EmitOutcome {
        code,
        path: EmitPath::IrFull,
        attempts: Some(attempts),
        coverage: Some(coverage),
    }
}

/// Collect the leaf emittable nodes of `ir` in pre-order.
pub fn collect_emittable(ir: &TestFile) -> Vec<EmittableNode<'_>> {
    let mut nodes = Vec::new();
    walk_ir(ir, &mut |node| match node {
        IrRef::Assertion(a) => nodes.push(EmittableNode::Assertion(a)),
        IrRef::Navigation(n) => nodes.push(EmittableNode::Navigation(n)),
        IrRef::MockCall(m) => nodes.push(EmittableNode::MockCall(m)),
        IrRef::TestFile(_)
        | IrRef::TestSuite(_)
        | IrRef::TestCase(_)
        | IrRef::Hook(_)
        | IrRef::ImportStatement(_)
        | IrRef::Modifier(_)
        | IrRef::SharedVariable(_)
        | IrRef::ParameterSet(_)
        | IrRef::RawCode(_)
        | IrRef::Comment(_) => {}
    });
    nodes
}

/// Ask the emitter about every emittable node and tally the answers.
pub fn compute_coverage(ir: &TestFile, emitter: &dyn IrEmitter) -> IrCoverage {
    let mut coverage = IrCoverage::default();
    for node in collect_emittable(ir) {
        let supported = emitter.emit_node(node).supported;
        match node {
            EmittableNode::Assertion(a) => {
                coverage.record_assertion(supported, a.assertion_kind.as_str());
            }
            EmittableNode::Navigation(n) => {
                coverage.record_navigation(supported, &n.action.to_string());
            }
            EmittableNode::MockCall(m) => {
                coverage.record_mock_call(supported, &m.mock_kind.to_string());
            }
        }
    }
    coverage.finish()
}
