//! Built-in framework plugins.
//!
//! Each plugin is regex-table data behind the `FrameworkPlugin` contract:
//! a detection scorer, a line-structured parser producing IR, a regex
//! baseline emitter, and an import-rewriting table. Grouped by language
//! family:
//!
//! - `js`: jest, vitest, cypress, playwright (bdd)
//! - `python`: pytest (function), unittest (xunit)
//! - `java`: junit4, junit5 (xunit)

pub mod java;
pub mod js;
pub mod python;

use std::sync::Arc;

use crate::ir::{Confidence, IrRef, TestFile, walk_ir};
use crate::markers::{CommentStyle, todo_marker};
use crate::registry::FrameworkRegistry;

/// Register every built-in plugin. Called once at startup.
pub fn register_builtins(registry: &mut FrameworkRegistry) {
    let plugins: Vec<Arc<dyn crate::registry::FrameworkPlugin>> = vec![
        Arc::new(js::jest::JestPlugin::new()),
        Arc::new(js::vitest::VitestPlugin::new()),
        Arc::new(js::cypress::CypressPlugin::new()),
        Arc::new(js::playwright::PlaywrightPlugin::new()),
        Arc::new(python::pytest::PytestPlugin::new()),
        Arc::new(python::unittest::UnittestPlugin::new()),
        Arc::new(java::junit4::Junit4Plugin::new()),
        Arc::new(java::junit5::Junit5Plugin::new()),
    ];
    for plugin in plugins {
        // Built-ins always satisfy the contract.
        registry
            .register(plugin)
            .expect("built-in plugin must be valid");
    }
}

/// Insert a TODO marker above every output line that carries an
/// unconvertible construct. Baseline emitters call this so nothing is
/// silently dropped; comment lines are never matched or re-marked.
pub(crate) fn annotate_unconvertible(
    output: String,
    ir: &TestFile,
    style: CommentStyle,
    action: &str,
) -> String {
    let mut originals: Vec<(String, String)> = Vec::new();
    walk_ir(ir, &mut |node| {
        let meta = node.meta();
        if meta.confidence != Confidence::Unconvertible || meta.original_source.is_empty() {
            return;
        }
        let description = match node {
            IrRef::Assertion(a) => {
                format!("unconvertible assertion '{}'", a.assertion_kind.as_str())
            }
            IrRef::MockCall(m) => format!("unconvertible mock call '{}'", m.mock_kind),
            _ => "unconvertible construct".to_string(),
        };
        originals.push((meta.original_source.clone(), description));
    });
    if originals.is_empty() {
        return output;
    }

    let mut lines: Vec<String> = output.lines().map(String::from).collect();
    let mut marked = vec![false; lines.len()];
    let mut todo_id = 0usize;
    for (original, description) in originals {
        let needle = original.trim();
        let found = lines.iter().enumerate().position(|(i, line)| {
            let trimmed = line.trim();
            !marked[i] && !trimmed.starts_with(style.prefix()) && trimmed.contains(needle)
        });
        if let Some(index) = found {
            todo_id += 1;
            let line = &lines[index];
            let indent_len = line.len() - line.trim_start().len();
            let indent = line[..indent_len].to_string();
            let marker = todo_marker(style, todo_id, &description, &original, action);
            let block: Vec<String> = marker
                .lines()
                .map(|marker_line| format!("{indent}{marker_line}"))
                .collect();
            marked[index] = true;
            for (offset, marker_line) in block.into_iter().enumerate() {
                lines.insert(index + offset, marker_line);
                marked.insert(index + offset, true);
            }
        }
    }

    let mut annotated = lines.join("\n");
    if output.ends_with('\n') {
        annotated.push('\n');
    }
    annotated
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn builtins_cover_all_three_languages() {
        let mut registry = FrameworkRegistry::new();
        register_builtins(&mut registry);

        assert_eq!(registry.list(Some("javascript")).len(), 4);
        assert_eq!(registry.list(Some("python")).len(), 2);
        assert_eq!(registry.list(Some("java")).len(), 2);
    }

    #[test]
    fn every_builtin_is_reachable_by_name() {
        let mut registry = FrameworkRegistry::new();
        register_builtins(&mut registry);

        for name in [
            "jest",
            "vitest",
            "cypress",
            "playwright",
            "pytest",
            "unittest",
            "junit4",
            "junit5",
        ] {
            assert!(registry.has(name, None), "{name} should be registered");
        }
    }
}
