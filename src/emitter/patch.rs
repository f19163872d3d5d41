//! Per-node baseline patching.
//!
//! The regex baseline is correct line by line but structurally blind; the
//! structural emitter knows individual nodes but may not cover the whole
//! vocabulary. Patching takes the best of both: every supported node's
//! line in the baseline is replaced with the structural rendition, and
//! everything else keeps the baseline text.
//!
//! Replacement rules, pinned:
//! - nodes are considered in IR pre-order
//! - only nodes with `supported == true` and a non-empty original source
//!   are eligible
//! - the first not-yet-replaced baseline line whose trimmed form matches
//!   is replaced; each line is replaced at most once
//! - the line's leading indentation and trailing semicolon survive

use super::{EmitAttempts, EmittableNode, IrEmitter, collect_emittable};
use crate::ir::TestFile;

/// Patch `baseline` with structural emissions for the nodes of `ir`.
///
/// Returns the patched text and the attempted/succeeded tally
/// (`attempted` counts every emittable node, supported or not).
pub fn patch_baseline(
    baseline: &str,
    ir: &TestFile,
    emitter: &dyn IrEmitter,
) -> (String, EmitAttempts) {
    let nodes = collect_emittable(ir);
    let attempted = nodes.len();

    let mut lines: Vec<String> = baseline.lines().map(String::from).collect();
    let mut replaced = vec![false; lines.len()];
    let mut succeeded = 0usize;

    for node in nodes {
        let emitted = emitter.emit_node(node);
        if !emitted.supported || node.original_source().is_empty() {
            continue;
        }
        if let Some(index) = find_baseline_line(&lines, &replaced, emitter, node) {
            lines[index] = splice_line(&lines[index], &emitted.code);
            replaced[index] = true;
            succeeded += 1;
        }
    }

    let mut output = lines.join("\n");
    if baseline.ends_with('\n') {
        output.push('\n');
    }
    (output, EmitAttempts { attempted, succeeded })
}

fn find_baseline_line(
    lines: &[String],
    replaced: &[bool],
    emitter: &dyn IrEmitter,
    node: EmittableNode<'_>,
) -> Option<usize> {
    lines
        .iter()
        .enumerate()
        .find(|(i, line)| !replaced[*i] && emitter.matches_baseline(line.trim(), node))
        .map(|(i, _)| i)
}

/// Replace a line's content, keeping its indentation and semicolon.
fn splice_line(line: &str, code: &str) -> String {
    let indent_len = line.len() - line.trim_start().len();
    let indent = &line[..indent_len];
    let had_semicolon = line.trim_end().ends_with(';');
    let mut spliced = format!("{indent}{code}");
    if had_semicolon && !spliced.trim_end().ends_with(';') {
        spliced.push(';');
    }
    spliced
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::emitter::EmittedNode;
    use crate::ir::{Assertion, AssertionKind, CaseItem, FileItem, TestCase};

    /// Emits `OK(<subject>)` for known kinds; matches baseline lines that
    /// contain the node's original source.
    struct SubjectEmitter;

    impl IrEmitter for SubjectEmitter {
        fn emit_node(&self, node: EmittableNode<'_>) -> EmittedNode {
            match node {
                EmittableNode::Assertion(a) if a.assertion_kind.is_known() => {
                    EmittedNode::supported(format!("OK({})", a.subject))
                }
                _ => EmittedNode::unsupported(),
            }
        }

        fn matches_baseline(&self, line: &str, node: EmittableNode<'_>) -> bool {
            line.contains(node.original_source())
        }

        fn emit_full_file(&self, _ir: &TestFile) -> Option<String> {
            None
        }
    }

    fn assertion(kind: AssertionKind, subject: &str, source: &str) -> Assertion {
        let mut a = Assertion::new(kind, subject);
        a.meta.original_source = source.to_string();
        a
    }

    fn file_of(assertions: Vec<Assertion>) -> TestFile {
        let mut case = TestCase::new("case");
        for a in assertions {
            case.body.push(CaseItem::Assertion(a));
        }
        let mut file = TestFile::new("javascript");
        file.body.push(FileItem::TestCase(case));
        file
    }

    #[test]
    fn supported_node_replaces_matching_line_keeping_indent_and_semicolon() {
        let ir = file_of(vec![assertion(AssertionKind::Equal, "x", "old(x)")]);
        let baseline = "first\n    old(x);\nlast\n";

        let (patched, attempts) = patch_baseline(baseline, &ir, &SubjectEmitter);
        assert_eq!(patched, "first\n    OK(x);\nlast\n");
        assert_eq!(attempts, EmitAttempts { attempted: 1, succeeded: 1 });
    }

    #[test]
    fn unsupported_node_keeps_baseline_verbatim() {
        let ir = file_of(vec![assertion(
            AssertionKind::Other("custom.matcher".to_string()),
            "x",
            "weird(x)",
        )]);
        let baseline = "weird(x);\n";

        let (patched, attempts) = patch_baseline(baseline, &ir, &SubjectEmitter);
        assert_eq!(patched, baseline);
        assert_eq!(attempts, EmitAttempts { attempted: 1, succeeded: 0 });
    }

    #[test]
    fn node_without_original_source_is_skipped() {
        let mut a = Assertion::new(AssertionKind::Equal, "x");
        a.meta.original_source.clear();
        let ir = file_of(vec![a]);
        let baseline = "anything\n";

        let (patched, attempts) = patch_baseline(baseline, &ir, &SubjectEmitter);
        assert_eq!(patched, baseline);
        assert_eq!(attempts, EmitAttempts { attempted: 1, succeeded: 0 });
    }

    /// Two nodes whose sources both appear on both candidate lines: the
    /// first node (IR order) takes the first line, the second node takes
    /// the next one. First-match-wins, each line consumed once.
    #[test]
    fn overlapping_nodes_consume_lines_in_order() {
        let ir = file_of(vec![
            assertion(AssertionKind::Equal, "first", "shared()"),
            assertion(AssertionKind::Equal, "second", "shared()"),
        ]);
        let baseline = "shared();\nshared();\n";

        let (patched, attempts) = patch_baseline(baseline, &ir, &SubjectEmitter);
        assert_eq!(patched, "OK(first);\nOK(second);\n");
        assert_eq!(attempts, EmitAttempts { attempted: 2, succeeded: 2 });
    }

    #[test]
    fn node_with_no_matching_line_does_not_count_as_succeeded() {
        let ir = file_of(vec![assertion(AssertionKind::Equal, "x", "absent(x)")]);
        let baseline = "nothing here\n";

        let (patched, attempts) = patch_baseline(baseline, &ir, &SubjectEmitter);
        assert_eq!(patched, baseline);
        assert_eq!(attempts, EmitAttempts { attempted: 1, succeeded: 0 });
    }

    #[test]
    fn emitted_code_with_own_semicolon_is_not_doubled() {
        struct SemiEmitter;
        impl IrEmitter for SemiEmitter {
            fn emit_node(&self, _node: EmittableNode<'_>) -> EmittedNode {
                EmittedNode::supported("done();")
            }
            fn matches_baseline(&self, line: &str, node: EmittableNode<'_>) -> bool {
                line.contains(node.original_source())
            }
            fn emit_full_file(&self, _ir: &TestFile) -> Option<String> {
                None
            }
        }

        let ir = file_of(vec![assertion(AssertionKind::Equal, "x", "old(x)")]);
        let (patched, _) = patch_baseline("old(x);\n", &ir, &SemiEmitter);
        assert_eq!(patched, "done();\n");
    }
}
