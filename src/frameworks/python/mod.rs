//! Shared scanning and emission helpers for the Python plugins.
//!
//! Python structure is indentation-based, so the scanners here track
//! indent columns instead of brace depth. Both plugins emit IR-driven
//! output through `PyWriter` (hash comments, four-space indents).

pub mod pytest;
pub mod unittest;

use std::sync::LazyLock;

use regex::Regex;

use crate::ir::{
    Assertion, AssertionKind, ImportBindings, ImportStatement, NodeMeta,
};
use crate::markers::{CommentStyle, todo_marker};

pub(crate) fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Parse `import x` / `from x import a, b` lines.
pub(crate) fn parse_python_import(trimmed: &str, line_no: usize) -> Option<ImportStatement> {
    static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^import\s+(?<module>[\w.]+)(?:\s+as\s+(?<alias>\w+))?\s*$")
            .expect("import regex")
    });
    static FROM_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^from\s+(?<module>[\w.]+)\s+import\s+(?<names>[\w.,\s*]+)$")
            .expect("from regex")
    });

    let meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
    if let Some(caps) = IMPORT_RE.captures(trimmed) {
        let bindings = ImportBindings {
            default_binding: Some(
                caps.name("alias")
                    .map(|a| a.as_str().to_string())
                    .unwrap_or_else(|| caps["module"].to_string()),
            ),
            ..Default::default()
        };
        let mut import = ImportStatement::new(&caps["module"]).with_bindings(bindings);
        import.meta = meta;
        return Some(import);
    }
    if let Some(caps) = FROM_RE.captures(trimmed) {
        let bindings = ImportBindings {
            named: caps["names"]
                .split(',')
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect(),
            ..Default::default()
        };
        let mut import = ImportStatement::new(&caps["module"]).with_bindings(bindings);
        import.meta = meta;
        return Some(import);
    }
    None
}

/// Split call arguments on top-level commas (paren and bracket aware).
pub(crate) fn split_args(args: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in args.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    current.push(c);
                }
                '(' | '[' | '{' => {
                    depth += 1;
                    current.push(c);
                }
                ')' | ']' | '}' => {
                    depth -= 1;
                    current.push(c);
                }
                ',' if depth == 0 => {
                    parts.push(current.trim().to_string());
                    current.clear();
                }
                _ => current.push(c),
            },
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// Parse a bare `assert` statement into the vocabulary.
pub(crate) fn parse_assert_statement(trimmed: &str, line_no: usize) -> Option<Assertion> {
    let expr = trimmed.strip_prefix("assert ")?.trim();
    // A trailing `, "message"` is informational only.
    let expr = match split_args(expr).split_first() {
        Some((first, _)) => first.clone(),
        None => expr.to_string(),
    };

    let meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
    let mut assertion = if let Some((left, right)) = split_binary(&expr, " == ") {
        Assertion::new(AssertionKind::Equal, left).with_expected(right)
    } else if let Some((left, right)) = split_binary(&expr, " != ") {
        Assertion::new(AssertionKind::Equal, left)
            .with_expected(right)
            .negated()
    } else if let Some(left) = expr.strip_suffix(" is not None") {
        Assertion::new(AssertionKind::IsNull, left.trim()).negated()
    } else if let Some(left) = expr.strip_suffix(" is None") {
        Assertion::new(AssertionKind::IsNull, left.trim())
    } else if let Some((member, container)) = split_binary(&expr, " not in ") {
        Assertion::new(AssertionKind::Contains, container)
            .with_expected(member)
            .negated()
    } else if let Some((member, container)) = split_binary(&expr, " in ") {
        Assertion::new(AssertionKind::Contains, container).with_expected(member)
    } else if let Some(inner) = expr.strip_prefix("not ") {
        Assertion::new(AssertionKind::Falsy, inner.trim())
    } else {
        Assertion::new(AssertionKind::Truthy, expr.as_str())
    };
    let confidence = assertion.meta.confidence;
    assertion.meta = meta.with_confidence(confidence);
    Some(assertion)
}

/// Split on an operator at quote depth zero.
fn split_binary(expr: &str, op: &str) -> Option<(String, String)> {
    let mut quote: Option<char> = None;
    let bytes = expr.as_bytes();
    let op_bytes = op.as_bytes();
    let mut i = 0;
    while i + op_bytes.len() <= bytes.len() {
        let c = bytes[i] as char;
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => {
                if c == '\'' || c == '"' {
                    quote = Some(c);
                } else if expr[i..].starts_with(op) {
                    return Some((
                        expr[..i].trim().to_string(),
                        expr[i + op.len()..].trim().to_string(),
                    ));
                }
            }
        }
        i += 1;
    }
    None
}

/// Indent-aware Python writer with sequential TODO ids.
pub(crate) struct PyWriter {
    lines: Vec<String>,
    pub depth: usize,
    todo_id: usize,
}

impl PyWriter {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            depth: 0,
            todo_id: 0,
        }
    }

    pub fn push(&mut self, line: &str) {
        if line.is_empty() {
            self.lines.push(String::new());
            return;
        }
        self.lines
            .push(format!("{}{line}", "    ".repeat(self.depth)));
    }

    pub fn push_block(&mut self, block: &str) {
        for line in block.lines() {
            self.push(line);
        }
    }

    pub fn blank(&mut self) {
        if !self.lines.last().is_none_or(|l| l.is_empty()) {
            self.lines.push(String::new());
        }
    }

    pub fn todo(&mut self, description: &str, original: &str, action: &str) {
        self.todo_id += 1;
        let marker = todo_marker(CommentStyle::Hash, self.todo_id, description, original, action);
        self.push_block(&marker);
    }

    pub fn finish(self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}
