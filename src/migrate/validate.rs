//! Structural validation of converted output.
//!
//! Validation never fails a file; any issue caps its confidence at 70
//! so it lands in the review bucket. Checks: bracket balance, leftover
//! source-framework identifiers outside comments and strings, empty
//! suite or case bodies, empty import sources.

use std::sync::LazyLock;

use regex::Regex;

/// Ceiling applied to confidence when validation finds issues.
pub const VALIDATION_CONFIDENCE_CAP: u8 = 70;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub message: String,
    pub line: Option<usize>,
}

impl ValidationIssue {
    fn new(message: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

/// API identifiers that must not survive conversion away from a
/// framework, checked outside comments and strings.
pub fn residue_tokens(source_framework: &str) -> &'static [&'static str] {
    match source_framework {
        "jest" => &["jest."],
        "vitest" => &["vi."],
        "cypress" => &["cy.", "Cypress."],
        "playwright" => &["page.", "@playwright/test"],
        "pytest" => &["pytest."],
        "unittest" => &["self.assert", "unittest.TestCase"],
        "junit4" => &["org.junit.Assert", "org.junit.Test"],
        "junit5" => &["org.junit.jupiter"],
        _ => &[],
    }
}

pub fn validate_output(code: &str, source_framework: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    check_brackets(code, &mut issues);
    check_residue(code, source_framework, &mut issues);
    check_empty_bodies(code, &mut issues);
    check_import_sources(code, &mut issues);
    issues
}

fn check_brackets(code: &str, issues: &mut Vec<ValidationIssue>) {
    let mut round = 0i64;
    let mut curly = 0i64;
    let mut square = 0i64;
    for line in code.lines() {
        for c in strip_line(line).chars() {
            match c {
                '(' => round += 1,
                ')' => round -= 1,
                '{' => curly += 1,
                '}' => curly -= 1,
                '[' => square += 1,
                ']' => square -= 1,
                _ => {}
            }
        }
    }
    if round != 0 || curly != 0 || square != 0 {
        issues.push(ValidationIssue::new("unbalanced brackets in output", None));
    }
}

fn check_residue(code: &str, source_framework: &str, issues: &mut Vec<ValidationIssue>) {
    let tokens = residue_tokens(source_framework);
    if tokens.is_empty() {
        return;
    }
    for (index, line) in code.lines().enumerate() {
        let stripped = strip_line(line);
        for token in tokens {
            if stripped.contains(token) {
                issues.push(ValidationIssue::new(
                    format!("source API '{token}' survives in output"),
                    Some(index + 1),
                ));
            }
        }
    }
}

static EMPTY_BODY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:it|test|describe|test\.describe)(?:\.\w+)?\(.*\{\s*\}\s*\)\s*;?\s*$")
        .expect("empty body regex")
});

fn check_empty_bodies(code: &str, issues: &mut Vec<ValidationIssue>) {
    for (index, line) in code.lines().enumerate() {
        if EMPTY_BODY_RE.is_match(line) && !line.contains("fixme") {
            issues.push(ValidationIssue::new(
                "empty test or suite body",
                Some(index + 1),
            ));
        }
    }
}

static EMPTY_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:from\s*|import\s*\(?\s*|require\(\s*)['"]['"]"#).expect("empty import regex")
});

fn check_import_sources(code: &str, issues: &mut Vec<ValidationIssue>) {
    for (index, line) in code.lines().enumerate() {
        if EMPTY_IMPORT_RE.is_match(&strip_line(line)) {
            issues.push(ValidationIssue::new("empty import source", Some(index + 1)));
        }
    }
}

/// Blank out string contents and drop `//`/`#` comments so checks see
/// only code.
fn strip_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                    out.push(' ');
                } else if c == '\\' {
                    escaped = true;
                    out.push(' ');
                } else if c == q {
                    quote = None;
                    out.push(c);
                } else {
                    out.push(' ');
                }
            }
            None => match c {
                '\'' | '"' | '`' => {
                    quote = Some(c);
                    out.push(c);
                }
                '/' if chars.peek() == Some(&'/') => break,
                '#' => break,
                _ => out.push(c),
            },
        }
    }
    out
}
