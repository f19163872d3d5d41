//! Import-specifier extraction for the JavaScript family.
//!
//! Recognizes the five specifier-bearing forms: `import ... from`,
//! bare side-effect `import`, `require(...)` assignments (destructured
//! included), dynamic `import(...)`, and re-exports (`export ... from`,
//! `export * from`). Comments are stripped (line and block, tracked
//! across lines) before matching so commented-out imports never count.

use std::sync::LazyLock;

use regex::Regex;

static FROM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(?:import|export)\b[^'"]*?\bfrom\s*['"](?<spec>[^'"]+)['"]"#)
        .expect("from regex")
});
static SIDE_EFFECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*import\s*['"](?<spec>[^'"]+)['"]"#).expect("side-effect regex")
});
static REQUIRE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\brequire\(\s*['"](?<spec>[^'"]+)['"]\s*\)"#).expect("require regex")
});
static DYNAMIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bimport\(\s*['"](?<spec>[^'"]+)['"]\s*\)"#).expect("dynamic regex")
});

/// One specifier occurrence, with its 1-based line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImport {
    pub specifier: String,
    pub line: usize,
}

impl ExtractedImport {
    pub fn is_relative(&self) -> bool {
        self.specifier.starts_with("./") || self.specifier.starts_with("../")
    }
}

/// Extract every import specifier from a JS-family source.
pub fn extract_import_specifiers(src: &str) -> Vec<ExtractedImport> {
    let mut found = Vec::new();
    let mut in_block_comment = false;

    for (index, line) in src.lines().enumerate() {
        let line_no = index + 1;
        let cleaned = strip_comments(line, &mut in_block_comment);
        if cleaned.trim().is_empty() {
            continue;
        }

        if let Some(caps) = FROM_RE.captures(&cleaned) {
            found.push(ExtractedImport {
                specifier: caps["spec"].to_string(),
                line: line_no,
            });
            continue;
        }
        if let Some(caps) = SIDE_EFFECT_RE.captures(&cleaned) {
            found.push(ExtractedImport {
                specifier: caps["spec"].to_string(),
                line: line_no,
            });
            continue;
        }
        for caps in REQUIRE_RE.captures_iter(&cleaned) {
            found.push(ExtractedImport {
                specifier: caps["spec"].to_string(),
                line: line_no,
            });
        }
        for caps in DYNAMIC_RE.captures_iter(&cleaned) {
            found.push(ExtractedImport {
                specifier: caps["spec"].to_string(),
                line: line_no,
            });
        }
    }
    found
}

/// Remove `//` and `/* */` comments from one line, carrying block-comment
/// state across lines. String literals are respected so a `//` inside a
/// string does not truncate the line.
fn strip_comments(line: &str, in_block_comment: &mut bool) -> String {
    let mut out = String::with_capacity(line.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if *in_block_comment {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                *in_block_comment = false;
            }
            continue;
        }
        match quote {
            Some(q) => {
                out.push(c);
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' | '`' => {
                    quote = Some(c);
                    out.push(c);
                }
                '/' if chars.peek() == Some(&'/') => break,
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    *in_block_comment = true;
                }
                _ => out.push(c),
            },
        }
    }
    out
}
