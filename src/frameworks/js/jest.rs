//! Jest plugin.
//!
//! Parses the `describe`/`it` + `expect` surface plus the `jest.*` mock
//! namespace. As an emission target it renders Vitest-flavored sources
//! back onto `@jest/globals`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::{ContextEntry, LineClassifier, MockPatterns, parse_bdd, parse_expect_line};
use crate::error::ParseFailure;
use crate::frameworks::annotate_unconvertible;
use crate::ir::{CaseItem, RawCode, TestFile};
use crate::markers::CommentStyle;
use crate::registry::{FrameworkPlugin, ImportTable, Paradigm};

static JEST_CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bjest\.\w+").expect("jest call regex"));
static VI_CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bvi\.(\w+)").expect("vi call regex"));

pub struct JestPlugin {
    imports: ImportTable,
    mocks: MockPatterns,
}

impl JestPlugin {
    pub fn new() -> Self {
        Self {
            imports: ImportTable {
                modules: vec!["jest", "@jest/globals", "jest-mock", "@types/jest"],
                replacements: BTreeMap::from([("vitest", "@jest/globals")]),
            },
            mocks: MockPatterns::for_namespace("jest"),
        }
    }
}

impl Default for JestPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl LineClassifier for JestPlugin {
    fn case_line(&self, trimmed: &str, line_no: usize) -> Option<CaseItem> {
        if let Some(assertion) = parse_expect_line(trimmed, line_no) {
            return Some(CaseItem::Assertion(assertion));
        }
        if let Some(mock) = self.mocks.parse(trimmed, line_no) {
            return Some(CaseItem::MockCall(mock));
        }
        None
    }

    fn context_line(&self, trimmed: &str, line_no: usize) -> Option<ContextEntry> {
        self.mocks.parse(trimmed, line_no).map(ContextEntry::Mock)
    }
}

impl FrameworkPlugin for JestPlugin {
    fn name(&self) -> &str {
        "jest"
    }

    fn language(&self) -> &str {
        "javascript"
    }

    fn paradigm(&self) -> Paradigm {
        Paradigm::Bdd
    }

    fn detect(&self, src: &str) -> u8 {
        let mut score = 0u32;
        if src.contains("@jest/globals") || src.contains("from 'jest'") {
            score += 40;
        }
        if JEST_CALL_RE.is_match(src) {
            score += 30;
        }
        if src.contains("describe(") || src.contains("describe.only(") {
            score += 10;
        }
        if src.contains("it(") || src.contains("test(") {
            score += 10;
        }
        if src.contains("expect(") {
            score += 10;
        }
        // Files on the cypress or playwright surface are not jest files.
        if src.contains("cy.") || src.contains("@playwright/test") {
            score = score.saturating_sub(40);
        }
        score.min(100) as u8
    }

    fn parse(&self, src: &str) -> Result<TestFile, ParseFailure> {
        parse_bdd(src, "javascript", self)
    }

    /// Regex baseline for Jest as a *target* (Vitest sources).
    fn emit(&self, ir: &TestFile, src: &str) -> String {
        let mut lines: Vec<String> = Vec::new();
        for line in src.lines() {
            let mut out = line.to_string();
            if out.contains("from 'vitest'") || out.contains("from \"vitest\"") {
                out = out
                    .replace("from 'vitest'", "from '@jest/globals'")
                    .replace("from \"vitest\"", "from \"@jest/globals\"");
                out = out.replace(" vi,", " jest,").replace(" vi ", " jest ").replace(", vi ", ", jest ");
                if out.contains("{ vi }") {
                    out = out.replace("{ vi }", "{ jest }");
                }
            }
            out = VI_CALL_RE.replace_all(&out, "jest.$1").to_string();
            lines.push(out);
        }
        let mut output = lines.join("\n");
        output.push('\n');
        annotate_unconvertible(
            output,
            ir,
            CommentStyle::Slashes,
            "port this construct to jest manually",
        )
    }

    fn imports(&self) -> &ImportTable {
        &self.imports
    }
}
