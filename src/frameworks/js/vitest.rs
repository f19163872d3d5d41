//! Vitest plugin.
//!
//! Same BDD surface as Jest with the `vi.*` mock namespace. As an
//! emission target it carries Jest sources onto `vitest`, adding the
//! explicit helper import Vitest expects.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::{ContextEntry, LineClassifier, MockPatterns, parse_bdd, parse_expect_line};
use crate::error::ParseFailure;
use crate::frameworks::annotate_unconvertible;
use crate::ir::{CaseItem, TestFile};
use crate::markers::CommentStyle;
use crate::registry::{FrameworkPlugin, ImportTable, Paradigm};

static VI_CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bvi\.\w+").expect("vi call regex"));
static JEST_CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bjest\.(\w+)").expect("jest call regex"));

pub struct VitestPlugin {
    imports: ImportTable,
    mocks: MockPatterns,
}

impl VitestPlugin {
    pub fn new() -> Self {
        Self {
            imports: ImportTable {
                modules: vec!["vitest"],
                replacements: BTreeMap::from([
                    ("@jest/globals", "vitest"),
                    ("jest-mock", "vitest"),
                ]),
            },
            mocks: MockPatterns::for_namespace("vi"),
        }
    }
}

impl Default for VitestPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl LineClassifier for VitestPlugin {
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

impl FrameworkPlugin for VitestPlugin {
    fn name(&self) -> &str {
        "vitest"
    }

    fn language(&self) -> &str {
        "javascript"
    }

    fn paradigm(&self) -> Paradigm {
        Paradigm::Bdd
    }

    fn detect(&self, src: &str) -> u8 {
        let mut score = 0u32;
        if src.contains("from 'vitest'") || src.contains("from \"vitest\"") {
            score += 50;
        }
        if VI_CALL_RE.is_match(src) {
            score += 30;
        }
        if src.contains("describe(") {
            score += 10;
        }
        if src.contains("expect(") {
            score += 10;
        }
        score.min(100) as u8
    }

    fn parse(&self, src: &str) -> Result<TestFile, ParseFailure> {
        parse_bdd(src, "javascript", self)
    }

    /// Regex baseline for Vitest as a *target* (Jest sources).
    fn emit(&self, ir: &TestFile, src: &str) -> String {
        let mut lines: Vec<String> = Vec::new();
        let mut has_vitest_import = false;
        for line in src.lines() {
            let mut out = line.to_string();
            if out.contains("from '@jest/globals'") || out.contains("from \"@jest/globals\"") {
                out = out
                    .replace("from '@jest/globals'", "from 'vitest'")
                    .replace("from \"@jest/globals\"", "from \"vitest\"")
                    .replace(" jest,", " vi,")
                    .replace(", jest ", ", vi ")
                    .replace("{ jest }", "{ vi }");
            }
            out = JEST_CALL_RE.replace_all(&out, "vi.$1").to_string();
            if out.contains("from 'vitest'") || out.contains("from \"vitest\"") {
                has_vitest_import = true;
            }
            lines.push(out);
        }

        if !has_vitest_import {
            let body = lines.join("\n");
            let helpers = needed_helpers(&body);
            if !helpers.is_empty() {
                lines.insert(
                    0,
                    format!("import {{ {} }} from 'vitest';", helpers.join(", ")),
                );
            }
        }

        let mut output = lines.join("\n");
        output.push('\n');
        annotate_unconvertible(
            output,
            ir,
            CommentStyle::Slashes,
            "port this construct to vitest manually",
        )
    }

    fn imports(&self) -> &ImportTable {
        &self.imports
    }
}

/// Helpers the emitted module references; Vitest has no injected globals.
fn needed_helpers(body: &str) -> Vec<&'static str> {
    let mut helpers = Vec::new();
    if body.contains("describe(") || body.contains("describe.") {
        helpers.push("describe");
    }
    if body.contains("it(") || body.contains("it.") {
        helpers.push("it");
    }
    if body.contains("test(") || body.contains("test.") {
        helpers.push("test");
    }
    if body.contains("expect(") {
        helpers.push("expect");
    }
    if body.contains("vi.") {
        helpers.push("vi");
    }
    for hook in ["beforeEach", "afterEach", "beforeAll", "afterAll"] {
        if body.contains(&format!("{hook}(")) {
            helpers.push(match hook {
                "beforeEach" => "beforeEach",
                "afterEach" => "afterEach",
                "beforeAll" => "beforeAll",
                _ => "afterAll",
            });
        }
    }
    helpers
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ir::{FileItem, MockKind, SuiteItem};

    #[test]
    fn detect_prefers_explicit_vitest_imports() {
        let plugin = VitestPlugin::new();
        let src = "import { describe, it, expect, vi } from 'vitest';\nvi.mock('./api');\n";
        assert!(plugin.detect(src) >= 80);
        assert_eq!(plugin.detect("plain text"), 0);
    }

    #[test]
    fn parse_reads_the_vi_namespace() {
        let plugin = VitestPlugin::new();
        let src = "\
describe('s', () => {
  it('t', () => {
    vi.useFakeTimers();
    expect(now()).toBe(0);
  });
});
";
        let file = plugin.parse(src).unwrap();
        let FileItem::TestSuite(suite) = &file.body[0] else {
            panic!("expected suite");
        };
        let SuiteItem::TestCase(case) = &suite.items[0] else {
            panic!("expected case");
        };
        let CaseItem::MockCall(mock) = &case.body[0] else {
            panic!("expected mock");
        };
        assert_eq!(mock.mock_kind, MockKind::FakeTimers);
    }

    #[test]
    fn emit_adds_a_vitest_import_when_jest_used_globals() {
        let plugin = VitestPlugin::new();
        let src = "\
describe('s', () => {
  it('t', () => {
    jest.useFakeTimers();
    expect(1).toBe(1);
  });
});
";
        let output = plugin.emit(&TestFile::new("javascript"), src);
        assert!(output.starts_with("import { describe, it, expect, vi } from 'vitest';"));
        assert!(output.contains("vi.useFakeTimers();"));
        assert!(!output.contains("jest."));
    }

    #[test]
    fn emit_rewrites_jest_globals_import_in_place() {
        let plugin = VitestPlugin::new();
        let src = "import { describe, it, expect, jest } from '@jest/globals';\n";
        let output = plugin.emit(&TestFile::new("javascript"), src);
        assert_eq!(
            output,
            "import { describe, it, expect, vi } from 'vitest';\n"
        );
    }
}
