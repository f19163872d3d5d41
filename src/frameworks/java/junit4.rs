//! JUnit 4 plugin.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::{JUNIT4_NAMES, parse_junit, replace_pairs};
use crate::error::ParseFailure;
use crate::frameworks::annotate_unconvertible;
use crate::ir::TestFile;
use crate::markers::{CommentStyle, todo_marker};
use crate::registry::{FrameworkPlugin, ImportTable, Paradigm};

/// Full import statements, most specific first.
const IMPORT_PAIRS: &[(&str, &str)] = &[
    (
        "import org.junit.jupiter.api.BeforeAll;",
        "import org.junit.BeforeClass;",
    ),
    (
        "import org.junit.jupiter.api.AfterAll;",
        "import org.junit.AfterClass;",
    ),
    (
        "import org.junit.jupiter.api.BeforeEach;",
        "import org.junit.Before;",
    ),
    (
        "import org.junit.jupiter.api.AfterEach;",
        "import org.junit.After;",
    ),
    (
        "import org.junit.jupiter.api.Disabled;",
        "import org.junit.Ignore;",
    ),
    (
        "import org.junit.jupiter.api.Test;",
        "import org.junit.Test;",
    ),
    (
        "import static org.junit.jupiter.api.Assertions.",
        "import static org.junit.Assert.",
    ),
    (
        "import org.junit.jupiter.api.Assertions;",
        "import org.junit.Assert;",
    ),
];

static ANNOTATION_RES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"@BeforeAll\b").expect("regex"), "@BeforeClass"),
        (Regex::new(r"@AfterAll\b").expect("regex"), "@AfterClass"),
        (Regex::new(r"@BeforeEach\b").expect("regex"), "@Before"),
        (Regex::new(r"@AfterEach\b").expect("regex"), "@After"),
        (Regex::new(r"@Disabled\b").expect("regex"), "@Ignore"),
        (Regex::new(r"\bAssertions\.").expect("regex"), "Assert."),
    ]
});

pub struct Junit4Plugin {
    imports: ImportTable,
}

impl Junit4Plugin {
    pub fn new() -> Self {
        Self {
            imports: ImportTable {
                modules: vec!["org.junit", "junit"],
                replacements: BTreeMap::from([("org.junit.jupiter.api", "org.junit")]),
            },
        }
    }
}

impl Default for Junit4Plugin {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameworkPlugin for Junit4Plugin {
    fn name(&self) -> &str {
        "junit4"
    }

    fn language(&self) -> &str {
        "java"
    }

    fn paradigm(&self) -> Paradigm {
        Paradigm::Xunit
    }

    fn detect(&self, src: &str) -> u8 {
        if src.contains("org.junit.jupiter") {
            return 0;
        }
        let mut score = 0u32;
        if src.contains("import org.junit.Test") {
            score += 40;
        }
        if src.contains("org.junit.Assert") {
            score += 20;
        }
        if src.contains("@Test") {
            score += 20;
        }
        if src.contains("@Before") || src.contains("@After") {
            score += 10;
        }
        if src.contains("public class") {
            score += 10;
        }
        score.min(100) as u8
    }

    fn parse(&self, src: &str) -> Result<TestFile, ParseFailure> {
        parse_junit(src, &JUNIT4_NAMES)
    }

    /// Regex baseline for JUnit 4 as a *target* (JUnit 5 sources).
    fn emit(&self, ir: &TestFile, src: &str) -> String {
        let mut lines: Vec<String> = Vec::new();
        let mut todo_id = 0usize;
        for line in src.lines() {
            let indent_len = line.len() - line.trim_start().len();
            let indent = &line[..indent_len];
            let trimmed = line.trim();

            // JUnit 4 has no assertThrows; the call needs a manual port.
            if trimmed.contains("assertThrows") && !trimmed.starts_with("//") {
                todo_id += 1;
                let marker = todo_marker(
                    CommentStyle::Slashes,
                    todo_id,
                    "assertThrows is not available in junit4",
                    trimmed,
                    "use @Test(expected = ...) or try/fail/catch",
                );
                for marker_line in marker.lines() {
                    lines.push(format!("{indent}{marker_line}"));
                }
                continue;
            }

            let mut out = replace_pairs(line, IMPORT_PAIRS);
            for (re, replacement) in ANNOTATION_RES.iter() {
                out = re.replace_all(&out, *replacement).to_string();
            }
            lines.push(out);
        }
        let mut output = lines.join("\n");
        output.push('\n');
        annotate_unconvertible(
            output,
            ir,
            CommentStyle::Slashes,
            "port this construct to junit4 manually",
        )
    }

    fn imports(&self) -> &ImportTable {
        &self.imports
    }
}
