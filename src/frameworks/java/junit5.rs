//! JUnit 5 plugin.
//!
//! The primary JUnit 4 target. Annotation and import upgrades are plain
//! replacements; `@Test(expected = ...)` and `@RunWith` have no direct
//! equivalent and surface as TODO markers.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::{JUNIT5_NAMES, parse_junit, replace_pairs};
use crate::error::ParseFailure;
use crate::frameworks::annotate_unconvertible;
use crate::ir::TestFile;
use crate::markers::{CommentStyle, todo_marker};
use crate::registry::{FrameworkPlugin, ImportTable, Paradigm};

/// Full import statements, most specific first.
const IMPORT_PAIRS: &[(&str, &str)] = &[
    (
        "import org.junit.BeforeClass;",
        "import org.junit.jupiter.api.BeforeAll;",
    ),
    (
        "import org.junit.AfterClass;",
        "import org.junit.jupiter.api.AfterAll;",
    ),
    (
        "import org.junit.Before;",
        "import org.junit.jupiter.api.BeforeEach;",
    ),
    (
        "import org.junit.After;",
        "import org.junit.jupiter.api.AfterEach;",
    ),
    (
        "import org.junit.Ignore;",
        "import org.junit.jupiter.api.Disabled;",
    ),
    (
        "import org.junit.Test;",
        "import org.junit.jupiter.api.Test;",
    ),
    (
        "import static org.junit.Assert.",
        "import static org.junit.jupiter.api.Assertions.",
    ),
    (
        "import org.junit.Assert;",
        "import org.junit.jupiter.api.Assertions;",
    ),
];

static ANNOTATION_RES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"@BeforeClass\b").expect("regex"), "@BeforeAll"),
        (Regex::new(r"@AfterClass\b").expect("regex"), "@AfterAll"),
        (Regex::new(r"@Before\b").expect("regex"), "@BeforeEach"),
        (Regex::new(r"@After\b").expect("regex"), "@AfterEach"),
        (Regex::new(r"@Ignore\b").expect("regex"), "@Disabled"),
        (Regex::new(r"\bAssert\.").expect("regex"), "Assertions."),
    ]
});

static TEST_EXPECTED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@Test\s*\(\s*(?:expected|timeout)\s*=").expect("expected regex")
});
static RUN_WITH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@RunWith\(").expect("runwith regex"));

pub struct Junit5Plugin {
    imports: ImportTable,
}

impl Junit5Plugin {
    pub fn new() -> Self {
        Self {
            imports: ImportTable {
                modules: vec!["org.junit.jupiter"],
                replacements: BTreeMap::from([("org.junit", "org.junit.jupiter.api")]),
            },
        }
    }
}

impl Default for Junit5Plugin {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameworkPlugin for Junit5Plugin {
    fn name(&self) -> &str {
        "junit5"
    }

    fn language(&self) -> &str {
        "java"
    }

    fn paradigm(&self) -> Paradigm {
        Paradigm::Xunit
    }

    fn detect(&self, src: &str) -> u8 {
        let mut score = 0u32;
        if src.contains("org.junit.jupiter") {
            score += 60;
        }
        if src.contains("@Test") {
            score += 20;
        }
        if src.contains("@BeforeEach") || src.contains("@AfterEach") {
            score += 10;
        }
        if src.contains("Assertions.") {
            score += 10;
        }
        score.min(100) as u8
    }

    fn parse(&self, src: &str) -> Result<TestFile, ParseFailure> {
        parse_junit(src, &JUNIT5_NAMES)
    }

    /// Regex baseline for JUnit 5 as a *target* (JUnit 4 sources).
    fn emit(&self, ir: &TestFile, src: &str) -> String {
        let mut lines: Vec<String> = Vec::new();
        let mut todo_id = 0usize;
        for line in src.lines() {
            let indent_len = line.len() - line.trim_start().len();
            let indent = &line[..indent_len];
            let trimmed = line.trim();

            if TEST_EXPECTED_RE.is_match(trimmed) {
                todo_id += 1;
                let marker = todo_marker(
                    CommentStyle::Slashes,
                    todo_id,
                    "@Test parameters moved to assertions in junit5",
                    trimmed,
                    "wrap the body in assertThrows or assertTimeout",
                );
                for marker_line in marker.lines() {
                    lines.push(format!("{indent}{marker_line}"));
                }
                lines.push(format!("{indent}@Test"));
                continue;
            }
            if RUN_WITH_RE.is_match(trimmed) {
                todo_id += 1;
                let marker = todo_marker(
                    CommentStyle::Slashes,
                    todo_id,
                    "@RunWith is replaced by @ExtendWith in junit5",
                    trimmed,
                    "pick the matching jupiter extension",
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
            "port this construct to junit5 manually",
        )
    }

    fn imports(&self) -> &ImportTable {
        &self.imports
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn detect_keys_on_jupiter() {
        let plugin = Junit5Plugin::new();
        let src = "import org.junit.jupiter.api.Test;\n@Test\nAssertions.assertTrue(true);\n";
        assert!(plugin.detect(src) >= 80);
        assert_eq!(plugin.detect("import org.junit.Test;"), 0);
    }

    #[test]
    fn emit_upgrades_annotations_and_imports() {
        let plugin = Junit5Plugin::new();
        let src = "\
import org.junit.Before;
import org.junit.BeforeClass;
import org.junit.Test;
import static org.junit.Assert.assertEquals;

public class CalcTest {
    @BeforeClass
    public static void init() {
    }

    @Before
    public void setUp() {
    }

    @Test
    public void adds() {
        Assert.assertEquals(3, calc.add(1, 2));
    }
}
";
        let output = plugin.emit(&TestFile::new("java"), src);
        assert!(output.contains("import org.junit.jupiter.api.BeforeEach;"));
        assert!(output.contains("import org.junit.jupiter.api.BeforeAll;"));
        assert!(output.contains("import org.junit.jupiter.api.Test;"));
        assert!(output.contains("import static org.junit.jupiter.api.Assertions.assertEquals;"));
        assert!(output.contains("@BeforeAll\n"));
        assert!(output.contains("@BeforeEach\n"));
        assert!(output.contains("Assertions.assertEquals(3, calc.add(1, 2));"));
        assert!(!output.contains("@BeforeEachAll"));
        assert!(!output.contains("org.junit.Before;"));
    }

    #[test]
    fn emit_flags_expected_exceptions() {
        let plugin = Junit5Plugin::new();
        let src = "\
@Test(expected = ArithmeticException.class)
public void divides() {
    calc.divide(1, 0);
}
";
        let output = plugin.emit(&TestFile::new("java"), src);
        assert!(output.contains("// HAMLET-TODO [1]: @Test parameters moved to assertions in junit5"));
        assert!(output.contains("@Test\n"));
        assert!(output.contains("// Original: @Test(expected = ArithmeticException.class)"));
    }
}
