//! Unittest plugin.
//!
//! Xunit-paradigm source: `unittest.TestCase` subclasses with
//! `self.assert*` methods and setUp/tearDown fixtures. As a target it is
//! the destination of the function→xunit transform: pytest trees arrive
//! wrapped in a synthesized suite and leave as TestCase subclasses with
//! a `unittest.main()` tail.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::pytest::hook_type_for;
use super::{PyWriter, indent_of, parse_python_import, split_args};
use crate::error::ParseFailure;
use crate::ir::{
    Assertion, AssertionKind, CaseItem, Comment, FileItem, Hook, HookType, Modifier,
    ModifierType, NodeMeta, RawCode, SuiteItem, TestCase, TestFile, TestSuite,
};
use crate::registry::{FrameworkPlugin, ImportTable, Paradigm};

static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^class\s+(?<name>\w+)\(\s*(?:unittest\.)?TestCase\s*\)\s*:\s*$")
        .expect("class regex")
});
static DEF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^def\s+(?<name>\w+)\s*\((?:self|cls)[^)]*\)\s*:\s*$").expect("def regex")
});
static SELF_ASSERT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^self\.(?<method>assert\w+|fail\w*)\((?<args>.*)\)\s*$").expect("assert regex")
});
static RAISES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^with\s+self\.assertRaises\(\s*(?<exc>[^)]+?)\s*\)\s*(?:as\s+\w+\s*)?:\s*$")
        .expect("raises regex")
});

pub struct UnittestPlugin {
    imports: ImportTable,
}

impl UnittestPlugin {
    pub fn new() -> Self {
        Self {
            imports: ImportTable {
                modules: vec!["unittest"],
                replacements: BTreeMap::from([("pytest", "unittest")]),
            },
        }
    }
}

impl Default for UnittestPlugin {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a `self.assert*` call onto the vocabulary.
fn assert_method_to_assertion(method: &str, args: &str) -> Assertion {
    let parts = split_args(args);
    let first = parts.first().cloned().unwrap_or_default();
    let second = parts.get(1).cloned();

    let two_arg = |kind: AssertionKind, negated: bool| {
        let mut a = Assertion::new(kind, first.clone());
        if let Some(second) = second.clone() {
            a = a.with_expected(second);
        }
        if negated {
            a = a.negated();
        }
        a
    };

    match method {
        "assertEqual" | "assertEquals" | "assertListEqual" | "assertDictEqual" => {
            two_arg(AssertionKind::Equal, false)
        }
        "assertNotEqual" => two_arg(AssertionKind::Equal, true),
        "assertIs" => two_arg(AssertionKind::StrictEqual, false),
        "assertIsNot" => two_arg(AssertionKind::StrictEqual, true),
        "assertTrue" => Assertion::new(AssertionKind::Truthy, first),
        "assertFalse" => Assertion::new(AssertionKind::Falsy, first),
        "assertIsNone" => Assertion::new(AssertionKind::IsNull, first),
        "assertIsNotNone" => Assertion::new(AssertionKind::IsNull, first).negated(),
        // assertIn(member, container): the container is the subject.
        "assertIn" => match second {
            Some(container) => {
                Assertion::new(AssertionKind::Contains, container).with_expected(first)
            }
            None => Assertion::new(AssertionKind::Other("assertIn".to_string()), first),
        },
        "assertNotIn" => match second {
            Some(container) => Assertion::new(AssertionKind::Contains, container)
                .with_expected(first)
                .negated(),
            None => Assertion::new(AssertionKind::Other("assertNotIn".to_string()), first),
        },
        "assertRegex" => two_arg(AssertionKind::Match, false),
        "assertRaises" => Assertion::new(AssertionKind::Throws, first),
        other => Assertion::new(AssertionKind::Other(other.to_string()), args),
    }
}

impl FrameworkPlugin for UnittestPlugin {
    fn name(&self) -> &str {
        "unittest"
    }

    fn language(&self) -> &str {
        "python"
    }

    fn paradigm(&self) -> Paradigm {
        Paradigm::Xunit
    }

    fn detect(&self, src: &str) -> u8 {
        let mut score = 0u32;
        if src.contains("import unittest") {
            score += 40;
        }
        if src.contains("unittest.TestCase") || src.contains("(TestCase)") {
            score += 30;
        }
        if src.contains("self.assert") {
            score += 20;
        }
        if src.contains("def test_") {
            score += 10;
        }
        score.min(100) as u8
    }

    fn parse(&self, src: &str) -> Result<TestFile, ParseFailure> {
        let mut file = TestFile::new("python");
        let mut suite: Option<(TestSuite, usize)> = None;
        let mut case: Option<(TestCase, usize)> = None;
        let mut hook: Option<(Hook, usize)> = None;
        let mut skip_next = false;

        fn flush_member(
            suite: &mut Option<(TestSuite, usize)>,
            case: &mut Option<(TestCase, usize)>,
            hook: &mut Option<(Hook, usize)>,
            file: &mut TestFile,
        ) {
            if let Some((done, _)) = case.take() {
                match suite {
                    Some((s, _)) => s.items.push(SuiteItem::TestCase(done)),
                    None => file.body.push(FileItem::TestCase(done)),
                }
            }
            if let Some((done, _)) = hook.take()
                && let Some((s, _)) = suite
            {
                s.hooks.push(done);
            }
        }

        for (index, line) in src.lines().enumerate() {
            let line_no = index + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let indent = indent_of(line);

            let member_indent = case
                .as_ref()
                .map(|(_, d)| *d)
                .or_else(|| hook.as_ref().map(|(_, d)| *d));
            if member_indent.is_some_and(|d| indent <= d) {
                flush_member(&mut suite, &mut case, &mut hook, &mut file);
            }
            let class_indent = suite.as_ref().map(|(_, d)| *d);
            if case.is_none()
                && hook.is_none()
                && class_indent.is_some_and(|d| indent <= d)
            {
                let (done, _) = suite.take().expect("suite present");
                file.body.push(FileItem::TestSuite(done));
            }

            if let Some(comment) = trimmed.strip_prefix('#') {
                let mut node = Comment::new(comment.trim());
                node.meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
                if let Some((c, _)) = case.as_mut() {
                    c.body.push(CaseItem::Comment(node));
                } else if let Some((h, _)) = hook.as_mut() {
                    h.body.push(CaseItem::Comment(node));
                } else if let Some((s, _)) = suite.as_mut() {
                    s.items.push(SuiteItem::Comment(node));
                } else {
                    file.body.push(FileItem::Comment(node));
                }
                continue;
            }

            if case.is_none() && hook.is_none() {
                if suite.is_none()
                    && indent == 0
                    && let Some(import) = parse_python_import(trimmed, line_no)
                {
                    file.imports.push(import);
                    continue;
                }

                if trimmed.starts_with("@unittest.skip") {
                    skip_next = true;
                    continue;
                }
                if trimmed == "@classmethod" {
                    continue;
                }

                if let Some(caps) = CLASS_RE.captures(trimmed) {
                    let mut new_suite = TestSuite::new(&caps["name"]);
                    new_suite.meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
                    if skip_next {
                        new_suite.push_modifier(Modifier::new(ModifierType::Skip));
                        skip_next = false;
                    }
                    suite = Some((new_suite, indent));
                    continue;
                }

                if let Some(caps) = DEF_RE.captures(trimmed) {
                    let name = &caps["name"];
                    if let Some(hook_type) = hook_type_for(name) {
                        let mut new_hook = Hook::new(hook_type);
                        new_hook.meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
                        hook = Some((new_hook, indent));
                        skip_next = false;
                        continue;
                    }
                    if name.starts_with("test") {
                        let mut new_case = TestCase::new(name);
                        new_case.meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
                        if skip_next {
                            new_case.push_modifier(Modifier::new(ModifierType::Skip));
                            skip_next = false;
                        }
                        case = Some((new_case, indent));
                        continue;
                    }
                }

                let mut raw = RawCode::passthrough(line);
                raw.meta.location = Some(crate::ir::SourceLocation::line(line_no));
                if let Some((s, _)) = suite.as_mut() {
                    s.items.push(SuiteItem::RawCode(raw));
                } else {
                    file.body.push(FileItem::RawCode(raw));
                }
                continue;
            }

            // Inside a test method or fixture body.
            let body_base = case
                .as_ref()
                .map(|(_, d)| d + 4)
                .or_else(|| hook.as_ref().map(|(_, d)| d + 4))
                .expect("open member");

            let item = if let Some(caps) = RAISES_RE.captures(trimmed) {
                let mut assertion = Assertion::new(AssertionKind::Throws, &caps["exc"]);
                assertion.meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
                CaseItem::Assertion(assertion)
            } else if let Some(caps) = SELF_ASSERT_RE.captures(trimmed) {
                let mut assertion = assert_method_to_assertion(&caps["method"], &caps["args"]);
                let confidence = assertion.meta.confidence;
                assertion.meta = NodeMeta::new()
                    .with_line(line_no)
                    .with_source(trimmed)
                    .with_confidence(confidence);
                CaseItem::Assertion(assertion)
            } else {
                let available = indent_of(line).min(body_base);
                let mut raw = RawCode::passthrough(&line[available..]);
                raw.meta.location = Some(crate::ir::SourceLocation::line(line_no));
                raw.meta.original_source = trimmed.to_string();
                CaseItem::RawCode(raw)
            };

            if let Some((c, _)) = case.as_mut() {
                c.body.push(item);
            } else if let Some((h, _)) = hook.as_mut() {
                h.body.push(item);
            }
        }

        flush_member(&mut suite, &mut case, &mut hook, &mut file);
        if let Some((done, _)) = suite.take() {
            file.body.push(FileItem::TestSuite(done));
        }
        Ok(file)
    }

    /// Unittest as a *target*: render the (transform-wrapped) tree as
    /// TestCase subclasses.
    fn emit(&self, ir: &TestFile, _src: &str) -> String {
        let mut writer = PyWriter::new();
        writer.push("import unittest");
        for import in &ir.imports {
            if import.source == "pytest" || import.source == "unittest" {
                continue;
            }
            if !import.meta.original_source.is_empty() {
                writer.push(&import.meta.original_source);
            }
        }
        writer.blank();

        for item in &ir.body {
            match item {
                FileItem::TestSuite(suite) => emit_suite(&mut writer, suite),
                FileItem::TestCase(case) => {
                    // Should have been wrapped by the paradigm transform;
                    // keep the test runnable anyway.
                    emit_case(&mut writer, case, false);
                }
                FileItem::SharedVariable(shared) => {
                    writer.push(&format!("{} = {}", shared.name, shared.initializer));
                }
                FileItem::MockCall(mock) => writer.todo(
                    &format!("mock call '{}' has no unittest equivalent", mock.mock_kind),
                    &mock.meta.original_source,
                    "use unittest.mock",
                ),
                FileItem::RawCode(raw) => emit_raw(&mut writer, raw),
                FileItem::Comment(comment) => writer.push(&format!("# {}", comment.text)),
            }
        }

        writer.blank();
        writer.push("if __name__ == '__main__':");
        writer.push("    unittest.main()");
        writer.finish()
    }

    fn imports(&self) -> &ImportTable {
        &self.imports
    }
}

fn emit_raw(writer: &mut PyWriter, raw: &RawCode) {
    if raw.code.contains("unittest.main()") || raw.code.starts_with("if __name__") {
        return;
    }
    // Fixture decorators make no sense on TestCase methods.
    if raw.code.trim_start().starts_with("@pytest.") {
        return;
    }
    writer.push_block(&raw.code);
}

fn emit_suite(writer: &mut PyWriter, suite: &TestSuite) {
    writer.blank();
    if suite
        .modifiers
        .iter()
        .any(|m| m.modifier_type == ModifierType::Skip)
    {
        writer.push("@unittest.skip('skipped during migration')");
    }
    writer.push(&format!("class {}(unittest.TestCase):", suite.name));
    writer.depth += 1;
    let mut empty = true;
    for hook in &suite.hooks {
        empty = false;
        emit_hook(writer, hook);
    }
    for item in &suite.items {
        empty = false;
        match item {
            SuiteItem::TestSuite(nested) => {
                // unittest has no nested classes worth generating.
                writer.todo(
                    &format!("nested suite '{}' cannot be expressed", nested.name),
                    &nested.meta.original_source,
                    "flatten into its own TestCase class",
                );
            }
            SuiteItem::TestCase(case) => emit_case(writer, case, true),
            SuiteItem::SharedVariable(shared) => {
                writer.push(&format!("{} = {}", shared.name, shared.initializer));
            }
            SuiteItem::MockCall(mock) => writer.todo(
                &format!("mock call '{}' has no unittest equivalent", mock.mock_kind),
                &mock.meta.original_source,
                "use unittest.mock",
            ),
            SuiteItem::RawCode(raw) => emit_raw(writer, raw),
            SuiteItem::Comment(comment) => writer.push(&format!("# {}", comment.text)),
        }
    }
    if empty {
        writer.push("pass");
    }
    writer.depth -= 1;
}

fn emit_hook(writer: &mut PyWriter, hook: &Hook) {
    let (decorator, signature) = match hook.hook_type {
        HookType::BeforeEach => (None, "def setUp(self):"),
        HookType::AfterEach => (None, "def tearDown(self):"),
        HookType::BeforeAll => (Some("@classmethod"), "def setUpClass(cls):"),
        HookType::AfterAll => (Some("@classmethod"), "def tearDownClass(cls):"),
    };
    if let Some(decorator) = decorator {
        writer.push(decorator);
    }
    writer.push(signature);
    writer.depth += 1;
    emit_body(writer, &hook.body);
    writer.depth -= 1;
    writer.blank();
}

fn emit_case(writer: &mut PyWriter, case: &TestCase, in_class: bool) {
    for modifier in &case.modifiers {
        match modifier.modifier_type {
            ModifierType::Skip => writer.push("@unittest.skip('skipped during migration')"),
            ModifierType::Todo => writer.push("@unittest.skip('todo')"),
            ModifierType::Only => writer.todo(
                "focused tests have no unittest equivalent",
                &modifier.meta.original_source,
                "run the single test from the command line",
            ),
        }
    }
    if let Some(parameters) = &case.parameters {
        writer.todo(
            &format!("{} parameter rows need subTest conversion", parameters.rows.len()),
            &parameters.meta.original_source,
            "wrap the body in self.subTest per row",
        );
    }
    let name = if case.name.starts_with("test") {
        case.name.clone()
    } else {
        format!("test_{}", case.name.to_lowercase().replace([' ', '-'], "_"))
    };
    if in_class {
        writer.push(&format!("def {name}(self):"));
    } else {
        writer.push(&format!("def {name}():"));
    }
    writer.depth += 1;
    emit_body(writer, &case.body);
    writer.depth -= 1;
    writer.blank();
}

fn emit_body(writer: &mut PyWriter, body: &[CaseItem]) {
    if body.is_empty() {
        writer.push("pass");
        return;
    }
    for item in body {
        match item {
            CaseItem::Assertion(assertion) => emit_assertion(writer, assertion),
            CaseItem::Navigation(navigation) => writer.todo(
                &format!("navigation '{}' has no unittest equivalent", navigation.action),
                &navigation.meta.original_source,
                "move this flow to a browser test suite",
            ),
            CaseItem::MockCall(mock) => writer.todo(
                &format!("mock call '{}' has no unittest equivalent", mock.mock_kind),
                &mock.meta.original_source,
                "use unittest.mock",
            ),
            CaseItem::RawCode(raw) => emit_raw(writer, raw),
            CaseItem::Comment(comment) => writer.push(&format!("# {}", comment.text)),
        }
    }
}

fn emit_assertion(writer: &mut PyWriter, a: &Assertion) {
    let subject = &a.subject;
    let expected = a.expected.as_deref();
    let line = match (&a.assertion_kind, a.negated) {
        (AssertionKind::Equal, false) => {
            expected.map(|e| format!("self.assertEqual({subject}, {e})"))
        }
        (AssertionKind::Equal, true) => {
            expected.map(|e| format!("self.assertNotEqual({subject}, {e})"))
        }
        (AssertionKind::StrictEqual, false) => {
            expected.map(|e| format!("self.assertIs({subject}, {e})"))
        }
        (AssertionKind::StrictEqual, true) => {
            expected.map(|e| format!("self.assertIsNot({subject}, {e})"))
        }
        (AssertionKind::Truthy, false) => Some(format!("self.assertTrue({subject})")),
        (AssertionKind::Truthy, true) => Some(format!("self.assertFalse({subject})")),
        (AssertionKind::Falsy, false) => Some(format!("self.assertFalse({subject})")),
        (AssertionKind::Falsy, true) => Some(format!("self.assertTrue({subject})")),
        (AssertionKind::IsNull, false) => Some(format!("self.assertIsNone({subject})")),
        (AssertionKind::IsNull, true) => Some(format!("self.assertIsNotNone({subject})")),
        (AssertionKind::IsDefined, false) => Some(format!("self.assertIsNotNone({subject})")),
        (AssertionKind::IsDefined, true) => Some(format!("self.assertIsNone({subject})")),
        (AssertionKind::Contains, false) => {
            expected.map(|e| format!("self.assertIn({e}, {subject})"))
        }
        (AssertionKind::Contains, true) => {
            expected.map(|e| format!("self.assertNotIn({e}, {subject})"))
        }
        (AssertionKind::Match, false) => {
            expected.map(|e| format!("self.assertRegex({subject}, {e})"))
        }
        (AssertionKind::Throws, _) => Some(format!("with self.assertRaises({subject}):")),
        _ => None,
    };
    match line {
        Some(line) => writer.push(&line),
        None => writer.todo(
            &format!(
                "assertion kind '{}' has no unittest mapping",
                a.assertion_kind.as_str()
            ),
            &a.meta.original_source,
            "port this assertion manually",
        ),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ir::Confidence;

    #[test]
    fn detect_keys_on_testcase_subclassing() {
        let plugin = UnittestPlugin::new();
        let src = "\
import unittest

class CalcTest(unittest.TestCase):
    def test_add(self):
        self.assertEqual(add(1, 2), 3)
";
        assert!(plugin.detect(src) >= 90);
        assert_eq!(plugin.detect("def test_x():\n    assert True\n"), 10);
    }

    #[test]
    fn parse_reads_classes_fixtures_and_asserts() {
        let plugin = UnittestPlugin::new();
        let src = "\
import unittest
from calc import Calculator

class CalcTest(unittest.TestCase):
    def setUp(self):
        self.calc = Calculator()

    def test_add(self):
        self.assertEqual(self.calc.add(1, 2), 3)
        self.assertIn(3, self.calc.history)

    @unittest.skip('slow')
    def test_big(self):
        self.assertTrue(self.calc.big())

if __name__ == '__main__':
    unittest.main()
";
        let file = plugin.parse(src).unwrap();
        assert_eq!(file.imports.len(), 2);

        let FileItem::TestSuite(suite) = &file.body[0] else {
            panic!("expected suite");
        };
        assert_eq!(suite.name, "CalcTest");
        assert_eq!(suite.hooks.len(), 1);
        assert_eq!(suite.hooks[0].hook_type, HookType::BeforeEach);

        let SuiteItem::TestCase(add_case) = &suite.items[0] else {
            panic!("expected case");
        };
        let CaseItem::Assertion(eq) = &add_case.body[0] else {
            panic!("expected assertion");
        };
        assert_eq!(eq.assertion_kind, AssertionKind::Equal);
        assert_eq!(eq.subject, "self.calc.add(1, 2)");
        assert_eq!(eq.expected.as_deref(), Some("3"));

        let CaseItem::Assertion(contains) = &add_case.body[1] else {
            panic!("expected assertion");
        };
        assert_eq!(contains.assertion_kind, AssertionKind::Contains);
        assert_eq!(contains.subject, "self.calc.history");
        assert_eq!(contains.expected.as_deref(), Some("3"));

        let SuiteItem::TestCase(skipped) = &suite.items[1] else {
            panic!("expected case");
        };
        assert_eq!(skipped.modifiers[0].modifier_type, ModifierType::Skip);
    }

    #[test]
    fn unknown_assert_method_is_unconvertible() {
        let plugin = UnittestPlugin::new();
        let src = "\
class T(unittest.TestCase):
    def test_odd(self):
        self.assertAlmostEqual(pi, 3.14)
";
        let file = plugin.parse(src).unwrap();
        let FileItem::TestSuite(suite) = &file.body[0] else {
            panic!("expected suite");
        };
        let SuiteItem::TestCase(case) = &suite.items[0] else {
            panic!("expected case");
        };
        let CaseItem::Assertion(assertion) = &case.body[0] else {
            panic!("expected assertion");
        };
        assert_eq!(
            assertion.assertion_kind,
            AssertionKind::Other("assertAlmostEqual".to_string())
        );
        assert_eq!(assertion.meta.confidence, Confidence::Unconvertible);
    }

    #[test]
    fn emit_renders_a_wrapped_tree_with_a_main_tail() {
        let mut suite = TestSuite::new("Tests");
        let mut case = TestCase::new("test_add");
        case.body.push(CaseItem::Assertion(
            Assertion::new(AssertionKind::Equal, "add(1, 2)").with_expected("3"),
        ));
        suite.items.push(SuiteItem::TestCase(case));
        let mut file = TestFile::new("python");
        file.body.push(FileItem::TestSuite(suite));

        let plugin = UnittestPlugin::new();
        let output = plugin.emit(&file, "");
        assert!(output.starts_with("import unittest"));
        assert!(output.contains("class Tests(unittest.TestCase):"));
        assert!(output.contains("    def test_add(self):"));
        assert!(output.contains("        self.assertEqual(add(1, 2), 3)"));
        assert!(output.ends_with("if __name__ == '__main__':\n    unittest.main()\n"));
    }

    #[test]
    fn emit_flags_unmappable_kinds_with_todo_markers() {
        let mut case = TestCase::new("test_ui");
        case.body.push(CaseItem::Assertion(Assertion::new(
            AssertionKind::BeVisible,
            ".modal",
        )));
        let mut suite = TestSuite::new("Tests");
        suite.items.push(SuiteItem::TestCase(case));
        let mut file = TestFile::new("python");
        file.body.push(FileItem::TestSuite(suite));

        let plugin = UnittestPlugin::new();
        let output = plugin.emit(&file, "");
        assert!(output.contains("# HAMLET-TODO [1]: assertion kind 'be.visible' has no unittest mapping"));
        assert!(output.contains("# Manual action required: port this assertion manually"));
    }
}
