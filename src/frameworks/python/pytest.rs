//! Pytest plugin.
//!
//! Function-paradigm source: top-level `def test_*` functions, bare
//! `assert` statements, `pytest.mark` decorators, `pytest.raises`
//! blocks. As a target it renders xunit-style trees as pytest classes
//! and plain asserts.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::{
    PyWriter, indent_of, parse_assert_statement, parse_python_import, split_args,
};
use crate::error::ParseFailure;
use crate::ir::{
    Assertion, AssertionKind, CaseItem, Comment, FileItem, Hook, HookType, Modifier,
    ModifierType, NodeMeta, ParameterSet, RawCode, SuiteItem, TestCase, TestFile, TestSuite,
};
use crate::registry::{FrameworkPlugin, ImportTable, Paradigm};

static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^class\s+(?<name>\w+)(?:\((?<bases>[^)]*)\))?\s*:\s*$").expect("class regex")
});
static DEF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:async\s+)?def\s+(?<name>\w+)\s*\((?<params>[^)]*)\)\s*(?:->\s*[\w\[\], .]+)?:\s*$")
        .expect("def regex")
});
static RAISES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^with\s+pytest\.raises\(\s*(?<exc>[^)]+?)\s*\)\s*(?:as\s+\w+\s*)?:\s*$")
        .expect("raises regex")
});
static PARAMETRIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^@pytest\.mark\.parametrize\(\s*['"][^'"]+['"]\s*,\s*\[(?<rows>.*)\]\s*\)\s*$"#,
    )
    .expect("parametrize regex")
});

pub struct PytestPlugin {
    imports: ImportTable,
}

impl PytestPlugin {
    pub fn new() -> Self {
        Self {
            imports: ImportTable {
                modules: vec!["pytest"],
                replacements: BTreeMap::from([("unittest", "pytest")]),
            },
        }
    }
}

impl Default for PytestPlugin {
    fn default() -> Self {
        Self::new()
    }
}

enum Open {
    Case(TestCase, usize),
    Hook(Hook, usize),
}

struct Parser {
    file: TestFile,
    suite: Option<(TestSuite, usize)>,
    open: Option<Open>,
    decorators: Vec<String>,
}

impl Parser {
    fn new() -> Self {
        Self {
            file: TestFile::new("python"),
            suite: None,
            open: None,
            decorators: Vec::new(),
        }
    }

    fn flush_open(&mut self) {
        match self.open.take() {
            Some(Open::Case(case, _)) => match &mut self.suite {
                Some((suite, _)) => suite.items.push(SuiteItem::TestCase(case)),
                None => self.file.body.push(FileItem::TestCase(case)),
            },
            Some(Open::Hook(hook, _)) => match &mut self.suite {
                Some((suite, _)) => suite.hooks.push(hook),
                None => self
                    .file
                    .body
                    .push(FileItem::RawCode(RawCode::passthrough(
                        hook.meta.original_source.clone(),
                    ))),
            },
            None => {}
        }
    }

    fn flush_suite(&mut self) {
        self.flush_open();
        if let Some((suite, _)) = self.suite.take() {
            self.file.body.push(FileItem::TestSuite(suite));
        }
    }

    fn attach_raw(&mut self, raw: RawCode) {
        match &mut self.open {
            Some(Open::Case(case, _)) => case.body.push(CaseItem::RawCode(raw)),
            Some(Open::Hook(hook, _)) => hook.body.push(CaseItem::RawCode(raw)),
            None => match &mut self.suite {
                Some((suite, _)) => suite.items.push(SuiteItem::RawCode(raw)),
                None => self.file.body.push(FileItem::RawCode(raw)),
            },
        }
    }

    fn attach_comment(&mut self, comment: Comment) {
        match &mut self.open {
            Some(Open::Case(case, _)) => case.body.push(CaseItem::Comment(comment)),
            Some(Open::Hook(hook, _)) => hook.body.push(CaseItem::Comment(comment)),
            None => match &mut self.suite {
                Some((suite, _)) => suite.items.push(SuiteItem::Comment(comment)),
                None => self.file.body.push(FileItem::Comment(comment)),
            },
        }
    }
}

/// Hook method names shared by pytest class style and unittest.
pub(crate) fn hook_type_for(name: &str) -> Option<HookType> {
    match name {
        "setup_method" | "setUp" => Some(HookType::BeforeEach),
        "teardown_method" | "tearDown" => Some(HookType::AfterEach),
        "setup_class" | "setUpClass" => Some(HookType::BeforeAll),
        "teardown_class" | "tearDownClass" => Some(HookType::AfterAll),
        _ => None,
    }
}

fn apply_decorators(case: &mut TestCase, decorators: &[String]) {
    for decorator in decorators {
        if decorator.starts_with("@pytest.mark.skip") {
            case.push_modifier(Modifier::new(ModifierType::Skip));
        } else if decorator.starts_with("@pytest.mark.xfail") {
            case.push_modifier(Modifier::new(ModifierType::Todo));
        } else if let Some(caps) = PARAMETRIZE_RE.captures(decorator) {
            case.parameters = Some(ParameterSet::new(split_args(&caps["rows"])));
        }
    }
}

/// Strip `base` leading spaces, keeping deeper relative indentation.
fn dedent(line: &str, base: usize) -> &str {
    let available = indent_of(line).min(base);
    &line[available..]
}

impl FrameworkPlugin for PytestPlugin {
    fn name(&self) -> &str {
        "pytest"
    }

    fn language(&self) -> &str {
        "python"
    }

    fn paradigm(&self) -> Paradigm {
        Paradigm::Function
    }

    fn detect(&self, src: &str) -> u8 {
        let mut score = 0u32;
        if src.contains("import pytest") {
            score += 40;
        }
        if src.contains("def test_") {
            score += 30;
        }
        if src.contains("assert ") {
            score += 20;
        }
        if src.contains("pytest.mark") || src.contains("pytest.raises") {
            score += 10;
        }
        if src.contains("unittest.TestCase") {
            score = score.saturating_sub(40);
        }
        score.min(100) as u8
    }

    fn parse(&self, src: &str) -> Result<TestFile, ParseFailure> {
        let mut parser = Parser::new();

        for (index, line) in src.lines().enumerate() {
            let line_no = index + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let indent = indent_of(line);

            // Dedenting past an open construct closes it.
            let open_indent = match &parser.open {
                Some(Open::Case(_, d) | Open::Hook(_, d)) => Some(*d),
                None => None,
            };
            if open_indent.is_some_and(|d| indent <= d) {
                parser.flush_open();
            }
            let class_indent = parser.suite.as_ref().map(|(_, d)| *d);
            if parser.open.is_none() && class_indent.is_some_and(|d| indent <= d) {
                parser.flush_suite();
            }

            if let Some(comment) = trimmed.strip_prefix('#') {
                let mut node = Comment::new(comment.trim());
                node.meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
                parser.attach_comment(node);
                continue;
            }

            if parser.open.is_none() {
                if parser.suite.is_none()
                    && indent == 0
                    && let Some(import) = parse_python_import(trimmed, line_no)
                {
                    parser.file.imports.push(import);
                    parser.decorators.clear();
                    continue;
                }

                if trimmed.starts_with('@') {
                    parser.decorators.push(trimmed.to_string());
                    continue;
                }

                if let Some(caps) = CLASS_RE.captures(trimmed) {
                    parser.flush_suite();
                    let mut suite = TestSuite::new(&caps["name"]);
                    suite.meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
                    for decorator in parser.decorators.drain(..) {
                        if decorator.starts_with("@pytest.mark.skip") {
                            suite.push_modifier(Modifier::new(ModifierType::Skip));
                        }
                    }
                    parser.suite = Some((suite, indent));
                    continue;
                }

                if let Some(caps) = DEF_RE.captures(trimmed) {
                    let name = &caps["name"];
                    if let Some(hook_type) = hook_type_for(name) {
                        let mut hook = Hook::new(hook_type);
                        hook.meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
                        parser.decorators.clear();
                        parser.open = Some(Open::Hook(hook, indent));
                        continue;
                    }
                    if name.starts_with("test_") {
                        let mut case = TestCase::new(name);
                        case.meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
                        apply_decorators(&mut case, &parser.decorators);
                        parser.decorators.clear();
                        parser.open = Some(Open::Case(case, indent));
                        continue;
                    }
                    // Helper functions and fixtures stay verbatim.
                    let pending: Vec<String> = parser.decorators.drain(..).collect();
                    for decorator in pending {
                        parser.attach_raw(RawCode::passthrough(decorator));
                    }
                    let mut raw = RawCode::passthrough(line);
                    raw.meta.location = Some(crate::ir::SourceLocation::line(line_no));
                    parser.attach_raw(raw);
                    continue;
                }

                let mut raw = RawCode::passthrough(line);
                raw.meta.location = Some(crate::ir::SourceLocation::line(line_no));
                parser.attach_raw(raw);
                continue;
            }

            // Inside a test or hook body.
            let body_base = match &parser.open {
                Some(Open::Case(_, d) | Open::Hook(_, d)) => d + 4,
                None => unreachable!("open construct checked above"),
            };

            if let Some(caps) = RAISES_RE.captures(trimmed) {
                let mut assertion = Assertion::new(AssertionKind::Throws, &caps["exc"]);
                assertion.meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
                match &mut parser.open {
                    Some(Open::Case(case, _)) => case.body.push(CaseItem::Assertion(assertion)),
                    Some(Open::Hook(hook, _)) => hook.body.push(CaseItem::Assertion(assertion)),
                    None => unreachable!(),
                }
                continue;
            }

            if let Some(assertion) = parse_assert_statement(trimmed, line_no) {
                match &mut parser.open {
                    Some(Open::Case(case, _)) => case.body.push(CaseItem::Assertion(assertion)),
                    Some(Open::Hook(hook, _)) => hook.body.push(CaseItem::Assertion(assertion)),
                    None => unreachable!(),
                }
                continue;
            }

            let mut raw = RawCode::passthrough(dedent(line, body_base));
            raw.meta.location = Some(crate::ir::SourceLocation::line(line_no));
            raw.meta.original_source = trimmed.to_string();
            parser.attach_raw(raw);
        }

        parser.flush_suite();
        parser.flush_open();
        Ok(parser.file)
    }

    /// Pytest as a *target*: render the tree as classes and plain asserts.
    fn emit(&self, ir: &TestFile, _src: &str) -> String {
        let mut writer = PyWriter::new();
        let needs_pytest = tree_needs_pytest(ir);
        if needs_pytest {
            writer.push("import pytest");
        }
        for import in &ir.imports {
            if import.source == "unittest" || import.source == "pytest" {
                continue;
            }
            if !import.meta.original_source.is_empty() {
                writer.push(&import.meta.original_source);
            }
        }
        writer.blank();

        for item in &ir.body {
            emit_file_item(&mut writer, item);
        }
        writer.finish()
    }

    fn imports(&self) -> &ImportTable {
        &self.imports
    }
}

fn tree_needs_pytest(ir: &TestFile) -> bool {
    let mut needed = false;
    crate::ir::walk_ir(ir, &mut |node| match node {
        crate::ir::IrRef::Assertion(a) if a.assertion_kind == AssertionKind::Throws => {
            needed = true;
        }
        crate::ir::IrRef::Modifier(_) => needed = true,
        _ => {}
    });
    needed
}

fn emit_file_item(writer: &mut PyWriter, item: &FileItem) {
    match item {
        FileItem::TestSuite(suite) => emit_suite(writer, suite),
        FileItem::TestCase(case) => emit_case(writer, case, false),
        FileItem::SharedVariable(shared) => {
            writer.push(&format!("{} = {}", shared.name, shared.initializer));
        }
        FileItem::MockCall(mock) => writer.todo(
            &format!("mock call '{}' needs a pytest fixture", mock.mock_kind),
            &mock.meta.original_source,
            "use monkeypatch or a fixture",
        ),
        FileItem::RawCode(raw) => emit_raw(writer, raw),
        FileItem::Comment(comment) => writer.push(&format!("# {}", comment.text)),
    }
}

fn emit_suite(writer: &mut PyWriter, suite: &TestSuite) {
    writer.blank();
    let name = if suite.name.starts_with("Test") {
        suite.name.clone()
    } else {
        format!("Test{}", suite.name)
    };
    writer.push(&format!("class {name}:"));
    writer.depth += 1;
    let mut empty = true;
    for hook in &suite.hooks {
        empty = false;
        emit_hook(writer, hook);
    }
    for item in &suite.items {
        empty = false;
        match item {
            SuiteItem::TestSuite(nested) => emit_suite(writer, nested),
            SuiteItem::TestCase(case) => emit_case(writer, case, true),
            SuiteItem::SharedVariable(shared) => {
                writer.push(&format!("{} = {}", shared.name, shared.initializer));
            }
            SuiteItem::MockCall(mock) => writer.todo(
                &format!("mock call '{}' needs a pytest fixture", mock.mock_kind),
                &mock.meta.original_source,
                "use monkeypatch or a fixture",
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
        HookType::BeforeEach => (None, "def setup_method(self):"),
        HookType::AfterEach => (None, "def teardown_method(self):"),
        HookType::BeforeAll => (Some("@classmethod"), "def setup_class(cls):"),
        HookType::AfterAll => (Some("@classmethod"), "def teardown_class(cls):"),
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
            ModifierType::Skip => writer.push("@pytest.mark.skip"),
            ModifierType::Todo => writer.push("@pytest.mark.xfail(reason='todo')"),
            ModifierType::Only => writer.todo(
                "focused tests have no pytest equivalent",
                &modifier.meta.original_source,
                "run with -k to focus",
            ),
        }
    }
    if let Some(parameters) = &case.parameters {
        writer.push(&format!(
            "@pytest.mark.parametrize('params', [{}])",
            parameters.rows.join(", ")
        ));
    }
    let name = python_case_name(&case.name);
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
                &format!("navigation '{}' has no pytest equivalent", navigation.action),
                &navigation.meta.original_source,
                "move this flow to a browser test suite",
            ),
            CaseItem::MockCall(mock) => writer.todo(
                &format!("mock call '{}' needs a pytest fixture", mock.mock_kind),
                &mock.meta.original_source,
                "use monkeypatch or a fixture",
            ),
            CaseItem::RawCode(raw) => emit_raw(writer, raw),
            CaseItem::Comment(comment) => writer.push(&format!("# {}", comment.text)),
        }
    }
}

fn emit_raw(writer: &mut PyWriter, raw: &RawCode) {
    if raw.code.contains("unittest.main()") || raw.code.starts_with("if __name__") {
        return;
    }
    writer.push_block(&raw.code);
}

fn emit_assertion(writer: &mut PyWriter, a: &Assertion) {
    let subject = &a.subject;
    let expected = a.expected.as_deref();
    let line = match (&a.assertion_kind, a.negated) {
        (AssertionKind::Equal, false) => expected.map(|e| format!("assert {subject} == {e}")),
        (AssertionKind::Equal, true) => expected.map(|e| format!("assert {subject} != {e}")),
        (AssertionKind::StrictEqual, false) => expected.map(|e| format!("assert {subject} is {e}")),
        (AssertionKind::StrictEqual, true) => {
            expected.map(|e| format!("assert {subject} is not {e}"))
        }
        (AssertionKind::Truthy, false) => Some(format!("assert {subject}")),
        (AssertionKind::Truthy, true) => Some(format!("assert not {subject}")),
        (AssertionKind::Falsy, false) => Some(format!("assert not {subject}")),
        (AssertionKind::Falsy, true) => Some(format!("assert {subject}")),
        (AssertionKind::IsNull, false) => Some(format!("assert {subject} is None")),
        (AssertionKind::IsNull, true) => Some(format!("assert {subject} is not None")),
        (AssertionKind::IsDefined, false) => Some(format!("assert {subject} is not None")),
        (AssertionKind::IsDefined, true) => Some(format!("assert {subject} is None")),
        (AssertionKind::Contains, false) => expected.map(|e| format!("assert {e} in {subject}")),
        (AssertionKind::Contains, true) => expected.map(|e| format!("assert {e} not in {subject}")),
        (AssertionKind::Throws, _) => Some(format!("with pytest.raises({subject}):")),
        _ => None,
    };
    match line {
        Some(line) => writer.push(&line),
        None => writer.todo(
            &format!(
                "assertion kind '{}' has no pytest mapping",
                a.assertion_kind.as_str()
            ),
            &a.meta.original_source,
            "port this assertion manually",
        ),
    }
}

fn python_case_name(name: &str) -> String {
    if name.starts_with("test") {
        name.to_string()
    } else {
        format!(
            "test_{}",
            name.to_lowercase().replace([' ', '-'], "_")
        )
    }
}
