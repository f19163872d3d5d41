//! Structural emitter for the Vitest target.
//!
//! Handles the expression-level assertion vocabulary and the `vi.*` mock
//! surface. DOM and browser kinds are declined so the router keeps the
//! baseline (or a TODO marker) for them. This is the one built-in emitter
//! that implements whole-file emission.

use super::{EmittableNode, EmittedNode, IrEmitter};
use crate::ir::{
    Assertion, AssertionKind, CaseItem, Comment, Confidence, FileItem, Hook, HookType,
    ImportStatement, MockCall, MockKind, Modifier, ModifierType, Navigation, RawCode,
    SharedVariable, SuiteItem, TestCase, TestFile, TestSuite, walk_ir,
};
use crate::markers::{CommentStyle, todo_marker};

/// Module specifiers replaced by the single `vitest` import.
const JEST_MODULES: &[&str] = &["jest", "@jest/globals", "jest-mock", "@types/jest"];

pub struct VitestIrEmitter;

impl VitestIrEmitter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VitestIrEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl IrEmitter for VitestIrEmitter {
    fn emit_node(&self, node: EmittableNode<'_>) -> EmittedNode {
        let code = match node {
            EmittableNode::Assertion(a) => assertion_code(a),
            EmittableNode::Navigation(_) => None,
            EmittableNode::MockCall(m) => mock_code(m),
        };
        match code {
            Some(code) => EmittedNode::supported(code),
            None => EmittedNode::unsupported(),
        }
    }

    fn matches_baseline(&self, line: &str, node: EmittableNode<'_>) -> bool {
        match node {
            EmittableNode::Assertion(a) => line.contains(&format!("expect({})", a.subject)),
            EmittableNode::Navigation(_) => false,
            EmittableNode::MockCall(m) => {
                let token = match m.mock_kind {
                    MockKind::CreateMock => "vi.fn(",
                    MockKind::MockModule => "vi.mock(",
                    MockKind::FakeTimers => "vi.useFakeTimers",
                    MockKind::Spy => "vi.spyOn(",
                    MockKind::NetworkIntercept | MockKind::Other(_) => return false,
                };
                line.contains(token)
                    && m.target
                        .as_deref()
                        .is_none_or(|target| line.contains(target))
            }
        }
    }

    fn emit_full_file(&self, ir: &TestFile) -> Option<String> {
        let mut builder = FullFileBuilder::new();
        builder.file(ir);
        Some(builder.finish())
    }
}

fn assertion_code(a: &Assertion) -> Option<String> {
    let chain = if a.negated {
        format!("expect({}).not", a.subject)
    } else {
        format!("expect({})", a.subject)
    };
    let expected = a.expected.as_deref();
    let call = match &a.assertion_kind {
        AssertionKind::Equal => format!(".toEqual({})", expected?),
        AssertionKind::StrictEqual => format!(".toBe({})", expected?),
        AssertionKind::Truthy => ".toBeTruthy()".to_string(),
        AssertionKind::Falsy => ".toBeFalsy()".to_string(),
        AssertionKind::IsNull => ".toBeNull()".to_string(),
        AssertionKind::IsDefined => ".toBeDefined()".to_string(),
        AssertionKind::Contains => format!(".toContain({})", expected?),
        AssertionKind::HaveLength => format!(".toHaveLength({})", expected?),
        AssertionKind::Match => format!(".toMatch({})", expected?),
        AssertionKind::Throws => match expected {
            Some(expected) => format!(".toThrow({expected})"),
            None => ".toThrow()".to_string(),
        },
        AssertionKind::Called => ".toHaveBeenCalled()".to_string(),
        // Browser-facing kinds belong to e2e targets.
        AssertionKind::HaveText
        | AssertionKind::HaveAttr
        | AssertionKind::HaveClass
        | AssertionKind::HaveValue
        | AssertionKind::BeVisible
        | AssertionKind::BeChecked
        | AssertionKind::BeDisabled
        | AssertionKind::BeEnabled
        | AssertionKind::BeEmpty
        | AssertionKind::BeFocused
        | AssertionKind::UrlInclude
        | AssertionKind::UrlEqual
        | AssertionKind::TitleEqual
        | AssertionKind::Other(_) => return None,
    };
    Some(format!("{chain}{call};"))
}

fn mock_code(m: &MockCall) -> Option<String> {
    match &m.mock_kind {
        MockKind::CreateMock => Some(match &m.target {
            Some(target) => format!("const {target} = vi.fn();"),
            None => "vi.fn();".to_string(),
        }),
        MockKind::MockModule => {
            let target = m.target.as_deref()?;
            Some(format!("vi.mock('{target}');"))
        }
        MockKind::FakeTimers => Some("vi.useFakeTimers();".to_string()),
        MockKind::Spy => {
            let target = m.target.as_deref()?;
            Some(format!("vi.spyOn({target});"))
        }
        MockKind::NetworkIntercept | MockKind::Other(_) => None,
    }
}

// ============================================================
// Whole-file emission
// ============================================================

struct FullFileBuilder {
    lines: Vec<String>,
    depth: usize,
    todo_id: usize,
}

impl FullFileBuilder {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            depth: 0,
            todo_id: 0,
        }
    }

    fn finish(self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    fn push(&mut self, line: &str) {
        if line.is_empty() {
            self.lines.push(String::new());
            return;
        }
        self.lines.push(format!("{}{line}", "  ".repeat(self.depth)));
    }

    fn push_block(&mut self, block: &str) {
        for line in block.lines() {
            self.push(line);
        }
    }

    fn next_todo_id(&mut self) -> usize {
        self.todo_id += 1;
        self.todo_id
    }

    fn todo(&mut self, description: &str, original: &str, action: &str) {
        let id = self.next_todo_id();
        let marker = todo_marker(CommentStyle::Slashes, id, description, original, action);
        self.push_block(&marker);
    }

    fn file(&mut self, ir: &TestFile) {
        let helpers = vitest_helpers(ir);
        if !helpers.is_empty() {
            self.push(&format!(
                "import {{ {} }} from 'vitest';",
                helpers.join(", ")
            ));
        }
        for import in &ir.imports {
            self.import_statement(import);
        }
        if !helpers.is_empty() || !ir.imports.is_empty() {
            self.push("");
        }
        for item in &ir.body {
            self.file_item(item);
        }
    }

    fn import_statement(&mut self, import: &ImportStatement) {
        if JEST_MODULES.contains(&import.source.as_str()) {
            return;
        }
        if !import.meta.original_source.is_empty() {
            self.push(&import.meta.original_source);
            return;
        }
        self.push(&render_import(import));
    }

    fn file_item(&mut self, item: &FileItem) {
        match item {
            FileItem::TestSuite(suite) => self.suite(suite),
            FileItem::TestCase(case) => self.case(case),
            FileItem::SharedVariable(shared) => self.shared(shared),
            FileItem::MockCall(mock) => self.mock(mock),
            FileItem::RawCode(raw) => self.raw(raw),
            FileItem::Comment(comment) => self.comment(comment),
        }
    }

    fn suite(&mut self, suite: &TestSuite) {
        let head = format!(
            "describe{}('{}', () => {{",
            modifier_suffix(&suite.modifiers),
            escape_single(&suite.name)
        );
        self.push(&head);
        self.depth += 1;
        for hook in &suite.hooks {
            self.hook(hook);
        }
        for item in &suite.items {
            match item {
                SuiteItem::TestSuite(nested) => self.suite(nested),
                SuiteItem::TestCase(case) => self.case(case),
                SuiteItem::SharedVariable(shared) => self.shared(shared),
                SuiteItem::MockCall(mock) => self.mock(mock),
                SuiteItem::RawCode(raw) => self.raw(raw),
                SuiteItem::Comment(comment) => self.comment(comment),
            }
        }
        self.depth -= 1;
        self.push("});");
    }

    fn case(&mut self, case: &TestCase) {
        let name = escape_single(&case.name);
        if case
            .modifiers
            .iter()
            .any(|m| m.modifier_type == ModifierType::Todo)
        {
            self.push(&format!("it.todo('{name}');"));
            return;
        }
        let head = match &case.parameters {
            Some(parameters) => format!(
                "it.each([{}])('{name}', () => {{",
                parameters.rows.join(", ")
            ),
            None => format!(
                "it{}('{name}', () => {{",
                modifier_suffix(&case.modifiers)
            ),
        };
        self.push(&head);
        self.depth += 1;
        for item in &case.body {
            self.case_item(item);
        }
        self.depth -= 1;
        self.push("});");
    }

    fn hook(&mut self, hook: &Hook) {
        let name = match hook.hook_type {
            HookType::BeforeEach => "beforeEach",
            HookType::AfterEach => "afterEach",
            HookType::BeforeAll => "beforeAll",
            HookType::AfterAll => "afterAll",
        };
        self.push(&format!("{name}(() => {{"));
        self.depth += 1;
        for item in &hook.body {
            self.case_item(item);
        }
        self.depth -= 1;
        self.push("});");
    }

    fn case_item(&mut self, item: &CaseItem) {
        match item {
            CaseItem::Assertion(assertion) => self.assertion(assertion),
            CaseItem::Navigation(navigation) => self.navigation(navigation),
            CaseItem::MockCall(mock) => self.mock(mock),
            CaseItem::RawCode(raw) => self.raw(raw),
            CaseItem::Comment(comment) => self.comment(comment),
        }
    }

    fn assertion(&mut self, assertion: &Assertion) {
        match assertion_code(assertion) {
            Some(code) => self.push(&code),
            None => self.todo(
                &format!(
                    "unsupported assertion kind '{}'",
                    assertion.assertion_kind.as_str()
                ),
                &assertion.meta.original_source,
                "port this assertion manually",
            ),
        }
    }

    fn navigation(&mut self, navigation: &Navigation) {
        self.todo(
            &format!("navigation '{}' has no vitest equivalent", navigation.action),
            &navigation.meta.original_source,
            "move this flow to an end-to-end suite",
        );
    }

    fn mock(&mut self, mock: &MockCall) {
        match mock_code(mock) {
            Some(code) => self.push(&code),
            None => self.todo(
                &format!("unsupported mock call '{}'", mock.mock_kind),
                &mock.meta.original_source,
                "port this mock manually",
            ),
        }
    }

    fn shared(&mut self, shared: &SharedVariable) {
        if !shared.meta.original_source.is_empty() {
            self.push_block(&shared.meta.original_source);
        } else {
            self.push(&format!("let {} = {};", shared.name, shared.initializer));
        }
    }

    fn raw(&mut self, raw: &RawCode) {
        if raw.meta.confidence == Confidence::Unconvertible {
            self.todo(
                "unconvertible statement",
                &raw.meta.original_source,
                "rewrite for vitest",
            );
        } else {
            self.push_block(&raw.code);
        }
    }

    fn comment(&mut self, comment: &Comment) {
        self.push(&format!("// {}", comment.text));
    }
}

/// Names to pull from 'vitest', in canonical order, based on what the
/// tree actually uses.
fn vitest_helpers(ir: &TestFile) -> Vec<&'static str> {
    let mut describe = false;
    let mut it = false;
    let mut expect = false;
    let mut vi = false;
    let mut hooks: Vec<HookType> = Vec::new();
    walk_ir(ir, &mut |node| match node {
        crate::ir::IrRef::TestSuite(_) => describe = true,
        crate::ir::IrRef::TestCase(_) => it = true,
        crate::ir::IrRef::Assertion(_) => expect = true,
        crate::ir::IrRef::MockCall(_) => vi = true,
        crate::ir::IrRef::Hook(h) => {
            if !hooks.contains(&h.hook_type) {
                hooks.push(h.hook_type);
            }
        }
        _ => {}
    });

    let mut helpers = Vec::new();
    if describe {
        helpers.push("describe");
    }
    if it {
        helpers.push("it");
    }
    if expect {
        helpers.push("expect");
    }
    if vi {
        helpers.push("vi");
    }
    for hook_type in [
        HookType::BeforeEach,
        HookType::AfterEach,
        HookType::BeforeAll,
        HookType::AfterAll,
    ] {
        if hooks.contains(&hook_type) {
            helpers.push(match hook_type {
                HookType::BeforeEach => "beforeEach",
                HookType::AfterEach => "afterEach",
                HookType::BeforeAll => "beforeAll",
                HookType::AfterAll => "afterAll",
            });
        }
    }
    helpers
}

fn render_import(import: &ImportStatement) -> String {
    let bindings = &import.bindings;
    if bindings.is_side_effect() {
        return format!("import '{}';", import.source);
    }
    let mut clauses = Vec::new();
    if let Some(default_binding) = &bindings.default_binding {
        clauses.push(default_binding.clone());
    }
    if let Some(namespace) = &bindings.namespace {
        clauses.push(format!("* as {namespace}"));
    }
    if !bindings.named.is_empty() {
        clauses.push(format!("{{ {} }}", bindings.named.join(", ")));
    }
    let type_prefix = if bindings.type_only { "type " } else { "" };
    format!(
        "import {type_prefix}{} from '{}';",
        clauses.join(", "),
        import.source
    )
}

fn modifier_suffix(modifiers: &[Modifier]) -> &'static str {
    for modifier in modifiers {
        match modifier.modifier_type {
            ModifierType::Only => return ".only",
            ModifierType::Skip => return ".skip",
            ModifierType::Todo => {}
        }
    }
    ""
}

fn escape_single(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}
