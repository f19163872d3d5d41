//! Shared line-structured scanning for the JavaScript-family plugins.
//!
//! All four JS plugins speak the same BDD surface (`describe`/`it`
//! nesting, hooks, arrow callbacks); they differ only in how individual
//! body lines are classified. `parse_bdd` owns the structural scan
//! (brace depth tracking with string/comment-aware counting) and
//! delegates per-line classification to the plugin.

pub mod cypress;
pub mod jest;
pub mod playwright;
pub mod vitest;

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ParseFailure;
use crate::ir::{
    CaseItem, Comment, FileItem, Hook, HookType, ImportBindings, ImportStatement, Modifier,
    ModifierType, NodeMeta, ParameterSet, RawCode, SharedVariable, SuiteItem, TestCase, TestFile,
    TestSuite,
};

static SUITE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?:test\.describe|describe|context|suite)(\.only|\.skip)?\s*\(\s*['"`](?<name>[^'"`]*)['"`]\s*,"#,
    )
    .expect("suite regex")
});

static CASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:it|test|specify)(?<mod>\.only|\.skip|\.todo)?\s*\(\s*['"`](?<name>[^'"`]*)['"`]\s*[,)]"#)
        .expect("case regex")
});

static EACH_CASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:it|test)\.each\(\s*\[(?<rows>.*)\]\s*\)\s*\(\s*['"`](?<name>[^'"`]*)['"`]\s*,"#)
        .expect("each regex")
});

static HOOK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:test\.)?(?<hook>beforeEach|beforeAll|afterEach|afterAll|before|after)\s*\(")
        .expect("hook regex")
});

static SHARED_VAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:const|let|var)\s+(?<name>\w+)\s*=\s*(?<init>[^;{]*);\s*$")
        .expect("shared var regex")
});

static CLOSER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[)\]}\s;]+$").expect("closer regex"));

/// Strip string literals (contents replaced by spaces) and `//` comments
/// so brace counting sees only code.
pub(crate) fn code_only(line: &str) -> String {
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
                _ => out.push(c),
            },
        }
    }
    out
}

/// Net brace balance of a line, strings and comments excluded.
pub(crate) fn net_braces(line: &str) -> i32 {
    let code = code_only(line);
    let mut net = 0;
    for c in code.chars() {
        match c {
            '{' => net += 1,
            '}' => net -= 1,
            _ => {}
        }
    }
    net
}

/// Parse a single `import`/`require` statement line.
pub(crate) fn parse_import_line(trimmed: &str, line_no: usize) -> Option<ImportStatement> {
    static SIDE_EFFECT: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"^import\s*['"](?<source>[^'"]+)['"];?\s*$"#).expect("side-effect regex")
    });
    static FROM: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"^import\s+(?<type>type\s+)?(?<clause>.+?)\s+from\s*['"](?<source>[^'"]+)['"];?\s*$"#)
            .expect("from regex")
    });
    static REQUIRE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r#"^(?:const|let|var)\s+(?<clause>.+?)\s*=\s*require\(\s*['"](?<source>[^'"]+)['"]\s*\);?\s*$"#,
        )
        .expect("require regex")
    });

    let meta = NodeMeta::new().with_line(line_no).with_source(trimmed);

    if let Some(caps) = SIDE_EFFECT.captures(trimmed) {
        let mut import = ImportStatement::new(&caps["source"]);
        import.meta = meta;
        return Some(import);
    }
    if let Some(caps) = FROM.captures(trimmed) {
        let mut bindings = parse_import_clause(&caps["clause"]);
        bindings.type_only = caps.name("type").is_some();
        let mut import = ImportStatement::new(&caps["source"]).with_bindings(bindings);
        import.meta = meta;
        return Some(import);
    }
    if let Some(caps) = REQUIRE.captures(trimmed) {
        let clause = caps["clause"].trim().to_string();
        let mut bindings = ImportBindings::default();
        if clause.starts_with('{') {
            bindings.named = split_named(&clause);
        } else {
            bindings.default_binding = Some(clause);
        }
        let mut import = ImportStatement::new(&caps["source"]).with_bindings(bindings);
        import.meta = meta;
        return Some(import);
    }
    None
}

fn parse_import_clause(clause: &str) -> ImportBindings {
    let mut bindings = ImportBindings::default();
    let clause = clause.trim();
    if let Some(rest) = clause.strip_prefix("* as ") {
        bindings.namespace = Some(rest.trim().to_string());
        return bindings;
    }
    // `Default, { a, b }` / `Default` / `{ a, b }` / `Default, * as ns`
    let mut remainder = clause;
    if !remainder.starts_with('{') && !remainder.starts_with('*') {
        match remainder.split_once(',') {
            Some((default_binding, rest)) => {
                bindings.default_binding = Some(default_binding.trim().to_string());
                remainder = rest.trim();
            }
            None => {
                bindings.default_binding = Some(remainder.trim().to_string());
                return bindings;
            }
        }
    }
    if let Some(rest) = remainder.strip_prefix("* as ") {
        bindings.namespace = Some(rest.trim().to_string());
    } else if remainder.starts_with('{') {
        bindings.named = split_named(remainder);
    }
    bindings
}

fn split_named(braced: &str) -> Vec<String> {
    braced
        .trim_start_matches('{')
        .trim_end_matches('}')
        .split(',')
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

// ============================================================
// Expect-style assertion and mock lines (jest / vitest surface)
// ============================================================

static EXPECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:await\s+)?expect\((?<subject>.+)\)\.(?:(?<not>not)\.)?(?<matcher>\w+)\((?<args>.*)\)\s*;?\s*$",
    )
    .expect("expect regex")
});

/// Parse one `expect(...)` assertion line. Unknown matchers become
/// out-of-vocabulary assertions, flagged unconvertible by construction.
pub(crate) fn parse_expect_line(trimmed: &str, line_no: usize) -> Option<crate::ir::Assertion> {
    use crate::ir::AssertionKind;

    let caps = EXPECT_RE.captures(trimmed)?;
    let subject = caps["subject"].trim().to_string();
    let matcher = &caps["matcher"];
    let args = caps["args"].trim().to_string();
    let mut negated = caps.name("not").is_some();

    let kind = match matcher {
        "toBe" => AssertionKind::StrictEqual,
        "toEqual" | "toStrictEqual" => AssertionKind::Equal,
        "toBeTruthy" => AssertionKind::Truthy,
        "toBeFalsy" => AssertionKind::Falsy,
        "toBeNull" => AssertionKind::IsNull,
        "toBeDefined" => AssertionKind::IsDefined,
        "toBeUndefined" => {
            negated = !negated;
            AssertionKind::IsDefined
        }
        "toContain" | "toContainEqual" => AssertionKind::Contains,
        "toHaveLength" => AssertionKind::HaveLength,
        "toMatch" => AssertionKind::Match,
        "toThrow" | "toThrowError" => AssertionKind::Throws,
        "toHaveBeenCalled" => AssertionKind::Called,
        other => AssertionKind::Other(other.to_string()),
    };

    let mut assertion = crate::ir::Assertion::new(kind, subject);
    if negated {
        assertion = assertion.negated();
    }
    if !args.is_empty() {
        assertion = assertion.with_expected(args);
    }
    let confidence = assertion.meta.confidence;
    assertion.meta = NodeMeta::new()
        .with_line(line_no)
        .with_source(trimmed)
        .with_confidence(confidence);
    Some(assertion)
}

/// Mock-call patterns for a `jest.`/`vi.` style namespace.
pub(crate) struct MockPatterns {
    create_assigned: Regex,
    create: Regex,
    mock_module: Regex,
    fake_timers: Regex,
    spy: Regex,
}

impl MockPatterns {
    pub(crate) fn for_namespace(ns: &str) -> Self {
        Self {
            create_assigned: Regex::new(&format!(
                r"^(?:const|let|var)\s+(?<target>\w+)\s*=\s*{ns}\.fn\("
            ))
            .expect("create-assigned regex"),
            create: Regex::new(&format!(r"^{ns}\.fn\(")).expect("create regex"),
            mock_module: Regex::new(&format!(
                r#"^{ns}\.mock\(\s*['"](?<target>[^'"]+)['"]"#
            ))
            .expect("mock-module regex"),
            fake_timers: Regex::new(&format!(r"^{ns}\.useFakeTimers\("))
                .expect("fake-timers regex"),
            spy: Regex::new(&format!(
                r"^(?:(?:const|let|var)\s+\w+\s*=\s*)?{ns}\.spyOn\(\s*(?<target>.*?)\s*\)\s*;?\s*$"
            ))
            .expect("spy regex"),
        }
    }

    pub(crate) fn parse(&self, trimmed: &str, line_no: usize) -> Option<crate::ir::MockCall> {
        use crate::ir::{MockCall, MockKind};

        let meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
        let mock = if let Some(caps) = self.create_assigned.captures(trimmed) {
            MockCall::new(MockKind::CreateMock).with_target(&caps["target"])
        } else if self.create.is_match(trimmed) {
            MockCall::new(MockKind::CreateMock)
        } else if let Some(caps) = self.mock_module.captures(trimmed) {
            MockCall::new(MockKind::MockModule).with_target(&caps["target"])
        } else if self.fake_timers.is_match(trimmed) {
            MockCall::new(MockKind::FakeTimers)
        } else if let Some(caps) = self.spy.captures(trimmed) {
            MockCall::new(MockKind::Spy).with_target(&caps["target"])
        } else {
            return None;
        };
        let mut mock = mock;
        mock.meta = meta;
        Some(mock)
    }
}

/// What a plugin's context-line classifier may produce outside cases.
pub(crate) enum ContextEntry {
    Mock(crate::ir::MockCall),
    Raw(RawCode),
}

/// Per-plugin line classification hooks for `parse_bdd`.
pub(crate) trait LineClassifier {
    /// Classify a statement inside a test case or hook body.
    fn case_line(&self, trimmed: &str, line_no: usize) -> Option<CaseItem>;

    /// Classify a statement at file or suite level (module mocks and the
    /// like). `None` falls back to shared-variable/raw handling.
    fn context_line(&self, trimmed: &str, line_no: usize) -> Option<ContextEntry>;
}

enum Frame {
    Suite(TestSuite, i32, usize),
    Case(TestCase, i32, usize),
    Hook(Hook, i32, usize),
}

impl Frame {
    fn open_depth(&self) -> i32 {
        match self {
            Frame::Suite(_, d, _) | Frame::Case(_, d, _) | Frame::Hook(_, d, _) => *d,
        }
    }

    fn open_line(&self) -> usize {
        match self {
            Frame::Suite(_, _, l) | Frame::Case(_, _, l) | Frame::Hook(_, _, l) => *l,
        }
    }
}

/// Structural BDD scan shared by all JS plugins.
pub(crate) fn parse_bdd(
    src: &str,
    language: &str,
    classifier: &dyn LineClassifier,
) -> Result<TestFile, ParseFailure> {
    let mut file = TestFile::new(language);
    let mut stack: Vec<Frame> = Vec::new();
    let mut depth: i32 = 0;

    for (index, line) in src.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let depth_before = depth;
        depth += net_braces(line);

        // Pure closer lines either close the innermost frame or belong to
        // a nested block inside it.
        if CLOSER_RE.is_match(trimmed) {
            if let Some(open_depth) = stack.last().map(Frame::open_depth) {
                if depth <= open_depth {
                    let frame = stack.pop().expect("frame present");
                    attach_frame(frame, &mut stack, &mut file);
                } else {
                    attach_raw(RawCode::passthrough(trimmed), line_no, &mut stack, &mut file);
                }
            }
            continue;
        }

        if trimmed.starts_with("//") {
            let mut comment = Comment::new(trimmed.trim_start_matches('/').trim());
            comment.meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
            attach_comment(comment, &mut stack, &mut file);
            continue;
        }

        let in_case_or_hook = matches!(stack.last(), Some(Frame::Case(..) | Frame::Hook(..)));

        if !in_case_or_hook {
            if stack.is_empty()
                && let Some(import) = parse_import_line(trimmed, line_no)
            {
                file.imports.push(import);
                continue;
            }

            if let Some(caps) = SUITE_RE.captures(trimmed) {
                let mut suite = TestSuite::new(&caps["name"]);
                suite.meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
                if let Some(modifier) = caps.get(1).and_then(|m| parse_modifier(m.as_str())) {
                    suite.push_modifier(Modifier::new(modifier));
                }
                stack.push(Frame::Suite(suite, depth_before, line_no));
                continue;
            }

            if let Some(caps) = EACH_CASE_RE.captures(trimmed) {
                let mut case = TestCase::new(&caps["name"]);
                case.meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
                case.parameters = Some(ParameterSet::new(split_rows(&caps["rows"])));
                stack.push(Frame::Case(case, depth_before, line_no));
                continue;
            }

            if let Some(caps) = CASE_RE.captures(trimmed) {
                let mut case = TestCase::new(&caps["name"]);
                case.meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
                let modifier = caps.name("mod").and_then(|m| parse_modifier(m.as_str()));
                if let Some(modifier) = modifier {
                    case.push_modifier(Modifier::new(modifier));
                }
                // `it.todo('name');` has no body to scan.
                if modifier == Some(ModifierType::Todo) && depth == depth_before {
                    attach_case(case, &mut stack, &mut file);
                } else if depth == depth_before && trimmed.ends_with(");") {
                    // Single-line case: classify the inline body.
                    parse_inline_body(trimmed, line_no, classifier, &mut case);
                    attach_case(case, &mut stack, &mut file);
                } else {
                    stack.push(Frame::Case(case, depth_before, line_no));
                }
                continue;
            }

            if let Some(caps) = HOOK_RE.captures(trimmed) {
                let hook_type = match &caps["hook"] {
                    "beforeEach" => HookType::BeforeEach,
                    "beforeAll" | "before" => HookType::BeforeAll,
                    "afterEach" => HookType::AfterEach,
                    _ => HookType::AfterAll,
                };
                let mut hook = Hook::new(hook_type);
                hook.meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
                stack.push(Frame::Hook(hook, depth_before, line_no));
                continue;
            }

            match classifier.context_line(trimmed, line_no) {
                Some(ContextEntry::Mock(mock)) => attach_mock(mock, &mut stack, &mut file),
                Some(ContextEntry::Raw(raw)) => attach_raw(raw, line_no, &mut stack, &mut file),
                None => {
                    if let Some(caps) = SHARED_VAR_RE.captures(trimmed) {
                        let mut shared = SharedVariable::new(&caps["name"], caps["init"].trim());
                        shared.meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
                        attach_shared(shared, &mut stack, &mut file);
                    } else {
                        attach_raw(
                            RawCode::passthrough(trimmed),
                            line_no,
                            &mut stack,
                            &mut file,
                        );
                    }
                }
            }
            continue;
        }

        // Inside a case or hook body.
        let item = classifier.case_line(trimmed, line_no).unwrap_or_else(|| {
            let mut raw = RawCode::passthrough(trimmed);
            raw.meta.location = Some(crate::ir::SourceLocation::line(line_no));
            CaseItem::RawCode(raw)
        });
        attach_case_item(item, &mut stack);
    }

    if let Some(frame) = stack.last() {
        return Err(ParseFailure::at_line(
            "unclosed block at end of file",
            frame.open_line(),
        ));
    }
    Ok(file)
}

fn parse_modifier(suffix: &str) -> Option<ModifierType> {
    match suffix {
        ".only" => Some(ModifierType::Only),
        ".skip" => Some(ModifierType::Skip),
        ".todo" => Some(ModifierType::Todo),
        _ => None,
    }
}

/// Split `test.each` rows on top-level `], [` boundaries.
fn split_rows(rows: &str) -> Vec<String> {
    let rows = rows.trim();
    if rows.is_empty() {
        return Vec::new();
    }
    if !rows.starts_with('[') {
        return rows.split(',').map(|r| r.trim().to_string()).collect();
    }
    rows.split("],")
        .map(|part| {
            let part = part.trim();
            let mut row = part.to_string();
            if !row.ends_with(']') {
                row.push(']');
            }
            row
        })
        .collect()
}

fn parse_inline_body(
    trimmed: &str,
    line_no: usize,
    classifier: &dyn LineClassifier,
    case: &mut TestCase,
) {
    let Some(open) = trimmed.find('{') else {
        return;
    };
    let Some(close) = trimmed.rfind('}') else {
        return;
    };
    if close <= open {
        return;
    }
    for statement in trimmed[open + 1..close].split(';') {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        let full = format!("{statement};");
        let item = classifier.case_line(&full, line_no).unwrap_or_else(|| {
            CaseItem::RawCode(RawCode::passthrough(full.as_str()))
        });
        case.body.push(item);
    }
}

// ============================================================
// Attachment helpers
// ============================================================

fn attach_frame(frame: Frame, stack: &mut [Frame], file: &mut TestFile) {
    match frame {
        Frame::Suite(suite, ..) => match innermost_suite(stack) {
            Some(parent) => parent.items.push(SuiteItem::TestSuite(suite)),
            None => file.body.push(FileItem::TestSuite(suite)),
        },
        Frame::Case(case, ..) => match innermost_suite(stack) {
            Some(parent) => parent.items.push(SuiteItem::TestCase(case)),
            None => file.body.push(FileItem::TestCase(case)),
        },
        Frame::Hook(hook, ..) => match innermost_suite(stack) {
            Some(parent) => parent.hooks.push(hook),
            // Top-level hook with no suite: keep its opener as raw code.
            None => file
                .body
                .push(FileItem::RawCode(RawCode::passthrough(
                    hook.meta.original_source.clone(),
                ))),
        },
    }
}

fn innermost_suite(stack: &mut [Frame]) -> Option<&mut TestSuite> {
    stack.iter_mut().rev().find_map(|frame| match frame {
        Frame::Suite(suite, ..) => Some(suite),
        _ => None,
    })
}

fn attach_case(case: TestCase, stack: &mut [Frame], file: &mut TestFile) {
    match innermost_suite(stack) {
        Some(parent) => parent.items.push(SuiteItem::TestCase(case)),
        None => file.body.push(FileItem::TestCase(case)),
    }
}

fn attach_case_item(item: CaseItem, stack: &mut [Frame]) {
    for frame in stack.iter_mut().rev() {
        match frame {
            Frame::Case(case, ..) => {
                case.body.push(item);
                return;
            }
            Frame::Hook(hook, ..) => {
                hook.body.push(item);
                return;
            }
            Frame::Suite(..) => {}
        }
    }
}

fn attach_comment(comment: Comment, stack: &mut [Frame], file: &mut TestFile) {
    for frame in stack.iter_mut().rev() {
        match frame {
            Frame::Case(case, ..) => {
                case.body.push(CaseItem::Comment(comment));
                return;
            }
            Frame::Hook(hook, ..) => {
                hook.body.push(CaseItem::Comment(comment));
                return;
            }
            Frame::Suite(suite, ..) => {
                suite.items.push(SuiteItem::Comment(comment));
                return;
            }
        }
    }
    file.body.push(FileItem::Comment(comment));
}

fn attach_mock(mock: crate::ir::MockCall, stack: &mut [Frame], file: &mut TestFile) {
    for frame in stack.iter_mut().rev() {
        match frame {
            Frame::Case(case, ..) => {
                case.body.push(CaseItem::MockCall(mock));
                return;
            }
            Frame::Hook(hook, ..) => {
                hook.body.push(CaseItem::MockCall(mock));
                return;
            }
            Frame::Suite(suite, ..) => {
                suite.items.push(SuiteItem::MockCall(mock));
                return;
            }
        }
    }
    file.body.push(FileItem::MockCall(mock));
}

fn attach_shared(shared: SharedVariable, stack: &mut [Frame], file: &mut TestFile) {
    match innermost_suite(stack) {
        Some(parent) => parent.items.push(SuiteItem::SharedVariable(shared)),
        None => file.body.push(FileItem::SharedVariable(shared)),
    }
}

fn attach_raw(mut raw: RawCode, line_no: usize, stack: &mut [Frame], file: &mut TestFile) {
    if raw.meta.location.is_none() {
        raw.meta.location = Some(crate::ir::SourceLocation::line(line_no));
    }
    for frame in stack.iter_mut().rev() {
        match frame {
            Frame::Case(case, ..) => {
                case.body.push(CaseItem::RawCode(raw));
                return;
            }
            Frame::Hook(hook, ..) => {
                hook.body.push(CaseItem::RawCode(raw));
                return;
            }
            Frame::Suite(suite, ..) => {
                suite.items.push(SuiteItem::RawCode(raw));
                return;
            }
        }
    }
    file.body.push(FileItem::RawCode(raw));
}
