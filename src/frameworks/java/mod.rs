//! Shared scanning for the JUnit plugins.
//!
//! Both JUnit generations share the same class shape; only annotation
//! names and assertion holders differ. `parse_junit` owns the structural
//! scan and takes the generation's annotation names as data.

pub mod junit4;
pub mod junit5;

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ParseFailure;
use crate::ir::{
    Assertion, AssertionKind, CaseItem, Comment, FileItem, Hook, HookType, ImportBindings,
    ImportStatement, Modifier, ModifierType, NodeMeta, RawCode, SuiteItem, TestCase, TestFile,
    TestSuite,
};

static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:public\s+)?class\s+(?<name>\w+)").expect("class regex")
});
static METHOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:public\s+|protected\s+|private\s+)?(?:static\s+)?void\s+(?<name>\w+)\s*\(\s*\)\s*(?:throws\s+[\w.,\s]+)?\{?\s*$",
    )
    .expect("method regex")
});
static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^import\s+(?<static>static\s+)?(?<path>[\w.]+(?:\.\*)?)\s*;\s*$")
        .expect("import regex")
});
static ASSERT_CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:Assert\.|Assertions\.)?(?<method>assert\w+)\((?<args>.*)\)\s*;\s*$")
        .expect("assert call regex")
});

/// Annotation names that differ between the two generations.
pub(crate) struct JunitNames {
    pub test: &'static str,
    pub before_each: &'static str,
    pub after_each: &'static str,
    pub before_all: &'static str,
    pub after_all: &'static str,
    pub ignore: &'static str,
}

pub(crate) const JUNIT4_NAMES: JunitNames = JunitNames {
    test: "Test",
    before_each: "Before",
    after_each: "After",
    before_all: "BeforeClass",
    after_all: "AfterClass",
    ignore: "Ignore",
};

pub(crate) const JUNIT5_NAMES: JunitNames = JunitNames {
    test: "Test",
    before_each: "BeforeEach",
    after_each: "AfterEach",
    before_all: "BeforeAll",
    after_all: "AfterAll",
    ignore: "Disabled",
};

/// Net brace balance with Java string/char literals and `//` comments
/// stripped.
pub(crate) fn net_braces_java(line: &str) -> i32 {
    let mut net = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => quote = Some(c),
                '/' if chars.peek() == Some(&'/') => break,
                '{' => net += 1,
                '}' => net -= 1,
                _ => {}
            },
        }
    }
    net
}

/// Split call arguments on top-level commas.
pub(crate) fn split_java_args(args: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut current = String::new();
    for c in args.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => {
                    quote = Some(c);
                    current.push(c);
                }
                '(' | '{' | '[' => {
                    depth += 1;
                    current.push(c);
                }
                ')' | '}' | ']' => {
                    depth -= 1;
                    current.push(c);
                }
                ',' if depth == 0 => {
                    parts.push(current.trim().to_string());
                    current.clear();
                }
                _ => current.push(c),
            },
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// Map an `assert*` call onto the vocabulary. JUnit puts the expected
/// value first and an optional message before that.
fn assert_call_to_assertion(method: &str, args: &str) -> Option<Assertion> {
    let parts = split_java_args(args);
    let two_value = |negated: bool, kind: AssertionKind| {
        let (expected, actual) = match parts.len() {
            0 | 1 => (None, parts.first().cloned().unwrap_or_default()),
            2 => (Some(parts[0].clone()), parts[1].clone()),
            _ => (Some(parts[1].clone()), parts[2].clone()),
        };
        let mut a = Assertion::new(kind, actual);
        if let Some(expected) = expected {
            a = a.with_expected(expected);
        }
        if negated {
            a = a.negated();
        }
        a
    };
    let single_value = |negated: bool, kind: AssertionKind| {
        // A leading message argument is informational only.
        let value = parts.last().cloned().unwrap_or_default();
        let mut a = Assertion::new(kind, value);
        if negated {
            a = a.negated();
        }
        a
    };

    let assertion = match method {
        "assertEquals" | "assertArrayEquals" | "assertIterableEquals" => {
            two_value(false, AssertionKind::Equal)
        }
        "assertNotEquals" => two_value(true, AssertionKind::Equal),
        "assertSame" => two_value(false, AssertionKind::StrictEqual),
        "assertNotSame" => two_value(true, AssertionKind::StrictEqual),
        "assertTrue" => single_value(false, AssertionKind::Truthy),
        "assertFalse" => single_value(false, AssertionKind::Falsy),
        "assertNull" => single_value(false, AssertionKind::IsNull),
        "assertNotNull" => single_value(true, AssertionKind::IsNull),
        "assertThrows" => {
            let mut a = Assertion::new(
                AssertionKind::Throws,
                parts.first().cloned().unwrap_or_default(),
            );
            if let Some(body) = parts.get(1) {
                a = a.with_expected(body.clone());
            }
            a
        }
        other => Assertion::new(AssertionKind::Other(other.to_string()), args),
    };
    Some(assertion)
}

/// Structural scan shared by both JUnit plugins.
pub(crate) fn parse_junit(
    src: &str,
    names: &JunitNames,
) -> Result<TestFile, ParseFailure> {
    let mut file = TestFile::new("java");
    let mut suite: Option<TestSuite> = None;
    let mut case: Option<TestCase> = None;
    let mut hook: Option<Hook> = None;
    let mut depth: i32 = 0;
    let mut member_open_depth: i32 = 0;
    let mut pending: Vec<String> = Vec::new();

    for (index, line) in src.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let depth_before = depth;
        depth += net_braces_java(line);

        if trimmed == "}" {
            if (case.is_some() || hook.is_some()) && depth <= member_open_depth {
                if let Some(done) = case.take() {
                    match suite.as_mut() {
                        Some(s) => s.items.push(SuiteItem::TestCase(done)),
                        None => file.body.push(FileItem::TestCase(done)),
                    }
                }
                if let Some(done) = hook.take()
                    && let Some(s) = suite.as_mut()
                {
                    s.hooks.push(done);
                }
            } else if suite.is_some() && depth == 0 {
                file.body
                    .push(FileItem::TestSuite(suite.take().expect("suite open")));
            } else if let Some(c) = case.as_mut() {
                c.body.push(CaseItem::RawCode(RawCode::passthrough(trimmed)));
            } else if let Some(h) = hook.as_mut() {
                h.body.push(CaseItem::RawCode(RawCode::passthrough(trimmed)));
            }
            continue;
        }

        if trimmed.starts_with("//") {
            let mut comment = Comment::new(trimmed.trim_start_matches('/').trim());
            comment.meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
            if let Some(c) = case.as_mut() {
                c.body.push(CaseItem::Comment(comment));
            } else if let Some(h) = hook.as_mut() {
                h.body.push(CaseItem::Comment(comment));
            } else if let Some(s) = suite.as_mut() {
                s.items.push(SuiteItem::Comment(comment));
            } else {
                file.body.push(FileItem::Comment(comment));
            }
            continue;
        }

        if case.is_none() && hook.is_none() {
            if suite.is_none()
                && let Some(caps) = IMPORT_RE.captures(trimmed)
            {
                let path = caps["path"].to_string();
                let bindings = match caps.name("static") {
                    Some(_) => ImportBindings {
                        named: vec![path
                            .rsplit('.')
                            .next()
                            .unwrap_or_default()
                            .to_string()],
                        ..Default::default()
                    },
                    None => ImportBindings::default(),
                };
                let mut import = ImportStatement::new(path).with_bindings(bindings);
                import.meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
                file.imports.push(import);
                continue;
            }

            if trimmed.starts_with('@') {
                pending.push(trimmed.to_string());
                continue;
            }

            if suite.is_none()
                && let Some(caps) = CLASS_RE.captures(trimmed)
            {
                let mut new_suite = TestSuite::new(&caps["name"]);
                new_suite.meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
                if pending.iter().any(|a| annotation_is(a, names.ignore)) {
                    new_suite.push_modifier(Modifier::new(ModifierType::Skip));
                }
                pending.clear();
                suite = Some(new_suite);
                continue;
            }

            if let Some(caps) = METHOD_RE.captures(trimmed) {
                let name = caps["name"].to_string();
                let is_test = pending.iter().any(|a| annotation_is(a, names.test));
                let hook_type = pending.iter().find_map(|a| {
                    if annotation_is(a, names.before_each) {
                        Some(HookType::BeforeEach)
                    } else if annotation_is(a, names.after_each) {
                        Some(HookType::AfterEach)
                    } else if annotation_is(a, names.before_all) {
                        Some(HookType::BeforeAll)
                    } else if annotation_is(a, names.after_all) {
                        Some(HookType::AfterAll)
                    } else {
                        None
                    }
                });

                if let Some(hook_type) = hook_type {
                    let mut new_hook = Hook::new(hook_type);
                    new_hook.meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
                    pending.clear();
                    hook = Some(new_hook);
                    member_open_depth = depth_before;
                    continue;
                }
                if is_test {
                    let mut new_case = TestCase::new(&name);
                    new_case.meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
                    if pending.iter().any(|a| annotation_is(a, names.ignore)) {
                        new_case.push_modifier(Modifier::new(ModifierType::Skip));
                    }
                    // `@Test(expected = ...)` carries an implicit throws
                    // assertion that needs a manual port.
                    if let Some(expected_exc) =
                        pending.iter().find_map(|a| expected_exception(a))
                    {
                        let mut assertion =
                            Assertion::new(AssertionKind::Throws, expected_exc);
                        assertion.meta = NodeMeta::new()
                            .with_line(line_no)
                            .with_source(trimmed)
                            .with_confidence(crate::ir::Confidence::Warning);
                        new_case.body.push(CaseItem::Assertion(assertion));
                    }
                    pending.clear();
                    case = Some(new_case);
                    member_open_depth = depth_before;
                    continue;
                }
            }

            // Fields, helper methods, stray statements.
            for annotation in pending.drain(..) {
                attach_java_raw(&mut suite, &mut file, RawCode::passthrough(annotation));
            }
            attach_java_raw(&mut suite, &mut file, RawCode::passthrough(trimmed));
            continue;
        }

        // Inside a test method or fixture body.
        let item = match ASSERT_CALL_RE.captures(trimmed) {
            Some(caps) => match assert_call_to_assertion(&caps["method"], &caps["args"]) {
                Some(mut assertion) => {
                    let confidence = assertion.meta.confidence;
                    assertion.meta = NodeMeta::new()
                        .with_line(line_no)
                        .with_source(trimmed)
                        .with_confidence(confidence);
                    CaseItem::Assertion(assertion)
                }
                None => CaseItem::RawCode(RawCode::passthrough(trimmed)),
            },
            None => {
                let mut raw = RawCode::passthrough(trimmed);
                raw.meta.location = Some(crate::ir::SourceLocation::line(line_no));
                CaseItem::RawCode(raw)
            }
        };
        if let Some(c) = case.as_mut() {
            c.body.push(item);
        } else if let Some(h) = hook.as_mut() {
            h.body.push(item);
        }
    }

    if case.is_some() || hook.is_some() {
        return Err(ParseFailure::new("unclosed test method at end of file"));
    }
    if let Some(done) = suite.take() {
        file.body.push(FileItem::TestSuite(done));
    }
    Ok(file)
}

fn annotation_is(annotation: &str, name: &str) -> bool {
    let rest = match annotation.strip_prefix('@') {
        Some(rest) => rest,
        None => return false,
    };
    rest == name
        || rest.starts_with(&format!("{name}("))
        || rest.starts_with(&format!("{name} "))
}

fn expected_exception(annotation: &str) -> Option<String> {
    static EXPECTED_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^@Test\s*\(\s*expected\s*=\s*(?<exc>[\w.]+\.class)\s*\)")
            .expect("expected regex")
    });
    EXPECTED_RE
        .captures(annotation)
        .map(|caps| caps["exc"].to_string())
}

fn attach_java_raw(suite: &mut Option<TestSuite>, file: &mut TestFile, raw: RawCode) {
    match suite.as_mut() {
        Some(s) => s.items.push(SuiteItem::RawCode(raw)),
        None => file.body.push(FileItem::RawCode(raw)),
    }
}

/// Apply ordered literal replacements to one line.
pub(crate) fn replace_pairs(line: &str, pairs: &[(&str, &str)]) -> String {
    let mut out = line.to_string();
    for (from, to) in pairs {
        out = out.replace(from, to);
    }
    out
}
