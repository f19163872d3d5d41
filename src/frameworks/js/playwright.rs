//! Playwright plugin.
//!
//! The primary Cypress target: the baseline carries `cy.*` command chains
//! onto `page` locators line by line, comments out whatever it cannot
//! place, and injects the `@playwright/test` import. The parser reads
//! Playwright sources for the reverse direction.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::{ContextEntry, LineClassifier, code_only, parse_bdd, parse_expect_line};
use crate::error::ParseFailure;
use crate::ir::{
    Assertion, AssertionKind, CaseItem, MockCall, MockKind, Navigation, NavigationAction,
    NodeMeta, TestFile,
};
use crate::markers::{CommentStyle, todo_marker};
use crate::registry::{FrameworkPlugin, ImportTable, Paradigm};

pub struct PlaywrightPlugin {
    imports: ImportTable,
}

impl PlaywrightPlugin {
    pub fn new() -> Self {
        Self {
            imports: ImportTable {
                modules: vec!["@playwright/test", "playwright"],
                replacements: BTreeMap::from([("cypress", "@playwright/test")]),
            },
        }
    }
}

impl Default for PlaywrightPlugin {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================
// Parsing (Playwright as a source)
// ============================================================

static GOTO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^await\s+page\.goto\(\s*['"](?<url>[^'"]*)['"]\s*\)\s*;?\s*$"#)
        .expect("goto regex")
});
static PAGE_EXPECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^await\s+expect\(\s*page\.locator\(\s*['"](?<sel>[^'"]+)['"]\s*\)\s*\)(?<not>\.not)?\.(?<matcher>\w+)\((?<args>.*)\)\s*;?\s*$"#,
    )
    .expect("page expect regex")
});
static PAGE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^await\s+expect\(page\)(?<not>\.not)?\.(?<matcher>toHaveURL|toHaveTitle)\((?<arg>.*)\)\s*;?\s*$")
        .expect("page url regex")
});
static ROUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^await\s+page\.route\(\s*(?<args>.*?)\s*\)\s*;?\s*$").expect("route regex")
});

fn locator_matcher_kind(matcher: &str) -> Option<AssertionKind> {
    Some(match matcher {
        "toBeVisible" => AssertionKind::BeVisible,
        "toBeChecked" => AssertionKind::BeChecked,
        "toBeDisabled" => AssertionKind::BeDisabled,
        "toBeEnabled" => AssertionKind::BeEnabled,
        "toBeEmpty" => AssertionKind::BeEmpty,
        "toBeFocused" => AssertionKind::BeFocused,
        "toHaveText" => AssertionKind::HaveText,
        "toHaveValue" => AssertionKind::HaveValue,
        "toHaveClass" => AssertionKind::HaveClass,
        "toHaveAttribute" => AssertionKind::HaveAttr,
        "toHaveCount" => AssertionKind::HaveLength,
        "toContainText" => AssertionKind::Contains,
        _ => return None,
    })
}

impl LineClassifier for PlaywrightPlugin {
    fn case_line(&self, trimmed: &str, line_no: usize) -> Option<CaseItem> {
        let meta = || NodeMeta::new().with_line(line_no).with_source(trimmed);

        if let Some(caps) = GOTO_RE.captures(trimmed) {
            let mut navigation = Navigation::new(NavigationAction::Visit).with_url(&caps["url"]);
            navigation.meta = meta();
            return Some(CaseItem::Navigation(navigation));
        }
        match trimmed {
            "await page.goBack();" => {
                let mut navigation = Navigation::new(NavigationAction::GoBack);
                navigation.meta = meta();
                return Some(CaseItem::Navigation(navigation));
            }
            "await page.goForward();" => {
                let mut navigation = Navigation::new(NavigationAction::GoForward);
                navigation.meta = meta();
                return Some(CaseItem::Navigation(navigation));
            }
            "await page.reload();" => {
                let mut navigation = Navigation::new(NavigationAction::Reload);
                navigation.meta = meta();
                return Some(CaseItem::Navigation(navigation));
            }
            _ => {}
        }

        if let Some(caps) = PAGE_EXPECT_RE.captures(trimmed) {
            let kind = match locator_matcher_kind(&caps["matcher"]) {
                Some(kind) => kind,
                None => AssertionKind::Other(caps["matcher"].to_string()),
            };
            let mut assertion = Assertion::new(kind, &caps["sel"]);
            if caps.name("not").is_some() {
                assertion = assertion.negated();
            }
            let args = caps["args"].trim();
            if !args.is_empty() {
                assertion = assertion.with_expected(args);
            }
            let confidence = assertion.meta.confidence;
            assertion.meta = meta().with_confidence(confidence);
            return Some(CaseItem::Assertion(assertion));
        }

        if let Some(caps) = PAGE_URL_RE.captures(trimmed) {
            let arg = caps["arg"].trim().to_string();
            let kind = match &caps["matcher"] {
                "toHaveTitle" => AssertionKind::TitleEqual,
                _ if arg.starts_with("new RegExp(") || arg.starts_with('/') => {
                    AssertionKind::UrlInclude
                }
                _ => AssertionKind::UrlEqual,
            };
            let mut assertion = Assertion::new(kind, "page").with_expected(arg);
            if caps.name("not").is_some() {
                assertion = assertion.negated();
            }
            let confidence = assertion.meta.confidence;
            assertion.meta = meta().with_confidence(confidence);
            return Some(CaseItem::Assertion(assertion));
        }

        if trimmed.contains("page.clock.install") {
            let mut mock = MockCall::new(MockKind::FakeTimers);
            mock.meta = meta();
            return Some(CaseItem::MockCall(mock));
        }
        if let Some(caps) = ROUTE_RE.captures(trimmed) {
            let mut mock =
                MockCall::new(MockKind::NetworkIntercept).with_target(caps["args"].trim());
            mock.meta = meta();
            return Some(CaseItem::MockCall(mock));
        }

        parse_expect_line(trimmed, line_no)
            .map(CaseItem::Assertion)
    }

    fn context_line(&self, _trimmed: &str, _line_no: usize) -> Option<ContextEntry> {
        None
    }
}

// ============================================================
// Emission (Cypress sources onto Playwright)
// ============================================================

static IT_HEAD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?:it|specify)(?<mod>\.only|\.skip)?\(\s*(?<name>['"`][^'"`]*['"`])\s*,\s*(?:async\s*)?(?:\(\s*\)|function\s*\(\s*\))\s*(?:=>)?\s*\{"#,
    )
    .expect("it head regex")
});
static IT_TODO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^it\.todo\(\s*(?<name>['"`][^'"`]*['"`])\s*\)\s*;?\s*$"#)
        .expect("it todo regex")
});
static DESCRIBE_HEAD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:describe|context)(?<mod>\.only|\.skip)?\(").expect("describe head regex")
});
static CY_VISIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^cy\.visit\(\s*(?<url>['"][^'"]*['"])\s*\)\s*;?\s*$"#).expect("cy visit regex")
});
static CY_SHOULD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^cy\.get\(\s*'(?<sel>[^']+)'\s*\)\.should\(\s*'(?<chainer>[^']+)'\s*(?:,\s*(?<args>.+?))?\)\s*;?\s*$"#,
    )
    .expect("cy should regex")
});
static CY_ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^cy\.get\(\s*'(?<sel>[^']+)'\s*\)\.(?<action>click|dblclick|type|clear|check|uncheck|select|focus|blur)\((?<args>.*)\)\s*;?\s*$"#,
    )
    .expect("cy action regex")
});
static CY_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^cy\.url\(\)\.should\(\s*'(?<chainer>[^']+)'\s*,\s*(?<arg>.+?)\)\s*;?\s*$"#)
        .expect("cy url regex")
});
static CY_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^cy\.title\(\)\.should\(\s*'(?<chainer>[^']+)'\s*,\s*(?<arg>.+?)\)\s*;?\s*$"#)
        .expect("cy title regex")
});
static CY_CONTAINS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^cy\.contains\(\s*(?<text>['"][^'"]*['"])\s*\)\s*;?\s*$"#)
        .expect("cy contains regex")
});

/// `should` chainer → locator matcher call.
fn chainer_to_matcher(chainer: &str, args: Option<&str>) -> Option<String> {
    let (chainer, not) = match chainer.strip_prefix("not.") {
        Some(rest) => (rest, ".not"),
        None => (chainer, ""),
    };
    let call = match chainer {
        "be.visible" => "toBeVisible()".to_string(),
        "be.checked" => "toBeChecked()".to_string(),
        "be.disabled" => "toBeDisabled()".to_string(),
        "be.enabled" => "toBeEnabled()".to_string(),
        "be.empty" => "toBeEmpty()".to_string(),
        "be.focused" => "toBeFocused()".to_string(),
        "exist" => "toBeVisible()".to_string(),
        "have.text" => format!("toHaveText({})", args?),
        "have.value" => format!("toHaveValue({})", args?),
        "have.class" => format!("toHaveClass({})", args?),
        "have.attr" => format!("toHaveAttribute({})", args?),
        "have.length" => format!("toHaveCount({})", args?),
        "contain" | "include" => format!("toContainText({})", args?),
        _ => return None,
    };
    Some(format!("{not}.{call}"))
}

fn convert_cy_line(trimmed: &str) -> Option<String> {
    if let Some(caps) = IT_TODO_RE.captures(trimmed) {
        return Some(format!(
            "test.fixme({}, async ({{ page }}) => {{}});",
            &caps["name"]
        ));
    }
    if let Some(caps) = IT_HEAD_RE.captures(trimmed) {
        let suffix = caps.name("mod").map(|m| m.as_str()).unwrap_or("");
        return Some(format!(
            "test{suffix}({}, async ({{ page }}) => {{",
            &caps["name"]
        ));
    }
    if DESCRIBE_HEAD_RE.is_match(trimmed) {
        let rewritten = match trimmed.strip_prefix("context") {
            Some(rest) => format!("describe{rest}"),
            None => trimmed.to_string(),
        };
        return Some(format!("test.{rewritten}"));
    }
    if trimmed.starts_with("beforeEach(") {
        return Some("test.beforeEach(async ({ page }) => {".to_string());
    }
    if trimmed.starts_with("afterEach(") {
        return Some("test.afterEach(async ({ page }) => {".to_string());
    }
    if trimmed.starts_with("before(") {
        return Some("test.beforeAll(async () => {".to_string());
    }
    if trimmed.starts_with("after(") {
        return Some("test.afterAll(async () => {".to_string());
    }

    if let Some(caps) = CY_VISIT_RE.captures(trimmed) {
        return Some(format!("await page.goto({});", &caps["url"]));
    }
    match trimmed {
        "cy.reload();" => return Some("await page.reload();".to_string()),
        "cy.go('back');" | "cy.go(-1);" => return Some("await page.goBack();".to_string()),
        "cy.go('forward');" | "cy.go(1);" => return Some("await page.goForward();".to_string()),
        "cy.clock();" => return Some("await page.clock.install();".to_string()),
        _ => {}
    }

    if let Some(caps) = CY_SHOULD_RE.captures(trimmed) {
        let matcher =
            chainer_to_matcher(&caps["chainer"], caps.name("args").map(|m| m.as_str().trim()))?;
        return Some(format!(
            "await expect(page.locator('{}')){};",
            &caps["sel"], matcher
        ));
    }
    if let Some(caps) = CY_ACTION_RE.captures(trimmed) {
        let action = match &caps["action"] {
            "type" => "fill",
            "select" => "selectOption",
            other => other,
        };
        return Some(format!(
            "await page.locator('{}').{}({});",
            &caps["sel"], action, &caps["args"]
        ));
    }
    if let Some(caps) = CY_URL_RE.captures(trimmed) {
        let arg = caps["arg"].trim();
        return match &caps["chainer"] {
            "include" | "contain" => Some(format!(
                "await expect(page).toHaveURL(new RegExp({arg}));"
            )),
            "eq" | "equal" => Some(format!("await expect(page).toHaveURL({arg});")),
            _ => None,
        };
    }
    if let Some(caps) = CY_TITLE_RE.captures(trimmed) {
        let arg = caps["arg"].trim();
        return match &caps["chainer"] {
            "eq" | "equal" => Some(format!("await expect(page).toHaveTitle({arg});")),
            _ => None,
        };
    }
    if let Some(caps) = CY_CONTAINS_RE.captures(trimmed) {
        return Some(format!(
            "await expect(page.getByText({})).toBeVisible();",
            &caps["text"]
        ));
    }
    None
}

impl FrameworkPlugin for PlaywrightPlugin {
    fn name(&self) -> &str {
        "playwright"
    }

    fn language(&self) -> &str {
        "javascript"
    }

    fn paradigm(&self) -> Paradigm {
        Paradigm::Bdd
    }

    fn detect(&self, src: &str) -> u8 {
        let mut score = 0u32;
        if src.contains("@playwright/test") {
            score += 50;
        }
        if src.contains("page.") {
            score += 20;
        }
        if src.contains("test(") || src.contains("test.describe(") {
            score += 15;
        }
        if src.contains("await expect(") {
            score += 15;
        }
        if src.contains("cy.") {
            score = 0;
        }
        score.min(100) as u8
    }

    fn parse(&self, src: &str) -> Result<TestFile, ParseFailure> {
        parse_bdd(src, "javascript", self)
    }

    /// Regex baseline for Playwright as a *target* (Cypress sources).
    fn emit(&self, _ir: &TestFile, src: &str) -> String {
        let mut lines: Vec<String> = Vec::new();
        let mut todo_id = 0usize;
        for line in src.lines() {
            let indent_len = line.len() - line.trim_start().len();
            let indent = &line[..indent_len];
            let trimmed = line.trim();

            if trimmed.starts_with("import") && trimmed.contains("cypress") {
                continue;
            }
            if trimmed.starts_with("/// <reference") {
                continue;
            }

            match convert_cy_line(trimmed) {
                Some(converted) => lines.push(format!("{indent}{converted}")),
                None => {
                    // String contents do not count as residue.
                    if code_only(trimmed).contains("cy.") && !trimmed.starts_with("//") {
                        todo_id += 1;
                        let marker = todo_marker(
                            CommentStyle::Slashes,
                            todo_id,
                            "cypress command has no automatic playwright equivalent",
                            trimmed,
                            "rewrite with the page API",
                        );
                        for marker_line in marker.lines() {
                            lines.push(format!("{indent}{marker_line}"));
                        }
                    } else {
                        lines.push(line.to_string());
                    }
                }
            }
        }

        let body = lines.join("\n");
        let mut output = String::new();
        if !body.contains("@playwright/test") {
            output.push_str("import { test, expect } from '@playwright/test';\n\n");
        }
        output.push_str(&body);
        output.push('\n');
        output
    }

    fn imports(&self) -> &ImportTable {
        &self.imports
    }
}
