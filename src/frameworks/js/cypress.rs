//! Cypress plugin.
//!
//! Parses `cy.*` command chains into navigation, assertion, and mock
//! nodes; the `should` chainer strings map straight onto the assertion
//! vocabulary. As an emission target it renders Playwright sources back
//! onto the `cy` surface.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::{ContextEntry, LineClassifier, code_only, parse_bdd};
use crate::error::ParseFailure;
use crate::ir::{
    Assertion, AssertionKind, CaseItem, MockCall, MockKind, Navigation, NavigationAction,
    NodeMeta, TestFile,
};
use crate::markers::{CommentStyle, todo_marker};
use crate::registry::{FrameworkPlugin, ImportTable, Paradigm};

static VISIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^cy\.visit\(\s*['"](?<url>[^'"]*)['"]\s*\)\s*;?\s*$"#).expect("visit regex")
});
static GO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^cy\.go\(\s*(?<dir>['"]back['"]|['"]forward['"]|-1|1)\s*\)\s*;?\s*$"#)
        .expect("go regex")
});
static RELOAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^cy\.reload\(\s*\)\s*;?\s*$").expect("reload regex"));
static SHOULD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^cy\.get\(\s*['"](?<sel>[^'"]+)['"]\s*\)\.should\(\s*['"](?<chainer>[^'"]+)['"]\s*(?:,\s*(?<args>.+?))?\)\s*;?\s*$"#,
    )
    .expect("should regex")
});
static URL_SHOULD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^cy\.url\(\)\.should\(\s*['"](?<chainer>[^'"]+)['"]\s*,\s*(?<arg>.+?)\)\s*;?\s*$"#,
    )
    .expect("url regex")
});
static TITLE_SHOULD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^cy\.title\(\)\.should\(\s*['"](?<chainer>[^'"]+)['"]\s*,\s*(?<arg>.+?)\)\s*;?\s*$"#,
    )
    .expect("title regex")
});
static INTERCEPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^cy\.intercept\(\s*(?<args>.*?)\s*\)\s*;?\s*$").expect("intercept regex")
});
static CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^cy\.clock\(").expect("clock regex"));
static STUB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:const|let|var)\s+(?<target>\w+)\s*=\s*)?cy\.stub\(").expect("stub regex")
});
static SPY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^cy\.spy\(\s*(?<target>.*?)\s*\)\s*;?\s*$").expect("spy regex")
});

pub struct CypressPlugin {
    imports: ImportTable,
}

impl CypressPlugin {
    pub fn new() -> Self {
        Self {
            imports: ImportTable {
                modules: vec!["cypress"],
                replacements: BTreeMap::from([("@playwright/test", "cypress")]),
            },
        }
    }
}

impl Default for CypressPlugin {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a `should` chainer onto the assertion vocabulary.
/// Returns the kind and whether negation was requested.
fn chainer_kind(chainer: &str) -> (AssertionKind, bool) {
    let (chainer, negated) = match chainer.strip_prefix("not.") {
        Some(rest) => (rest, true),
        None => (chainer, false),
    };
    let kind = match chainer {
        "eq" | "equal" => AssertionKind::Equal,
        "contain" | "include" => AssertionKind::Contains,
        "be.true" => AssertionKind::Truthy,
        "be.false" => AssertionKind::Falsy,
        "be.null" => AssertionKind::IsNull,
        "exist" => AssertionKind::IsDefined,
        other => AssertionKind::parse(other),
    };
    (kind, negated)
}

impl CypressPlugin {
    fn parse_assertion(&self, trimmed: &str, line_no: usize) -> Option<Assertion> {
        let meta = || NodeMeta::new().with_line(line_no).with_source(trimmed);

        if let Some(caps) = SHOULD_RE.captures(trimmed) {
            let (kind, negated) = chainer_kind(&caps["chainer"]);
            let mut assertion = Assertion::new(kind, &caps["sel"]);
            if negated {
                assertion = assertion.negated();
            }
            if let Some(args) = caps.name("args") {
                assertion = assertion.with_expected(args.as_str().trim());
            }
            let confidence = assertion.meta.confidence;
            assertion.meta = meta().with_confidence(confidence);
            return Some(assertion);
        }

        if let Some(caps) = URL_SHOULD_RE.captures(trimmed) {
            let kind = match &caps["chainer"] {
                "include" | "contain" => AssertionKind::UrlInclude,
                "eq" | "equal" => AssertionKind::UrlEqual,
                other => AssertionKind::Other(format!("url.{other}")),
            };
            let mut assertion =
                Assertion::new(kind, "page").with_expected(caps["arg"].trim());
            let confidence = assertion.meta.confidence;
            assertion.meta = meta().with_confidence(confidence);
            return Some(assertion);
        }

        if let Some(caps) = TITLE_SHOULD_RE.captures(trimmed) {
            let kind = match &caps["chainer"] {
                "eq" | "equal" => AssertionKind::TitleEqual,
                other => AssertionKind::Other(format!("title.{other}")),
            };
            let mut assertion =
                Assertion::new(kind, "page").with_expected(caps["arg"].trim());
            let confidence = assertion.meta.confidence;
            assertion.meta = meta().with_confidence(confidence);
            return Some(assertion);
        }

        None
    }

    fn parse_navigation(&self, trimmed: &str, line_no: usize) -> Option<Navigation> {
        let meta = || NodeMeta::new().with_line(line_no).with_source(trimmed);
        if let Some(caps) = VISIT_RE.captures(trimmed) {
            let mut navigation =
                Navigation::new(NavigationAction::Visit).with_url(&caps["url"]);
            navigation.meta = meta();
            return Some(navigation);
        }
        if let Some(caps) = GO_RE.captures(trimmed) {
            let action = match caps["dir"].trim_matches(['\'', '"']) {
                "back" | "-1" => NavigationAction::GoBack,
                _ => NavigationAction::GoForward,
            };
            let mut navigation = Navigation::new(action);
            navigation.meta = meta();
            return Some(navigation);
        }
        if RELOAD_RE.is_match(trimmed) {
            let mut navigation = Navigation::new(NavigationAction::Reload);
            navigation.meta = meta();
            return Some(navigation);
        }
        None
    }

    fn parse_mock(&self, trimmed: &str, line_no: usize) -> Option<MockCall> {
        let meta = NodeMeta::new().with_line(line_no).with_source(trimmed);
        let mock = if let Some(caps) = INTERCEPT_RE.captures(trimmed) {
            MockCall::new(MockKind::NetworkIntercept).with_target(caps["args"].trim())
        } else if CLOCK_RE.is_match(trimmed) {
            MockCall::new(MockKind::FakeTimers)
        } else if let Some(caps) = STUB_RE.captures(trimmed) {
            match caps.name("target") {
                Some(target) => MockCall::new(MockKind::CreateMock).with_target(target.as_str()),
                None => MockCall::new(MockKind::CreateMock),
            }
        } else if let Some(caps) = SPY_RE.captures(trimmed) {
            MockCall::new(MockKind::Spy).with_target(caps["target"].trim())
        } else {
            return None;
        };
        let mut mock = mock;
        mock.meta = meta;
        Some(mock)
    }
}

impl LineClassifier for CypressPlugin {
    fn case_line(&self, trimmed: &str, line_no: usize) -> Option<CaseItem> {
        if let Some(navigation) = self.parse_navigation(trimmed, line_no) {
            return Some(CaseItem::Navigation(navigation));
        }
        if let Some(assertion) = self.parse_assertion(trimmed, line_no) {
            return Some(CaseItem::Assertion(assertion));
        }
        if let Some(mock) = self.parse_mock(trimmed, line_no) {
            return Some(CaseItem::MockCall(mock));
        }
        None
    }

    fn context_line(&self, trimmed: &str, line_no: usize) -> Option<ContextEntry> {
        self.parse_mock(trimmed, line_no).map(ContextEntry::Mock)
    }
}

impl FrameworkPlugin for CypressPlugin {
    fn name(&self) -> &str {
        "cypress"
    }

    fn language(&self) -> &str {
        "javascript"
    }

    fn paradigm(&self) -> Paradigm {
        Paradigm::Bdd
    }

    fn detect(&self, src: &str) -> u8 {
        let mut score = 0u32;
        if src.contains("cy.") {
            score += 50;
        }
        if src.contains("Cypress.") {
            score += 20;
        }
        if src.contains(".should(") {
            score += 10;
        }
        if src.contains("describe(") || src.contains("context(") {
            score += 20;
        }
        if src.contains("@playwright/test") {
            score = 0;
        }
        score.min(100) as u8
    }

    fn parse(&self, src: &str) -> Result<TestFile, ParseFailure> {
        parse_bdd(src, "javascript", self)
    }

    /// Regex baseline for Cypress as a *target* (Playwright sources).
    fn emit(&self, _ir: &TestFile, src: &str) -> String {
        static LOCATOR_ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(
                r#"^await\s+page\.locator\(\s*'(?<sel>[^']+)'\s*\)\.(?<action>click|dblclick|fill|check|uncheck|clear|selectOption)\((?<args>.*)\)\s*;?\s*$"#,
            )
            .expect("locator action regex")
        });
        static LOCATOR_EXPECT_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(
                r#"^await\s+expect\(\s*page\.locator\(\s*'(?<sel>[^']+)'\s*\)\s*\)(?<not>\.not)?\.(?<matcher>\w+)\((?<args>.*)\)\s*;?\s*$"#,
            )
            .expect("locator expect regex")
        });
        static TEST_HEAD_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r#"^test(?<mod>\.only|\.skip)?\(\s*(?<name>['"`][^'"`]*['"`])\s*,\s*async\s*\(\s*\{[^}]*\}\s*\)\s*=>\s*\{"#)
                .expect("test head regex")
        });

        let mut lines: Vec<String> = Vec::new();
        let mut todo_id = 0usize;
        for line in src.lines() {
            let indent_len = line.len() - line.trim_start().len();
            let indent = &line[..indent_len];
            let trimmed = line.trim();

            // Playwright's import has no Cypress equivalent.
            if trimmed.starts_with("import") && trimmed.contains("@playwright/test") {
                continue;
            }

            let converted = convert_playwright_line(
                trimmed,
                &TEST_HEAD_RE,
                &LOCATOR_ACTION_RE,
                &LOCATOR_EXPECT_RE,
            );
            match converted {
                Some(converted) => lines.push(format!("{indent}{converted}")),
                None => {
                    // String contents do not count as residue.
                    if code_only(trimmed).contains("page.") && !trimmed.starts_with("//") {
                        todo_id += 1;
                        let marker = todo_marker(
                            CommentStyle::Slashes,
                            todo_id,
                            "playwright page call has no direct cypress equivalent",
                            trimmed,
                            "rewrite with cy commands",
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
        let mut output = lines.join("\n");
        output.push('\n');
        output
    }

    fn imports(&self) -> &ImportTable {
        &self.imports
    }
}

fn convert_playwright_line(
    trimmed: &str,
    test_head_re: &Regex,
    locator_action_re: &Regex,
    locator_expect_re: &Regex,
) -> Option<String> {
    if let Some(caps) = test_head_re.captures(trimmed) {
        let suffix = caps.name("mod").map(|m| m.as_str()).unwrap_or("");
        return Some(format!("it{suffix}({}, () => {{", &caps["name"]));
    }
    if let Some(rest) = trimmed.strip_prefix("test.describe(") {
        return Some(format!("describe({rest}"));
    }
    if trimmed.starts_with("test.beforeEach(") {
        return Some("beforeEach(() => {".to_string());
    }
    if trimmed.starts_with("test.afterEach(") {
        return Some("afterEach(() => {".to_string());
    }
    if trimmed.starts_with("test.beforeAll(") {
        return Some("before(() => {".to_string());
    }
    if trimmed.starts_with("test.afterAll(") {
        return Some("after(() => {".to_string());
    }

    static GOTO_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"^await\s+page\.goto\(\s*'(?<url>[^']*)'\s*\)\s*;?\s*$"#)
            .expect("goto regex")
    });
    if let Some(caps) = GOTO_RE.captures(trimmed) {
        return Some(format!("cy.visit('{}');", &caps["url"]));
    }
    match trimmed {
        "await page.goBack();" => return Some("cy.go('back');".to_string()),
        "await page.goForward();" => return Some("cy.go('forward');".to_string()),
        "await page.reload();" => return Some("cy.reload();".to_string()),
        _ => {}
    }

    if let Some(caps) = locator_action_re.captures(trimmed) {
        let action = match &caps["action"] {
            "fill" => "type",
            "selectOption" => "select",
            other => other,
        };
        return Some(format!(
            "cy.get('{}').{}({});",
            &caps["sel"], action, &caps["args"]
        ));
    }

    if let Some(caps) = locator_expect_re.captures(trimmed) {
        let chainer = match &caps["matcher"] {
            "toBeVisible" => "be.visible".to_string(),
            "toBeChecked" => "be.checked".to_string(),
            "toBeDisabled" => "be.disabled".to_string(),
            "toBeEnabled" => "be.enabled".to_string(),
            "toBeEmpty" => "be.empty".to_string(),
            "toBeFocused" => "be.focused".to_string(),
            "toHaveText" => "have.text".to_string(),
            "toHaveValue" => "have.value".to_string(),
            "toHaveClass" => "have.class".to_string(),
            "toHaveAttribute" => "have.attr".to_string(),
            "toHaveCount" => "have.length".to_string(),
            "toContainText" => "contain".to_string(),
            _ => return None,
        };
        let chainer = if caps.name("not").is_some() {
            format!("not.{chainer}")
        } else {
            chainer
        };
        let args = caps["args"].trim();
        return Some(if args.is_empty() {
            format!("cy.get('{}').should('{}');", &caps["sel"], chainer)
        } else {
            format!("cy.get('{}').should('{}', {});", &caps["sel"], chainer, args)
        });
    }

    static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^await\s+expect\(page\)\.toHaveURL\((?<arg>.*)\)\s*;?\s*$")
            .expect("url expect regex")
    });
    if let Some(caps) = URL_RE.captures(trimmed) {
        let arg = caps["arg"].trim();
        return Some(if arg.starts_with("new RegExp(") {
            format!(
                "cy.url().should('match', {});",
                arg
            )
        } else {
            format!("cy.url().should('eq', {arg});")
        });
    }

    static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^await\s+expect\(page\)\.toHaveTitle\((?<arg>.*)\)\s*;?\s*$")
            .expect("title expect regex")
    });
    if let Some(caps) = TITLE_RE.captures(trimmed) {
        return Some(format!("cy.title().should('eq', {});", caps["arg"].trim()));
    }

    None
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ir::{Confidence, FileItem, HookType, IrItem, SuiteItem};

    #[test]
    fn detect_keys_on_the_cy_namespace() {
        let plugin = CypressPlugin::new();
        let src = "describe('login', () => { it('works', () => { cy.visit('/'); }); });";
        assert!(plugin.detect(src) >= 70);
        assert_eq!(
            plugin.detect("import { test } from '@playwright/test';\ncy."),
            0
        );
    }

    #[test]
    fn parse_builds_navigation_assertion_and_mock_nodes() {
        let plugin = CypressPlugin::new();
        let src = "\
describe('login', () => {
  beforeEach(() => {
    cy.visit('/login');
  });
  it('shows the error state', () => {
    cy.intercept('GET', '/api/user');
    cy.get('[data-test=submit]').click();
    cy.get('.error').should('be.visible');
    cy.get('.error').should('not.have.class', 'hidden');
    cy.url().should('include', '/login');
  });
});
";
        let file = plugin.parse(src).unwrap();
        let FileItem::TestSuite(suite) = &file.body[0] else {
            panic!("expected suite");
        };
        assert_eq!(suite.hooks[0].hook_type, HookType::BeforeEach);
        let CaseItem::Navigation(nav) = &suite.hooks[0].body[0] else {
            panic!("expected navigation in hook");
        };
        assert_eq!(nav.action, NavigationAction::Visit);
        assert_eq!(nav.url.as_deref(), Some("/login"));

        let SuiteItem::TestCase(case) = &suite.items[0] else {
            panic!("expected case");
        };
        let CaseItem::MockCall(intercept) = &case.body[0] else {
            panic!("expected intercept mock");
        };
        assert_eq!(intercept.mock_kind, MockKind::NetworkIntercept);

        // The click is an action command, preserved as raw code.
        let CaseItem::RawCode(_) = &case.body[1] else {
            panic!("expected raw click");
        };

        let CaseItem::Assertion(visible) = &case.body[2] else {
            panic!("expected visibility assertion");
        };
        assert_eq!(visible.assertion_kind, AssertionKind::BeVisible);
        assert_eq!(visible.subject, ".error");

        let CaseItem::Assertion(negated) = &case.body[3] else {
            panic!("expected negated assertion");
        };
        assert_eq!(negated.assertion_kind, AssertionKind::HaveClass);
        assert!(negated.negated);

        let CaseItem::Assertion(url) = &case.body[4] else {
            panic!("expected url assertion");
        };
        assert_eq!(url.assertion_kind, AssertionKind::UrlInclude);
        assert_eq!(url.expected.as_deref(), Some("'/login'"));
    }

    #[test]
    fn unknown_chainer_is_unconvertible() {
        let plugin = CypressPlugin::new();
        let src = "\
it('odd', () => {
  cy.get('.x').should('have.glow');
});
";
        let file = plugin.parse(src).unwrap();
        let FileItem::TestCase(case) = &file.body[0] else {
            panic!("expected case");
        };
        let CaseItem::Assertion(assertion) = &case.body[0] else {
            panic!("expected assertion");
        };
        assert_eq!(
            assertion.assertion_kind,
            AssertionKind::Other("have.glow".to_string())
        );
        assert_eq!(assertion.meta().confidence, Confidence::Unconvertible);
    }

    #[test]
    fn emit_translates_playwright_back_to_cy() {
        let plugin = CypressPlugin::new();
        let src = "\
import { test, expect } from '@playwright/test';

test.describe('login', () => {
  test('works', async ({ page }) => {
    await page.goto('/login');
    await page.locator('#submit').click();
    await expect(page.locator('.error')).toBeVisible();
    await expect(page).toHaveURL(new RegExp('/login'));
  });
});
";
        let output = plugin.emit(&TestFile::new("javascript"), src);
        assert!(output.contains("describe('login', () => {"));
        assert!(output.contains("it('works', () => {"));
        assert!(output.contains("cy.visit('/login');"));
        assert!(output.contains("cy.get('#submit').click();"));
        assert!(output.contains("cy.get('.error').should('be.visible');"));
        assert!(output.contains("cy.url().should('match', new RegExp('/login'));"));
        assert!(!output.contains("@playwright/test"));
    }
}
