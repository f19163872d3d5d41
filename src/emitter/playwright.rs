//! Structural emitter for the Playwright target.
//!
//! Covers the browser-facing assertion vocabulary (locator and page
//! matchers) plus navigation and fake timers. Expression-level kinds are
//! declined; the regex baseline already renders those. Whole-file
//! emission is not implemented, so `ir-full` falls back to patching.

use super::{EmittableNode, EmittedNode, IrEmitter};
use crate::ir::{
    Assertion, AssertionKind, MockCall, MockKind, Navigation, NavigationAction, TestFile,
};

pub struct PlaywrightIrEmitter;

impl PlaywrightIrEmitter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlaywrightIrEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl IrEmitter for PlaywrightIrEmitter {
    fn emit_node(&self, node: EmittableNode<'_>) -> EmittedNode {
        let code = match node {
            EmittableNode::Assertion(a) => assertion_code(a),
            EmittableNode::Navigation(n) => Some(navigation_code(n)),
            EmittableNode::MockCall(m) => mock_code(m),
        };
        match code {
            Some(code) => EmittedNode::supported(code),
            None => EmittedNode::unsupported(),
        }
    }

    fn matches_baseline(&self, line: &str, node: EmittableNode<'_>) -> bool {
        match node {
            EmittableNode::Assertion(a) => {
                let Some(token) = matcher_token(&a.assertion_kind) else {
                    return false;
                };
                if !line.contains(token) {
                    return false;
                }
                match &a.assertion_kind {
                    AssertionKind::UrlInclude
                    | AssertionKind::UrlEqual
                    | AssertionKind::TitleEqual => true,
                    _ => line.contains(&format!("locator('{}')", a.subject)),
                }
            }
            EmittableNode::Navigation(n) => match n.action {
                NavigationAction::Visit => {
                    line.contains("page.goto(")
                        && n.url.as_deref().is_none_or(|url| line.contains(url))
                }
                NavigationAction::GoBack => line.contains("page.goBack()"),
                NavigationAction::GoForward => line.contains("page.goForward()"),
                NavigationAction::Reload => line.contains("page.reload()"),
            },
            EmittableNode::MockCall(m) => {
                matches!(m.mock_kind, MockKind::FakeTimers) && line.contains("clock.install")
            }
        }
    }

    fn emit_full_file(&self, _ir: &TestFile) -> Option<String> {
        None
    }
}

fn assertion_code(a: &Assertion) -> Option<String> {
    let expected = a.expected.as_deref();
    let not = if a.negated { ".not" } else { "" };

    // Page-level matchers first: their subject is the page, not a locator.
    match &a.assertion_kind {
        AssertionKind::UrlInclude => {
            let fragment = unquote(expected?)?;
            return Some(format!(
                "await expect(page){not}.toHaveURL(new RegExp({}));",
                quote_js(&regex_escape(fragment))
            ));
        }
        AssertionKind::UrlEqual => {
            return Some(format!("await expect(page){not}.toHaveURL({});", expected?));
        }
        AssertionKind::TitleEqual => {
            return Some(format!(
                "await expect(page){not}.toHaveTitle({});",
                expected?
            ));
        }
        _ => {}
    }

    let call = match &a.assertion_kind {
        AssertionKind::BeVisible => ".toBeVisible()".to_string(),
        AssertionKind::BeChecked => ".toBeChecked()".to_string(),
        AssertionKind::BeDisabled => ".toBeDisabled()".to_string(),
        AssertionKind::BeEnabled => ".toBeEnabled()".to_string(),
        AssertionKind::BeEmpty => ".toBeEmpty()".to_string(),
        AssertionKind::BeFocused => ".toBeFocused()".to_string(),
        AssertionKind::HaveText => format!(".toHaveText({})", expected?),
        AssertionKind::HaveValue => format!(".toHaveValue({})", expected?),
        AssertionKind::HaveClass => format!(".toHaveClass({})", expected?),
        AssertionKind::HaveAttr => format!(".toHaveAttribute({})", expected?),
        AssertionKind::HaveLength => format!(".toHaveCount({})", expected?),
        AssertionKind::Contains => format!(".toContainText({})", expected?),
        AssertionKind::Equal
        | AssertionKind::StrictEqual
        | AssertionKind::Truthy
        | AssertionKind::Falsy
        | AssertionKind::IsNull
        | AssertionKind::IsDefined
        | AssertionKind::Match
        | AssertionKind::Throws
        | AssertionKind::Called
        | AssertionKind::UrlInclude
        | AssertionKind::UrlEqual
        | AssertionKind::TitleEqual
        | AssertionKind::Other(_) => return None,
    };
    Some(format!(
        "await expect(page.locator({})){not}{call};",
        quote_js(&a.subject)
    ))
}

fn navigation_code(n: &Navigation) -> String {
    match n.action {
        NavigationAction::Visit => match &n.url {
            Some(url) => format!("await page.goto({});", quote_js(url)),
            None => "await page.goto('/');".to_string(),
        },
        NavigationAction::GoBack => "await page.goBack();".to_string(),
        NavigationAction::GoForward => "await page.goForward();".to_string(),
        NavigationAction::Reload => "await page.reload();".to_string(),
    }
}

fn mock_code(m: &MockCall) -> Option<String> {
    match m.mock_kind {
        MockKind::FakeTimers => Some("await page.clock.install();".to_string()),
        MockKind::CreateMock
        | MockKind::MockModule
        | MockKind::NetworkIntercept
        | MockKind::Spy
        | MockKind::Other(_) => None,
    }
}

fn matcher_token(kind: &AssertionKind) -> Option<&'static str> {
    Some(match kind {
        AssertionKind::BeVisible => "toBeVisible",
        AssertionKind::BeChecked => "toBeChecked",
        AssertionKind::BeDisabled => "toBeDisabled",
        AssertionKind::BeEnabled => "toBeEnabled",
        AssertionKind::BeEmpty => "toBeEmpty",
        AssertionKind::BeFocused => "toBeFocused",
        AssertionKind::HaveText => "toHaveText",
        AssertionKind::HaveValue => "toHaveValue",
        AssertionKind::HaveClass => "toHaveClass",
        AssertionKind::HaveAttr => "toHaveAttribute",
        AssertionKind::HaveLength => "toHaveCount",
        AssertionKind::Contains => "toContainText",
        AssertionKind::UrlInclude | AssertionKind::UrlEqual => "toHaveURL",
        AssertionKind::TitleEqual => "toHaveTitle",
        _ => return None,
    })
}

fn quote_js(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Strip a simple quoted JS string literal; `None` for anything else.
fn unquote(s: &str) -> Option<&str> {
    let s = s.trim();
    if s.len() >= 2
        && ((s.starts_with('\'') && s.ends_with('\''))
            || (s.starts_with('"') && s.ends_with('"')))
    {
        Some(&s[1..s.len() - 1])
    } else {
        None
    }
}

fn regex_escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if ".^$*+?()[]{}|\\".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn emit(node: EmittableNode<'_>) -> EmittedNode {
        PlaywrightIrEmitter::new().emit_node(node)
    }

    #[test]
    fn visibility_assertion_targets_a_locator() {
        let a = Assertion::new(AssertionKind::BeVisible, ".error");
        assert_eq!(
            emit(EmittableNode::Assertion(&a)).code,
            "await expect(page.locator('.error')).toBeVisible();"
        );

        let a = Assertion::new(AssertionKind::BeVisible, ".error").negated();
        assert_eq!(
            emit(EmittableNode::Assertion(&a)).code,
            "await expect(page.locator('.error')).not.toBeVisible();"
        );
    }

    #[test]
    fn url_include_becomes_a_regexp_match() {
        let a = Assertion::new(AssertionKind::UrlInclude, "page").with_expected("'/login'");
        assert_eq!(
            emit(EmittableNode::Assertion(&a)).code,
            "await expect(page).toHaveURL(new RegExp('/login'));"
        );
    }

    #[test]
    fn url_include_escapes_regex_metacharacters() {
        let a = Assertion::new(AssertionKind::UrlInclude, "page").with_expected("'/a?b=1'");
        assert_eq!(
            emit(EmittableNode::Assertion(&a)).code,
            "await expect(page).toHaveURL(new RegExp('/a\\?b=1'));"
        );
    }

    #[test]
    fn expression_kinds_are_left_to_the_baseline() {
        let a = Assertion::new(AssertionKind::Equal, "x").with_expected("1");
        assert!(!emit(EmittableNode::Assertion(&a)).supported);
    }

    #[test]
    fn navigation_maps_to_page_calls() {
        let n = Navigation::new(NavigationAction::Visit).with_url("/login");
        assert_eq!(
            emit(EmittableNode::Navigation(&n)).code,
            "await page.goto('/login');"
        );

        let n = Navigation::new(NavigationAction::Reload);
        assert_eq!(emit(EmittableNode::Navigation(&n)).code, "await page.reload();");
    }

    #[test]
    fn fake_timers_install_a_clock() {
        let m = MockCall::new(MockKind::FakeTimers);
        assert_eq!(
            emit(EmittableNode::MockCall(&m)).code,
            "await page.clock.install();"
        );

        let m = MockCall::new(MockKind::NetworkIntercept).with_target("'GET', '/api'");
        assert!(!emit(EmittableNode::MockCall(&m)).supported);
    }

    #[test]
    fn baseline_match_requires_selector_and_matcher() {
        let emitter = PlaywrightIrEmitter::new();
        let a = Assertion::new(AssertionKind::BeVisible, ".error");
        assert!(emitter.matches_baseline(
            "await expect(page.locator('.error')).toBeVisible();",
            EmittableNode::Assertion(&a)
        ));
        assert!(!emitter.matches_baseline(
            "await expect(page.locator('.other')).toBeVisible();",
            EmittableNode::Assertion(&a)
        ));
        assert!(!emitter.matches_baseline(
            "await expect(page.locator('.error')).toBeHidden();",
            EmittableNode::Assertion(&a)
        ));
    }

    #[test]
    fn full_file_emission_is_not_implemented() {
        assert!(
            PlaywrightIrEmitter::new()
                .emit_full_file(&TestFile::new("javascript"))
                .is_none()
        );
    }
}
