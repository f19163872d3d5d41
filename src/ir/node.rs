//! IR node definitions.
//!
//! Every node carries a `NodeMeta` with optional source location, the
//! original source snippet, and a per-node conversion confidence. The
//! position enums encode the structural invariants: a `CaseItem` can never
//! hold a suite, so "no nested suites inside a test case" holds by
//! construction rather than by runtime checks.

use std::fmt;

use enum_dispatch::enum_dispatch;

// ============================================================
// Metadata
// ============================================================

/// Per-node translation confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Confidence {
    /// Fully translated.
    Converted,
    /// Translated, but worth a human look.
    Warning,
    /// Could not be translated; preserved as a TODO marker.
    Unconvertible,
}

impl Confidence {
    /// Whether this confidence contributes converted weight to the score.
    pub fn counts_as_converted(self) -> bool {
        matches!(self, Confidence::Converted | Confidence::Warning)
    }
}

/// Position in the original source file. 1-based line, 0-based column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    pub fn line(line: usize) -> Self {
        Self { line, column: 0 }
    }
}

/// Metadata shared by every IR node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMeta {
    pub location: Option<SourceLocation>,
    /// Verbatim source text this node was parsed from. Empty when the node
    /// was synthesized (e.g. by a paradigm transform).
    pub original_source: String,
    pub confidence: Confidence,
}

impl NodeMeta {
    pub fn new() -> Self {
        Self {
            location: None,
            original_source: String::new(),
            confidence: Confidence::Converted,
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.location = Some(SourceLocation::line(line));
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.original_source = source.into();
        self
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn line(&self) -> Option<usize> {
        self.location.map(|loc| loc.line)
    }
}

impl Default for NodeMeta {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================
// Node kind tags
// ============================================================

/// Discriminant for reporting and the weight table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    TestFile,
    TestSuite,
    TestCase,
    Hook,
    Assertion,
    Navigation,
    MockCall,
    ImportStatement,
    Modifier,
    SharedVariable,
    ParameterSet,
    RawCode,
    Comment,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::TestFile => "TestFile",
            NodeKind::TestSuite => "TestSuite",
            NodeKind::TestCase => "TestCase",
            NodeKind::Hook => "Hook",
            NodeKind::Assertion => "Assertion",
            NodeKind::Navigation => "Navigation",
            NodeKind::MockCall => "MockCall",
            NodeKind::ImportStatement => "ImportStatement",
            NodeKind::Modifier => "Modifier",
            NodeKind::SharedVariable => "SharedVariable",
            NodeKind::ParameterSet => "ParameterSet",
            NodeKind::RawCode => "RawCode",
            NodeKind::Comment => "Comment",
        };
        write!(f, "{name}")
    }
}

/// Common metadata interface over IR nodes.
#[enum_dispatch]
pub trait IrItem {
    fn meta(&self) -> &NodeMeta;
    fn kind(&self) -> NodeKind;
}

// ============================================================
// Closed vocabularies
// ============================================================

/// Assertion kinds every target emitter understands.
///
/// Parsers mapping an unrecognized matcher must use `Other` and tag the
/// assertion `Unconvertible`, never coerced to a nearby known kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssertionKind {
    Equal,
    StrictEqual,
    Truthy,
    Falsy,
    IsNull,
    IsDefined,
    Contains,
    HaveLength,
    HaveText,
    HaveAttr,
    HaveClass,
    HaveValue,
    BeVisible,
    BeChecked,
    BeDisabled,
    BeEnabled,
    BeEmpty,
    BeFocused,
    Match,
    UrlInclude,
    UrlEqual,
    TitleEqual,
    Throws,
    Called,
    /// Out-of-vocabulary matcher, kept verbatim.
    Other(String),
}

impl AssertionKind {
    pub fn as_str(&self) -> &str {
        match self {
            AssertionKind::Equal => "equal",
            AssertionKind::StrictEqual => "strictEqual",
            AssertionKind::Truthy => "truthy",
            AssertionKind::Falsy => "falsy",
            AssertionKind::IsNull => "isNull",
            AssertionKind::IsDefined => "isDefined",
            AssertionKind::Contains => "contains",
            AssertionKind::HaveLength => "have.length",
            AssertionKind::HaveText => "have.text",
            AssertionKind::HaveAttr => "have.attr",
            AssertionKind::HaveClass => "have.class",
            AssertionKind::HaveValue => "have.value",
            AssertionKind::BeVisible => "be.visible",
            AssertionKind::BeChecked => "be.checked",
            AssertionKind::BeDisabled => "be.disabled",
            AssertionKind::BeEnabled => "be.enabled",
            AssertionKind::BeEmpty => "be.empty",
            AssertionKind::BeFocused => "be.focused",
            AssertionKind::Match => "match",
            AssertionKind::UrlInclude => "url.include",
            AssertionKind::UrlEqual => "url.equal",
            AssertionKind::TitleEqual => "title.equal",
            AssertionKind::Throws => "throws",
            AssertionKind::Called => "called",
            AssertionKind::Other(raw) => raw,
        }
    }

    /// Parse a vocabulary string back into a kind.
    pub fn parse(s: &str) -> Self {
        match s {
            "equal" => AssertionKind::Equal,
            "strictEqual" => AssertionKind::StrictEqual,
            "truthy" => AssertionKind::Truthy,
            "falsy" => AssertionKind::Falsy,
            "isNull" => AssertionKind::IsNull,
            "isDefined" => AssertionKind::IsDefined,
            "contains" => AssertionKind::Contains,
            "have.length" => AssertionKind::HaveLength,
            "have.text" => AssertionKind::HaveText,
            "have.attr" => AssertionKind::HaveAttr,
            "have.class" => AssertionKind::HaveClass,
            "have.value" => AssertionKind::HaveValue,
            "be.visible" => AssertionKind::BeVisible,
            "be.checked" => AssertionKind::BeChecked,
            "be.disabled" => AssertionKind::BeDisabled,
            "be.enabled" => AssertionKind::BeEnabled,
            "be.empty" => AssertionKind::BeEmpty,
            "be.focused" => AssertionKind::BeFocused,
            "match" => AssertionKind::Match,
            "url.include" => AssertionKind::UrlInclude,
            "url.equal" => AssertionKind::UrlEqual,
            "title.equal" => AssertionKind::TitleEqual,
            "throws" => AssertionKind::Throws,
            "called" => AssertionKind::Called,
            other => AssertionKind::Other(other.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, AssertionKind::Other(_))
    }
}

impl fmt::Display for AssertionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookType {
    BeforeEach,
    AfterEach,
    BeforeAll,
    AfterAll,
}

impl fmt::Display for HookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookType::BeforeEach => "beforeEach",
            HookType::AfterEach => "afterEach",
            HookType::BeforeAll => "beforeAll",
            HookType::AfterAll => "afterAll",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationAction {
    Visit,
    GoBack,
    GoForward,
    Reload,
}

impl fmt::Display for NavigationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NavigationAction::Visit => "visit",
            NavigationAction::GoBack => "goBack",
            NavigationAction::GoForward => "goForward",
            NavigationAction::Reload => "reload",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MockKind {
    CreateMock,
    MockModule,
    FakeTimers,
    NetworkIntercept,
    Spy,
    Other(String),
}

impl fmt::Display for MockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MockKind::CreateMock => write!(f, "createMock"),
            MockKind::MockModule => write!(f, "mockModule"),
            MockKind::FakeTimers => write!(f, "fakeTimers"),
            MockKind::NetworkIntercept => write!(f, "networkIntercept"),
            MockKind::Spy => write!(f, "spy"),
            MockKind::Other(raw) => write!(f, "{raw}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModifierType {
    Only,
    Skip,
    Todo,
}

impl fmt::Display for ModifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModifierType::Only => "only",
            ModifierType::Skip => "skip",
            ModifierType::Todo => "todo",
        };
        write!(f, "{name}")
    }
}

// ============================================================
// Node structs
// ============================================================

/// Root of the IR. Owns the import list and the top-level body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFile {
    pub language: String,
    pub imports: Vec<ImportStatement>,
    pub body: Vec<FileItem>,
    pub meta: NodeMeta,
}

impl TestFile {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            imports: Vec::new(),
            body: Vec::new(),
            meta: NodeMeta::new(),
        }
    }
}

impl IrItem for TestFile {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }
    fn kind(&self) -> NodeKind {
        NodeKind::TestFile
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSuite {
    pub name: String,
    pub modifiers: Vec<Modifier>,
    pub hooks: Vec<Hook>,
    pub items: Vec<SuiteItem>,
    pub meta: NodeMeta,
}

impl TestSuite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modifiers: Vec::new(),
            hooks: Vec::new(),
            items: Vec::new(),
            meta: NodeMeta::new(),
        }
    }

    /// Add a modifier, keeping the set consistent: `only` and `skip` are
    /// mutually exclusive and the first one recorded wins.
    pub fn push_modifier(&mut self, modifier: Modifier) {
        if modifier_conflicts(&self.modifiers, modifier.modifier_type) {
            return;
        }
        self.modifiers.push(modifier);
    }
}

impl IrItem for TestSuite {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }
    fn kind(&self) -> NodeKind {
        NodeKind::TestSuite
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    pub modifiers: Vec<Modifier>,
    pub parameters: Option<ParameterSet>,
    pub body: Vec<CaseItem>,
    pub meta: NodeMeta,
}

impl TestCase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modifiers: Vec::new(),
            parameters: None,
            body: Vec::new(),
            meta: NodeMeta::new(),
        }
    }

    /// See [`TestSuite::push_modifier`].
    pub fn push_modifier(&mut self, modifier: Modifier) {
        if modifier_conflicts(&self.modifiers, modifier.modifier_type) {
            return;
        }
        self.modifiers.push(modifier);
    }
}

impl IrItem for TestCase {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }
    fn kind(&self) -> NodeKind {
        NodeKind::TestCase
    }
}

fn modifier_conflicts(existing: &[Modifier], incoming: ModifierType) -> bool {
    existing.iter().any(|m| {
        m.modifier_type == incoming
            || matches!(
                (m.modifier_type, incoming),
                (ModifierType::Only, ModifierType::Skip)
                    | (ModifierType::Skip, ModifierType::Only)
            )
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hook {
    pub hook_type: HookType,
    pub body: Vec<CaseItem>,
    pub meta: NodeMeta,
}

impl Hook {
    pub fn new(hook_type: HookType) -> Self {
        Self {
            hook_type,
            body: Vec::new(),
            meta: NodeMeta::new(),
        }
    }
}

impl IrItem for Hook {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }
    fn kind(&self) -> NodeKind {
        NodeKind::Hook
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    pub assertion_kind: AssertionKind,
    pub subject: String,
    pub expected: Option<String>,
    pub negated: bool,
    pub meta: NodeMeta,
}

impl Assertion {
    pub fn new(kind: AssertionKind, subject: impl Into<String>) -> Self {
        let confidence = if kind.is_known() {
            Confidence::Converted
        } else {
            Confidence::Unconvertible
        };
        Self {
            assertion_kind: kind,
            subject: subject.into(),
            expected: None,
            negated: false,
            meta: NodeMeta::new().with_confidence(confidence),
        }
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn negated(mut self) -> Self {
        self.negated = true;
        self
    }
}

impl IrItem for Assertion {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }
    fn kind(&self) -> NodeKind {
        NodeKind::Assertion
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub action: NavigationAction,
    pub url: Option<String>,
    pub meta: NodeMeta,
}

impl Navigation {
    pub fn new(action: NavigationAction) -> Self {
        Self {
            action,
            url: None,
            meta: NodeMeta::new(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

impl IrItem for Navigation {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }
    fn kind(&self) -> NodeKind {
        NodeKind::Navigation
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub mock_kind: MockKind,
    pub target: Option<String>,
    pub meta: NodeMeta,
}

impl MockCall {
    pub fn new(kind: MockKind) -> Self {
        Self {
            mock_kind: kind,
            target: None,
            meta: NodeMeta::new(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

impl IrItem for MockCall {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }
    fn kind(&self) -> NodeKind {
        NodeKind::MockCall
    }
}

/// Import binding set. A statement with no bindings at all is a
/// side-effect import (`import './setup';`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportBindings {
    pub default_binding: Option<String>,
    pub namespace: Option<String>,
    pub named: Vec<String>,
    pub type_only: bool,
}

impl ImportBindings {
    pub fn is_side_effect(&self) -> bool {
        self.default_binding.is_none() && self.namespace.is_none() && self.named.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    pub source: String,
    pub bindings: ImportBindings,
    pub meta: NodeMeta,
}

impl ImportStatement {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            bindings: ImportBindings::default(),
            meta: NodeMeta::new(),
        }
    }

    pub fn with_bindings(mut self, bindings: ImportBindings) -> Self {
        self.bindings = bindings;
        self
    }
}

impl IrItem for ImportStatement {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }
    fn kind(&self) -> NodeKind {
        NodeKind::ImportStatement
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modifier {
    pub modifier_type: ModifierType,
    pub meta: NodeMeta,
}

impl Modifier {
    pub fn new(modifier_type: ModifierType) -> Self {
        Self {
            modifier_type,
            meta: NodeMeta::new(),
        }
    }
}

impl IrItem for Modifier {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }
    fn kind(&self) -> NodeKind {
        NodeKind::Modifier
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedVariable {
    pub name: String,
    pub initializer: String,
    pub meta: NodeMeta,
}

impl SharedVariable {
    pub fn new(name: impl Into<String>, initializer: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initializer: initializer.into(),
            meta: NodeMeta::new(),
        }
    }
}

impl IrItem for SharedVariable {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }
    fn kind(&self) -> NodeKind {
        NodeKind::SharedVariable
    }
}

/// Parameterized-test rows (`test.each`, `@pytest.mark.parametrize`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSet {
    /// Raw parameter rows, kept as source text.
    pub rows: Vec<String>,
    pub meta: NodeMeta,
}

impl ParameterSet {
    pub fn new(rows: Vec<String>) -> Self {
        Self {
            rows,
            meta: NodeMeta::new(),
        }
    }
}

impl IrItem for ParameterSet {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }
    fn kind(&self) -> NodeKind {
        NodeKind::ParameterSet
    }
}

/// Verbatim source the parser could not interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCode {
    pub code: String,
    pub meta: NodeMeta,
}

impl RawCode {
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            meta: NodeMeta::new().with_source(code.clone()),
            code,
        }
    }

    /// Raw code the parser recognized as pass-through (kept `Converted`).
    pub fn passthrough(code: impl Into<String>) -> Self {
        Self::new(code)
    }

    /// Raw code the parser could not interpret at all.
    pub fn unconvertible(code: impl Into<String>) -> Self {
        let mut raw = Self::new(code);
        raw.meta.confidence = Confidence::Unconvertible;
        raw
    }
}

impl IrItem for RawCode {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }
    fn kind(&self) -> NodeKind {
        NodeKind::RawCode
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
    pub meta: NodeMeta,
}

impl Comment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            meta: NodeMeta::new(),
        }
    }
}

impl IrItem for Comment {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }
    fn kind(&self) -> NodeKind {
        NodeKind::Comment
    }
}

// ============================================================
// Position enums
// ============================================================

/// What may appear at the top level of a file.
#[enum_dispatch(IrItem)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileItem {
    TestSuite,
    TestCase,
    SharedVariable,
    MockCall,
    RawCode,
    Comment,
}

/// What may appear inside a suite.
#[enum_dispatch(IrItem)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuiteItem {
    TestSuite,
    TestCase,
    SharedVariable,
    MockCall,
    RawCode,
    Comment,
}

/// What may appear inside a test case or hook body. Suites cannot.
#[enum_dispatch(IrItem)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseItem {
    Assertion,
    Navigation,
    MockCall,
    RawCode,
    Comment,
}
