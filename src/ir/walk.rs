//! Deterministic pre-order traversal over the IR.
//!
//! `walk_ir` visits every node exactly once: parent before children,
//! children in stored order. Stored order per parent:
//! file → imports, body; suite → modifiers, hooks, items;
//! case → modifiers, parameters, body; hook → body.
//!
//! The match arms are exhaustive on purpose. Adding an IR variant must
//! fail to compile here until the walker handles it.

use super::node::{
    Assertion, CaseItem, Comment, FileItem, Hook, ImportStatement, MockCall, Modifier, Navigation,
    NodeKind, NodeMeta, ParameterSet, RawCode, SharedVariable, SuiteItem, TestCase, TestFile,
    TestSuite,
};

/// Borrowed view of any IR node, handed to visitors.
#[derive(Debug, Clone, Copy)]
pub enum IrRef<'a> {
    TestFile(&'a TestFile),
    TestSuite(&'a TestSuite),
    TestCase(&'a TestCase),
    Hook(&'a Hook),
    Assertion(&'a Assertion),
    Navigation(&'a Navigation),
    MockCall(&'a MockCall),
    ImportStatement(&'a ImportStatement),
    Modifier(&'a Modifier),
    SharedVariable(&'a SharedVariable),
    ParameterSet(&'a ParameterSet),
    RawCode(&'a RawCode),
    Comment(&'a Comment),
}

impl<'a> IrRef<'a> {
    pub fn meta(&self) -> &'a NodeMeta {
        match self {
            IrRef::TestFile(n) => &n.meta,
            IrRef::TestSuite(n) => &n.meta,
            IrRef::TestCase(n) => &n.meta,
            IrRef::Hook(n) => &n.meta,
            IrRef::Assertion(n) => &n.meta,
            IrRef::Navigation(n) => &n.meta,
            IrRef::MockCall(n) => &n.meta,
            IrRef::ImportStatement(n) => &n.meta,
            IrRef::Modifier(n) => &n.meta,
            IrRef::SharedVariable(n) => &n.meta,
            IrRef::ParameterSet(n) => &n.meta,
            IrRef::RawCode(n) => &n.meta,
            IrRef::Comment(n) => &n.meta,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            IrRef::TestFile(_) => NodeKind::TestFile,
            IrRef::TestSuite(_) => NodeKind::TestSuite,
            IrRef::TestCase(_) => NodeKind::TestCase,
            IrRef::Hook(_) => NodeKind::Hook,
            IrRef::Assertion(_) => NodeKind::Assertion,
            IrRef::Navigation(_) => NodeKind::Navigation,
            IrRef::MockCall(_) => NodeKind::MockCall,
            IrRef::ImportStatement(_) => NodeKind::ImportStatement,
            IrRef::Modifier(_) => NodeKind::Modifier,
            IrRef::SharedVariable(_) => NodeKind::SharedVariable,
            IrRef::ParameterSet(_) => NodeKind::ParameterSet,
            IrRef::RawCode(_) => NodeKind::RawCode,
            IrRef::Comment(_) => NodeKind::Comment,
        }
    }
}

/// Visit every node of `file` in pre-order.
pub fn walk_ir<'a, F>(file: &'a TestFile, visitor: &mut F)
where
    F: FnMut(IrRef<'a>),
{
    visitor(IrRef::TestFile(file));
    for import in &file.imports {
        visitor(IrRef::ImportStatement(import));
    }
    for item in &file.body {
        walk_file_item(item, visitor);
    }
}

fn walk_file_item<'a, F>(item: &'a FileItem, visitor: &mut F)
where
    F: FnMut(IrRef<'a>),
{
    match item {
        FileItem::TestSuite(suite) => walk_suite(suite, visitor),
        FileItem::TestCase(case) => walk_case(case, visitor),
        FileItem::SharedVariable(shared) => visitor(IrRef::SharedVariable(shared)),
        FileItem::MockCall(mock) => visitor(IrRef::MockCall(mock)),
        FileItem::RawCode(raw) => visitor(IrRef::RawCode(raw)),
        FileItem::Comment(comment) => visitor(IrRef::Comment(comment)),
    }
}

fn walk_suite<'a, F>(suite: &'a TestSuite, visitor: &mut F)
where
    F: FnMut(IrRef<'a>),
{
    visitor(IrRef::TestSuite(suite));
    for modifier in &suite.modifiers {
        visitor(IrRef::Modifier(modifier));
    }
    for hook in &suite.hooks {
        walk_hook(hook, visitor);
    }
    for item in &suite.items {
        match item {
            SuiteItem::TestSuite(nested) => walk_suite(nested, visitor),
            SuiteItem::TestCase(case) => walk_case(case, visitor),
            SuiteItem::SharedVariable(shared) => visitor(IrRef::SharedVariable(shared)),
            SuiteItem::MockCall(mock) => visitor(IrRef::MockCall(mock)),
            SuiteItem::RawCode(raw) => visitor(IrRef::RawCode(raw)),
            SuiteItem::Comment(comment) => visitor(IrRef::Comment(comment)),
        }
    }
}

fn walk_case<'a, F>(case: &'a TestCase, visitor: &mut F)
where
    F: FnMut(IrRef<'a>),
{
    visitor(IrRef::TestCase(case));
    for modifier in &case.modifiers {
        visitor(IrRef::Modifier(modifier));
    }
    if let Some(parameters) = &case.parameters {
        visitor(IrRef::ParameterSet(parameters));
    }
    for item in &case.body {
        walk_case_item(item, visitor);
    }
}

fn walk_hook<'a, F>(hook: &'a Hook, visitor: &mut F)
where
    F: FnMut(IrRef<'a>),
{
    visitor(IrRef::Hook(hook));
    for item in &hook.body {
        walk_case_item(item, visitor);
    }
}

fn walk_case_item<'a, F>(item: &'a CaseItem, visitor: &mut F)
where
    F: FnMut(IrRef<'a>),
{
    match item {
        CaseItem::Assertion(assertion) => visitor(IrRef::Assertion(assertion)),
        CaseItem::Navigation(navigation) => visitor(IrRef::Navigation(navigation)),
        CaseItem::MockCall(mock) => visitor(IrRef::MockCall(mock)),
        CaseItem::RawCode(raw) => visitor(IrRef::RawCode(raw)),
        CaseItem::Comment(comment) => visitor(IrRef::Comment(comment)),
    }
}

/// Count every node in the tree. Convenience over a manual walk.
#[cfg(test)]
pub(crate) fn node_count(file: &TestFile) -> usize {
    let mut count = 0;
    walk_ir(file, &mut |_| count += 1);
    count
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ir::node::{AssertionKind, HookType, ModifierType};

    fn sample_file() -> TestFile {
        let mut file = TestFile::new("javascript");
        file.imports.push(ImportStatement::new("vitest"));

        let mut suite = TestSuite::new("math");
        suite.push_modifier(Modifier::new(ModifierType::Only));
        suite.hooks.push(Hook::new(HookType::BeforeEach));

        let mut case = TestCase::new("adds");
        case.body.push(CaseItem::Assertion(Assertion::new(
            AssertionKind::Equal,
            "add(1, 2)",
        )));
        case.body
            .push(CaseItem::Comment(Comment::new("boundary check")));
        suite.items.push(SuiteItem::TestCase(case));

        file.body.push(FileItem::TestSuite(suite));
        file
    }

    #[test]
    fn walk_visits_every_node_once_in_preorder() {
        let file = sample_file();
        let mut kinds = Vec::new();
        walk_ir(&file, &mut |node| kinds.push(node.kind()));

        assert_eq!(
            kinds,
            vec![
                NodeKind::TestFile,
                NodeKind::ImportStatement,
                NodeKind::TestSuite,
                NodeKind::Modifier,
                NodeKind::Hook,
                NodeKind::TestCase,
                NodeKind::Assertion,
                NodeKind::Comment,
            ]
        );
    }

    #[test]
    fn node_count_matches_walk() {
        let file = sample_file();
        assert_eq!(node_count(&file), 8);
    }

    #[test]
    fn empty_file_visits_only_root() {
        let file = TestFile::new("python");
        let mut visits = 0;
        walk_ir(&file, &mut |_| visits += 1);
        assert_eq!(visits, 1);
    }
}
