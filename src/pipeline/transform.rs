//! Cross-paradigm restructuring.
//!
//! Same-paradigm conversions pass the tree through untouched. The one
//! implemented restructuring wraps function-paradigm top-level test
//! cases into a synthesized suite so xunit targets have a class to hang
//! methods on. Nothing else is invented: leaf nodes keep their identity,
//! order, and confidence.

use crate::ir::{FileItem, SuiteItem, TestFile, TestSuite};
use crate::registry::Paradigm;

/// Name of the suite synthesized around loose function-style cases.
const WRAPPER_SUITE_NAME: &str = "Tests";

pub fn transform_paradigm(ir: TestFile, source: Paradigm, target: Paradigm) -> TestFile {
    match (source, target) {
        (Paradigm::Function, Paradigm::Xunit) => wrap_loose_cases(ir),
        _ => ir,
    }
}

/// Move every top-level test case into one synthesized `TestSuite`,
/// keeping non-case items (helpers, comments, raw code) at file level.
fn wrap_loose_cases(mut ir: TestFile) -> TestFile {
    if !ir
        .body
        .iter()
        .any(|item| matches!(item, FileItem::TestCase(_)))
    {
        return ir;
    }

    let mut suite = TestSuite::new(WRAPPER_SUITE_NAME);
    let mut body = Vec::with_capacity(ir.body.len());
    let mut suite_slot: Option<usize> = None;
    for item in ir.body {
        match item {
            FileItem::TestCase(case) => {
                if suite_slot.is_none() {
                    suite_slot = Some(body.len());
                }
                suite.items.push(SuiteItem::TestCase(case));
            }
            other => body.push(other),
        }
    }
    if let Some(slot) = suite_slot {
        body.insert(slot, FileItem::TestSuite(suite));
    }
    ir.body = body;
    ir
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ir::{Comment, RawCode, TestCase};

    fn function_file() -> TestFile {
        let mut file = TestFile::new("python");
        file.body
            .push(FileItem::Comment(Comment::new("module comment")));
        file.body
            .push(FileItem::TestCase(TestCase::new("test_add")));
        file.body
            .push(FileItem::RawCode(RawCode::passthrough("HELPER = 1")));
        file.body
            .push(FileItem::TestCase(TestCase::new("test_sub")));
        file
    }

    #[test]
    fn function_to_xunit_wraps_cases_in_one_suite() {
        let out = transform_paradigm(function_file(), Paradigm::Function, Paradigm::Xunit);
        assert_eq!(out.body.len(), 3);
        assert!(matches!(out.body[0], FileItem::Comment(_)));
        let FileItem::TestSuite(suite) = &out.body[1] else {
            panic!("expected wrapper suite");
        };
        assert_eq!(suite.name, "Tests");
        assert_eq!(suite.items.len(), 2);
        assert!(matches!(out.body[2], FileItem::RawCode(_)));
    }

    #[test]
    fn same_paradigm_is_identity() {
        let file = function_file();
        let before = file.clone();
        let out = transform_paradigm(file, Paradigm::Bdd, Paradigm::Bdd);
        assert_eq!(out, before);
    }

    #[test]
    fn xunit_to_function_is_left_alone() {
        let file = function_file();
        let before = file.clone();
        let out = transform_paradigm(file, Paradigm::Xunit, Paradigm::Function);
        assert_eq!(out, before);
    }

    #[test]
    fn file_without_loose_cases_is_untouched() {
        let mut file = TestFile::new("python");
        file.body
            .push(FileItem::RawCode(RawCode::passthrough("x = 1")));
        let before = file.clone();
        let out = transform_paradigm(file, Paradigm::Function, Paradigm::Xunit);
        assert_eq!(out, before);
    }
}
