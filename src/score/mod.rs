//! Confidence scoring over the IR.
//!
//! Walks a tree once, sums per-variant weights, and maps the converted
//! ratio to a 0–100 confidence with a three-level classification. When a
//! structural IR emitter was active, a small ratio boost rewards the
//! share of nodes it actually handled.

mod coverage;

use serde::Serialize;

pub use coverage::IrCoverage;

use crate::ir::{Confidence, IrRef, NodeKind, TestFile, walk_ir};

/// Base weight of an IR variant. Structural nodes weigh more than
/// line-level nodes; containers that carry no behavior weigh nothing.
pub fn weight(kind: NodeKind) -> u32 {
    match kind {
        NodeKind::TestSuite | NodeKind::TestCase | NodeKind::Hook => 3,
        NodeKind::Assertion | NodeKind::Navigation | NodeKind::MockCall => 2,
        NodeKind::ImportStatement
        | NodeKind::RawCode
        | NodeKind::SharedVariable
        | NodeKind::Modifier
        | NodeKind::ParameterSet => 1,
        NodeKind::TestFile | NodeKind::Comment => 0,
    }
}

/// Confidence classification shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=100 => ConfidenceLevel::High,
            70..=89 => ConfidenceLevel::Medium,
            _ => ConfidenceLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailType {
    Unconvertible,
    Warning,
}

impl DetailType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailType::Unconvertible => "unconvertible",
            DetailType::Warning => "warning",
        }
    }
}

/// One flagged node in the report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDetail {
    #[serde(rename = "type")]
    pub detail_type: DetailType,
    pub node_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub source: String,
}

/// Per-file confidence report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceReport {
    pub confidence: u8,
    pub level: ConfidenceLevel,
    pub converted: usize,
    pub unconvertible: usize,
    pub warnings: usize,
    pub total: usize,
    pub details: Vec<ReportDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ir_coverage: Option<IrCoverage>,
}

/// How many emittable nodes the IR emitter attempted and how many of its
/// replacements landed in the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmitAttempts {
    pub attempted: usize,
    pub succeeded: usize,
}

/// Score a tree. `attempts` is present when an IR emitter ran.
///
/// Nodes with weight 0 (the file root, comments) are excluded from both
/// the weight sums and the node counts, so an empty file scores 100.
pub fn score_ir(file: &TestFile, attempts: Option<EmitAttempts>) -> ConfidenceReport {
    let mut total_weight = 0u32;
    let mut converted_weight = 0u32;
    let mut converted = 0usize;
    let mut unconvertible = 0usize;
    let mut warnings = 0usize;
    let mut total = 0usize;
    let mut details = Vec::new();

    walk_ir(file, &mut |node: IrRef<'_>| {
        let w = weight(node.kind());
        if w == 0 {
            return;
        }
        let meta = node.meta();
        total += 1;
        total_weight += w;
        match meta.confidence {
            Confidence::Converted => {
                converted += 1;
                converted_weight += w;
            }
            Confidence::Warning => {
                warnings += 1;
                converted_weight += w;
                details.push(ReportDetail {
                    detail_type: DetailType::Warning,
                    node_type: node.kind().to_string(),
                    line: meta.line(),
                    source: meta.original_source.clone(),
                });
            }
            Confidence::Unconvertible => {
                unconvertible += 1;
                details.push(ReportDetail {
                    detail_type: DetailType::Unconvertible,
                    node_type: node.kind().to_string(),
                    line: meta.line(),
                    source: meta.original_source.clone(),
                });
            }
        }
    });

    let mut confidence = if total_weight == 0 {
        100
    } else {
        ratio_percent(converted_weight, total_weight)
    };

    if let Some(EmitAttempts {
        attempted,
        succeeded,
    }) = attempts
        && attempted >= 1
    {
        let boost = ((5.0 * succeeded as f64 / attempted as f64).round()) as u8;
        confidence = confidence.saturating_add(boost).min(100);
    }

    ConfidenceReport {
        confidence,
        level: ConfidenceLevel::from_score(confidence),
        converted,
        unconvertible,
        warnings,
        total,
        details,
        ir_coverage: None,
    }
}

fn ratio_percent(part: u32, whole: u32) -> u8 {
    ((100.0 * part as f64 / whole as f64).round()) as u8
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ir::{
        Assertion, AssertionKind, CaseItem, Comment, Confidence, FileItem, NodeMeta, SuiteItem,
        TestCase, TestFile, TestSuite,
    };

    fn unconvertible_assertion(line: usize) -> Assertion {
        let mut assertion = Assertion::new(
            AssertionKind::Other("custom.matcher".to_string()),
            "subject",
        );
        assertion.meta = NodeMeta::new()
            .with_line(line)
            .with_source("expect(x).customMatcher()")
            .with_confidence(Confidence::Unconvertible);
        assertion
    }

    /// Suite + case + two converted and two unconvertible assertions:
    /// weights 3+3+2+2+2+2 = 14, converted 10, score 71, medium.
    #[test]
    fn mixed_tree_scores_seventy_one() {
        let mut case = TestCase::new("case");
        case.body.push(CaseItem::Assertion(Assertion::new(
            AssertionKind::Equal,
            "a",
        )));
        case.body.push(CaseItem::Assertion(Assertion::new(
            AssertionKind::Equal,
            "b",
        )));
        case.body
            .push(CaseItem::Assertion(unconvertible_assertion(10)));
        case.body
            .push(CaseItem::Assertion(unconvertible_assertion(15)));

        let mut suite = TestSuite::new("suite");
        suite.items.push(SuiteItem::TestCase(case));
        let mut file = TestFile::new("javascript");
        file.body.push(FileItem::TestSuite(suite));

        let report = score_ir(&file, None);
        assert_eq!(report.confidence, 71);
        assert_eq!(report.level, ConfidenceLevel::Medium);
        assert_eq!(report.converted, 4);
        assert_eq!(report.unconvertible, 2);
        assert_eq!(report.total, 6);
        assert_eq!(report.details.len(), 2);
        assert_eq!(report.details[0].line, Some(10));
        assert_eq!(report.details[1].line, Some(15));
    }

    #[test]
    fn empty_file_scores_one_hundred() {
        let file = TestFile::new("javascript");
        let report = score_ir(&file, None);
        assert_eq!(report.confidence, 100);
        assert_eq!(report.level, ConfidenceLevel::High);
        assert_eq!(report.total, 0);
    }

    #[test]
    fn comments_do_not_affect_the_score() {
        let mut file = TestFile::new("javascript");
        file.body
            .push(FileItem::Comment(Comment::new("just a note")));
        let report = score_ir(&file, None);
        assert_eq!(report.confidence, 100);
        assert_eq!(report.total, 0);
    }

    #[test]
    fn warnings_count_as_converted_weight_but_are_flagged() {
        let mut assertion = Assertion::new(AssertionKind::Equal, "a");
        assertion.meta.confidence = Confidence::Warning;
        let mut case = TestCase::new("case");
        case.body.push(CaseItem::Assertion(assertion));
        let mut file = TestFile::new("javascript");
        file.body.push(FileItem::TestCase(case));

        let report = score_ir(&file, None);
        assert_eq!(report.confidence, 100);
        assert_eq!(report.warnings, 1);
        assert_eq!(report.details.len(), 1);
        assert_eq!(report.details[0].detail_type, DetailType::Warning);
    }

    #[test]
    fn emit_ratio_boost_caps_at_one_hundred() {
        let mut case = TestCase::new("case");
        case.body.push(CaseItem::Assertion(Assertion::new(
            AssertionKind::Equal,
            "a",
        )));
        let mut file = TestFile::new("javascript");
        file.body.push(FileItem::TestCase(case));

        // Already 100; boost must not overflow past the cap.
        let report = score_ir(
            &file,
            Some(EmitAttempts {
                attempted: 1,
                succeeded: 1,
            }),
        );
        assert_eq!(report.confidence, 100);
    }

    #[test]
    fn emit_ratio_boost_is_proportional() {
        let mut case = TestCase::new("case");
        case.body.push(CaseItem::Assertion(Assertion::new(
            AssertionKind::Equal,
            "a",
        )));
        case.body
            .push(CaseItem::Assertion(unconvertible_assertion(3)));
        let mut file = TestFile::new("javascript");
        file.body.push(FileItem::TestCase(case));

        // Weights: case 3 + assertions 2+2 = 7, converted 5 → 71.
        let base = score_ir(&file, None);
        assert_eq!(base.confidence, 71);

        // Half the attempts succeeded → +round(2.5) = +3.
        let boosted = score_ir(
            &file,
            Some(EmitAttempts {
                attempted: 2,
                succeeded: 1,
            }),
        );
        assert_eq!(boosted.confidence, 74);

        // Zero successes → no boost.
        let unboosted = score_ir(
            &file,
            Some(EmitAttempts {
                attempted: 2,
                succeeded: 0,
            }),
        );
        assert_eq!(unboosted.confidence, 71);
    }

    #[test]
    fn level_boundaries() {
        assert_eq!(ConfidenceLevel::from_score(90), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(89), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(70), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(69), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(0), ConfidenceLevel::Low);
    }
}
