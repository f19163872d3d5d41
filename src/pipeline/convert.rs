//! The pipeline driver.

use thiserror::Error;

use super::{ConvertOptions, transform_paradigm};
use crate::emitter::{EmitPath, EmitterRouter};
use crate::error::{HamletError, ParseFailure};
use crate::registry::FrameworkRegistry;
use crate::score::{ConfidenceReport, score_ir};

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub code: String,
    pub report: ConfidenceReport,
    /// Which emission path actually produced the output.
    pub emit_path: EmitPath,
}

/// Pipeline failure split: parse failures drive the engine's recovery
/// path; everything else propagates.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Fatal(#[from] HamletError),
    #[error(transparent)]
    Parse(#[from] ParseFailure),
}

/// Borrowing view over the process-wide registry and emitter table.
pub struct Converter<'a> {
    registry: &'a FrameworkRegistry,
    router: &'a EmitterRouter,
}

impl<'a> Converter<'a> {
    pub fn new(registry: &'a FrameworkRegistry, router: &'a EmitterRouter) -> Self {
        Self { registry, router }
    }

    /// Convert one source file between frameworks.
    pub fn convert(
        &self,
        src: &str,
        source_name: &str,
        target_name: &str,
        opts: &ConvertOptions,
    ) -> Result<Conversion, ConvertError> {
        let language = opts.language.as_deref();
        let source = self.registry.get(source_name, language).ok_or_else(|| {
            HamletError::UnknownFramework {
                name: source_name.to_string(),
                language: language.map(String::from),
            }
        })?;
        let target = self.registry.get(target_name, language).ok_or_else(|| {
            HamletError::UnknownFramework {
                name: target_name.to_string(),
                language: language.map(String::from),
            }
        })?;
        if source.name() == target.name() && source.language() == target.language() {
            return Err(HamletError::SameFramework {
                name: source.name().to_string(),
            }
            .into());
        }

        if !src.trim().is_empty() && source.detect(src) == 0 {
            return Err(HamletError::DetectionMismatch {
                framework: source.name().to_string(),
            }
            .into());
        }

        let ir = source.parse(src)?;
        let ir = transform_paradigm(ir, source.paradigm(), target.paradigm());

        let outcome = self
            .router
            .emit(&ir, src, target.as_ref(), opts.strategy());

        let mut report = score_ir(&ir, outcome.attempts);
        report.ir_coverage = outcome.coverage;

        Ok(Conversion {
            code: outcome.code,
            report,
            emit_path: outcome.path,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::emitter::EmitterStrategy;
    use crate::score::ConfidenceLevel;

    fn converter_parts() -> (FrameworkRegistry, EmitterRouter) {
        (FrameworkRegistry::with_builtins(), EmitterRouter::with_builtins())
    }

    #[test]
    fn unknown_framework_is_fatal() {
        let (registry, router) = converter_parts();
        let converter = Converter::new(&registry, &router);
        let err = converter
            .convert("x", "jasmine", "vitest", &ConvertOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Fatal(HamletError::UnknownFramework { .. })
        ));
    }

    #[test]
    fn same_framework_is_fatal() {
        let (registry, router) = converter_parts();
        let converter = Converter::new(&registry, &router);
        let err = converter
            .convert("x", "jest", "jest", &ConvertOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Fatal(HamletError::SameFramework { .. })
        ));
    }

    #[test]
    fn zero_detection_on_nonempty_input_is_a_mismatch() {
        let (registry, router) = converter_parts();
        let converter = Converter::new(&registry, &router);
        let err = converter
            .convert(
                "SELECT * FROM users;",
                "playwright",
                "cypress",
                &ConvertOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Fatal(HamletError::DetectionMismatch { .. })
        ));
    }

    #[test]
    fn empty_input_skips_detection_and_scores_high() {
        let (registry, router) = converter_parts();
        let converter = Converter::new(&registry, &router);
        let conversion = converter
            .convert("", "jest", "vitest", &ConvertOptions::default())
            .unwrap();
        assert_eq!(conversion.report.confidence, 100);
        assert_eq!(conversion.report.level, ConfidenceLevel::High);
    }

    #[test]
    fn jest_to_vitest_legacy_end_to_end() {
        let (registry, router) = converter_parts();
        let converter = Converter::new(&registry, &router);
        let src = "\
describe('math', () => {
  it('adds', () => {
    expect(add(1, 2)).toEqual(3);
  });
});
";
        let conversion = converter
            .convert(src, "jest", "vitest", &ConvertOptions::default())
            .unwrap();
        assert_eq!(conversion.emit_path, EmitPath::Legacy);
        assert!(conversion.code.contains("from 'vitest'"));
        assert!(conversion.code.contains("expect(add(1, 2)).toEqual(3);"));
        assert_eq!(conversion.report.confidence, 100);
        assert!(conversion.report.ir_coverage.is_none());
    }

    /// One supported and one out-of-vocabulary assertion under ir-patch:
    /// coverage splits 1/1 at fifty percent, the supported line is the
    /// structural rendition, the unknown one keeps the baseline output.
    #[test]
    fn cypress_to_playwright_ir_patch_partial_coverage() {
        let (registry, router) = converter_parts();
        let converter = Converter::new(&registry, &router);
        let src = "\
describe('login', () => {
  it('shows the error', () => {
    cy.get('.error').should('be.visible');
    cy.get('.badge').should('have.glow');
  });
});
";
        let opts = ConvertOptions::default().with_strategy(EmitterStrategy::IrPatch);
        let conversion = converter
            .convert(src, "cypress", "playwright", &opts)
            .unwrap();
        assert_eq!(conversion.emit_path, EmitPath::IrPatch);

        let coverage = conversion.report.ir_coverage.as_ref().unwrap();
        assert_eq!(coverage.supported_assertions, 1);
        assert_eq!(coverage.unsupported_assertions, 1);
        assert_eq!(coverage.coverage_percent, 50);
        assert_eq!(coverage.unsupported_kinds, vec!["have.glow"]);

        assert!(conversion
            .code
            .contains("await expect(page.locator('.error')).toBeVisible();"));
        // The unknown chainer keeps the baseline's TODO rendition.
        assert!(conversion.code.contains("HAMLET-TODO"));
        assert!(conversion
            .code
            .contains("Original: cy.get('.badge').should('have.glow');"));
    }

    #[test]
    fn pytest_to_unittest_wraps_and_emits_a_class() {
        let (registry, router) = converter_parts();
        let converter = Converter::new(&registry, &router);
        let src = "\
def test_add():
    assert add(1, 2) == 3
";
        let conversion = converter
            .convert(src, "pytest", "unittest", &ConvertOptions::default())
            .unwrap();
        assert!(conversion.code.contains("class Tests(unittest.TestCase):"));
        assert!(conversion.code.contains("def test_add(self):"));
        assert!(conversion
            .code
            .contains("self.assertEqual(add(1, 2), 3)"));
        assert_eq!(conversion.report.confidence, 100);
    }

    #[test]
    fn auto_strategy_uses_full_file_for_vitest() {
        let (registry, router) = converter_parts();
        let converter = Converter::new(&registry, &router);
        let src = "\
describe('math', () => {
  it('adds', () => {
    expect(add(1, 2)).toEqual(3);
  });
});
";
        let opts = ConvertOptions::default().with_strategy(EmitterStrategy::Auto);
        let conversion = converter.convert(src, "jest", "vitest", &opts).unwrap();
        assert_eq!(conversion.emit_path, EmitPath::IrFull);
        assert!(conversion
            .code
            .starts_with("import { describe, it, expect } from 'vitest';"));
    }

    #[test]
    fn parse_failures_surface_as_the_parse_variant() {
        let (registry, router) = converter_parts();
        let converter = Converter::new(&registry, &router);
        let src = "describe('broken', () => {\n  it('x', () => {\n    expect(1).toBe(1);\n";
        let err = converter
            .convert(src, "jest", "vitest", &ConvertOptions::default())
            .unwrap_err();
        assert!(matches!(err, ConvertError::Parse(_)));
    }
}
