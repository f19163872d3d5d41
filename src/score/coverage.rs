//! IR-emitter coverage accounting.
//!
//! Coverage is restricted to the leaf emittable variants (assertions,
//! navigations, mock calls) since those are the only nodes a structural
//! emitter is asked to produce.

use serde::Serialize;

/// Per-variant counts of how many nodes the active IR emitter supports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IrCoverage {
    pub supported_assertions: usize,
    pub unsupported_assertions: usize,
    pub supported_navigations: usize,
    pub unsupported_navigations: usize,
    pub supported_mock_calls: usize,
    pub unsupported_mock_calls: usize,
    /// Union of kind strings the emitter declined, sorted and deduped.
    pub unsupported_kinds: Vec<String>,
    pub coverage_percent: u8,
}

impl IrCoverage {
    pub fn record_assertion(&mut self, supported: bool, kind: &str) {
        if supported {
            self.supported_assertions += 1;
        } else {
            self.unsupported_assertions += 1;
            self.push_kind(kind);
        }
    }

    pub fn record_navigation(&mut self, supported: bool, action: &str) {
        if supported {
            self.supported_navigations += 1;
        } else {
            self.unsupported_navigations += 1;
            self.push_kind(action);
        }
    }

    pub fn record_mock_call(&mut self, supported: bool, kind: &str) {
        if supported {
            self.supported_mock_calls += 1;
        } else {
            self.unsupported_mock_calls += 1;
            self.push_kind(kind);
        }
    }

    fn push_kind(&mut self, kind: &str) {
        if !self.unsupported_kinds.iter().any(|k| k == kind) {
            self.unsupported_kinds.push(kind.to_string());
        }
    }

    pub fn supported(&self) -> usize {
        self.supported_assertions + self.supported_navigations + self.supported_mock_calls
    }

    pub fn total(&self) -> usize {
        self.supported()
            + self.unsupported_assertions
            + self.unsupported_navigations
            + self.unsupported_mock_calls
    }

    /// Finalize: sort the kind union and compute the percentage.
    pub fn finish(mut self) -> Self {
        self.unsupported_kinds.sort();
        self.coverage_percent = if self.total() == 0 {
            100
        } else {
            ((100.0 * self.supported() as f64 / self.total() as f64).round()) as u8
        };
        self
    }
}
