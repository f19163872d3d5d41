//! Error types for the conversion core.
//!
//! Fatal conditions are a `thiserror` enum (`HamletError`) and propagate
//! with `?`. Recoverable conditions are plain values: `ParseFailure` is
//! returned in `Err` position by plugin parsers and drives the line-by-line
//! recovery path; normalization and validation produce issue lists that are
//! reported, never thrown.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors raised by the pipeline, the registry, and the engine.
///
/// Everything here propagates to the caller. Per-file recoverable
/// conditions (parse failures, validation issues) are not errors.
#[derive(Debug, Error)]
pub enum HamletError {
    /// No plugin registered under the requested name (and language).
    #[error("unknown framework: {name}{}", language_suffix(.language))]
    UnknownFramework {
        name: String,
        language: Option<String>,
    },

    /// Source and target resolve to the same plugin.
    #[error("source and target framework are both '{name}'")]
    SameFramework { name: String },

    /// The source plugin scored 0 on a non-empty input.
    #[error("input does not look like {framework} (detection score 0)")]
    DetectionMismatch { framework: String },

    /// A plugin failed contract validation at registration.
    #[error("invalid plugin: {reason}")]
    InvalidPlugin { reason: String },

    /// A resolved output path escapes the project root.
    #[error("refusing to write outside project root: {path}")]
    PathTraversal { path: PathBuf },

    /// An I/O failure with the path it happened on.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl HamletError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

fn language_suffix(language: &Option<String>) -> String {
    match language {
        Some(lang) => format!(" ({lang})"),
        None => String::new(),
    }
}

/// A parser could not produce an IR for the file.
///
/// Carried as a value so the engine can pattern-match and enter the
/// per-line recovery path instead of catching an unwind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub message: String,
    /// 1-based line where parsing stopped, when known.
    pub line: Option<usize>,
}

impl ParseFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
        }
    }

    pub fn at_line(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line: Some(line),
        }
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "parse failure at line {}: {}", line, self.message),
            None => write!(f, "parse failure: {}", self.message),
        }
    }
}

impl std::error::Error for ParseFailure {}

pub type Result<T> = std::result::Result<T, HamletError>;

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn unknown_framework_message_includes_language() {
        let err = HamletError::UnknownFramework {
            name: "jasmine".to_string(),
            language: Some("javascript".to_string()),
        };
        assert_eq!(err.to_string(), "unknown framework: jasmine (javascript)");

        let err = HamletError::UnknownFramework {
            name: "jasmine".to_string(),
            language: None,
        };
        assert_eq!(err.to_string(), "unknown framework: jasmine");
    }

    #[test]
    fn parse_failure_display_with_line() {
        let failure = ParseFailure::at_line("unbalanced describe block", 12);
        assert_eq!(
            failure.to_string(),
            "parse failure at line 12: unbalanced describe block"
        );
    }
}
