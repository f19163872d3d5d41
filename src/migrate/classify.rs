//! File classification.
//!
//! Combines path heuristics (test name patterns, config file names,
//! fixture directories, type definitions) with registry detection over
//! the content to decide what each scanned file is and which framework
//! wrote it.

use std::path::Path;

use crate::registry::FrameworkRegistry;

/// Framework-config file names dispatched to the config bucket.
const CONFIG_STEMS: &[&str] = &[
    "jest.config",
    "cypress.config",
    "playwright.config",
    "vitest.config",
    ".mocharc",
];
const CONFIG_NAMES: &[&str] = &["pytest.ini", "testng.xml", "build.gradle", "pom.xml", "tox.ini"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Test,
    Helper,
    Config,
    Fixture,
    TypeDef,
    Other,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Test => "test",
            FileKind::Helper => "helper",
            FileKind::Config => "config",
            FileKind::Fixture => "fixture",
            FileKind::TypeDef => "type-def",
            FileKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Classification {
    pub kind: FileKind,
    pub framework: Option<String>,
}

/// Score threshold above which content detection counts as a match.
const DETECT_THRESHOLD: u8 = 30;

pub fn classify(path: &Path, content: &str, registry: &FrameworkRegistry) -> Classification {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if file_name.ends_with(".d.ts") {
        return Classification {
            kind: FileKind::TypeDef,
            framework: None,
        };
    }
    if is_config_name(&file_name) {
        return Classification {
            kind: FileKind::Config,
            framework: None,
        };
    }
    if path_has_dir(path, "fixtures") {
        return Classification {
            kind: FileKind::Fixture,
            framework: None,
        };
    }

    let language = language_for(path);
    let detected = best_detection(content, language, registry);

    let test_named = file_name.contains(".test.")
        || file_name.contains(".spec.")
        || file_name.contains(".cy.")
        || file_name.starts_with("test_")
        || file_name.ends_with("Test.java")
        || path_has_dir(path, "__tests__");

    if test_named || detected.is_some() {
        return Classification {
            kind: FileKind::Test,
            framework: detected,
        };
    }

    match language {
        Some(_) => Classification {
            kind: FileKind::Helper,
            framework: None,
        },
        None => Classification {
            kind: FileKind::Other,
            framework: None,
        },
    }
}

fn is_config_name(file_name: &str) -> bool {
    CONFIG_NAMES.contains(&file_name)
        || CONFIG_STEMS
            .iter()
            .any(|stem| file_name.starts_with(stem))
}

fn path_has_dir(path: &Path, dir: &str) -> bool {
    path.components()
        .any(|c| c.as_os_str().to_string_lossy() == dir)
}

/// Source language by extension, `None` for non-code files.
pub fn language_for(path: &Path) -> Option<&'static str> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("js" | "jsx" | "ts" | "tsx" | "mjs" | "cjs") => Some("javascript"),
        Some("py") => Some("python"),
        Some("java") => Some("java"),
        _ => None,
    }
}

/// Best-scoring plugin for the content, restricted to the file's
/// language. Ties break toward the first plugin in registry order.
fn best_detection(
    content: &str,
    language: Option<&str>,
    registry: &FrameworkRegistry,
) -> Option<String> {
    let language = language?;
    let mut best: Option<(u8, String)> = None;
    for plugin in registry.list(Some(language)) {
        let score = plugin.detect(content);
        if score >= DETECT_THRESHOLD && best.as_ref().is_none_or(|(s, _)| score > *s) {
            best = Some((score, plugin.name().to_string()));
        }
    }
    best.map(|(_, name)| name)
}
