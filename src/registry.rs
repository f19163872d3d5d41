//! Framework plugin contract and registry.
//!
//! A plugin bundles detection, parsing, regex-baseline emission, and an
//! import-rewriting table for one test framework. The registry owns
//! plugins for the process lifetime, keyed by `"{language}:{name}"`.
//! After startup the only supported mutation is a last-writer-wins
//! re-register (used by tests); `clear` exists for test isolation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{HamletError, ParseFailure, Result};
use crate::ir::TestFile;

/// Structural idiom of a framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paradigm {
    /// `describe`/`it` nesting (Jest, Vitest, Cypress, Playwright, Mocha).
    Bdd,
    /// Class-per-suite with annotated methods (JUnit, unittest).
    Xunit,
    /// Free functions named by convention (pytest).
    Function,
}

impl fmt::Display for Paradigm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Paradigm::Bdd => "bdd",
            Paradigm::Xunit => "xunit",
            Paradigm::Function => "function",
        };
        write!(f, "{name}")
    }
}

/// Import-rewriting table for one framework.
///
/// `modules` are the specifiers the framework owns (used for residue
/// detection and rewriting away from it); `replacements` map foreign
/// specifiers to this framework's equivalents when emitting toward it.
#[derive(Debug, Clone, Default)]
pub struct ImportTable {
    pub modules: Vec<&'static str>,
    pub replacements: BTreeMap<&'static str, &'static str>,
}

impl ImportTable {
    pub fn owns(&self, specifier: &str) -> bool {
        self.modules.iter().any(|m| *m == specifier)
    }

    pub fn replacement_for(&self, specifier: &str) -> Option<&'static str> {
        self.replacements.get(specifier).copied()
    }
}

/// One test framework's conversion surface.
///
/// `detect` returns 0–100; `parse` returns a result variant so callers
/// can pattern-match into the recovery path; `emit` is the regex
/// baseline and receives both the IR and the original source.
pub trait FrameworkPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn language(&self) -> &str;
    fn paradigm(&self) -> Paradigm;
    fn detect(&self, src: &str) -> u8;
    fn parse(&self, src: &str) -> std::result::Result<TestFile, ParseFailure>;
    fn emit(&self, ir: &TestFile, src: &str) -> String;
    fn imports(&self) -> &ImportTable;
}

/// Registry of framework plugins, read-only after startup.
#[derive(Default)]
pub struct FrameworkRegistry {
    plugins: BTreeMap<String, Arc<dyn FrameworkPlugin>>,
}

impl FrameworkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with every built-in plugin.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::frameworks::register_builtins(&mut registry);
        registry
    }

    /// Register a plugin under `"{language}:{name}"`.
    ///
    /// Rejects plugins with an empty name or language. Registering the
    /// same key twice overwrites (last writer wins).
    pub fn register(&mut self, plugin: Arc<dyn FrameworkPlugin>) -> Result<()> {
        if plugin.name().is_empty() || plugin.language().is_empty() {
            return Err(HamletError::InvalidPlugin {
                reason: "plugin name and language must be non-empty".to_string(),
            });
        }
        let key = registry_key(plugin.language(), plugin.name());
        self.plugins.insert(key, plugin);
        Ok(())
    }

    /// Exact lookup when `language` is given; otherwise the first plugin
    /// (in key order, which is deterministic) whose name matches.
    pub fn get(&self, name: &str, language: Option<&str>) -> Option<Arc<dyn FrameworkPlugin>> {
        match language {
            Some(lang) => self.plugins.get(&registry_key(lang, name)).cloned(),
            None => self
                .plugins
                .values()
                .find(|p| p.name() == name)
                .cloned(),
        }
    }

    pub fn has(&self, name: &str, language: Option<&str>) -> bool {
        self.get(name, language).is_some()
    }

    /// All plugins, optionally restricted to one language, in key order.
    pub fn list(&self, language: Option<&str>) -> Vec<Arc<dyn FrameworkPlugin>> {
        self.plugins
            .values()
            .filter(|p| language.is_none_or(|lang| p.language() == lang))
            .cloned()
            .collect()
    }

    /// Drop every plugin. Test isolation only.
    pub fn clear(&mut self) {
        self.plugins.clear();
    }
}

fn registry_key(language: &str, name: &str) -> String {
    format!("{language}:{name}")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    struct FakePlugin {
        name: &'static str,
        language: &'static str,
        imports: ImportTable,
    }

    impl FakePlugin {
        fn boxed(name: &'static str, language: &'static str) -> Arc<dyn FrameworkPlugin> {
            Arc::new(Self {
                name,
                language,
                imports: ImportTable::default(),
            })
        }
    }

    impl FrameworkPlugin for FakePlugin {
        fn name(&self) -> &str {
            self.name
        }
        fn language(&self) -> &str {
            self.language
        }
        fn paradigm(&self) -> Paradigm {
            Paradigm::Bdd
        }
        fn detect(&self, _src: &str) -> u8 {
            50
        }
        fn parse(&self, _src: &str) -> std::result::Result<TestFile, ParseFailure> {
            Ok(TestFile::new(self.language))
        }
        fn emit(&self, _ir: &TestFile, src: &str) -> String {
            src.to_string()
        }
        fn imports(&self) -> &ImportTable {
            &self.imports
        }
    }

    #[test]
    fn register_and_exact_get() {
        let mut registry = FrameworkRegistry::new();
        registry
            .register(FakePlugin::boxed("jest", "javascript"))
            .unwrap();

        assert!(registry.has("jest", Some("javascript")));
        assert!(!registry.has("jest", Some("python")));
        assert!(registry.has("jest", None));
    }

    #[test]
    fn nameless_plugin_is_rejected() {
        let mut registry = FrameworkRegistry::new();
        let err = registry
            .register(FakePlugin::boxed("", "javascript"))
            .unwrap_err();
        assert!(err.to_string().contains("non-empty"));
    }

    #[test]
    fn duplicate_register_overwrites() {
        let mut registry = FrameworkRegistry::new();
        registry
            .register(FakePlugin::boxed("jest", "javascript"))
            .unwrap();
        registry
            .register(FakePlugin::boxed("jest", "javascript"))
            .unwrap();
        assert_eq!(registry.list(None).len(), 1);
    }

    #[test]
    fn get_without_language_takes_first_in_key_order() {
        let mut registry = FrameworkRegistry::new();
        registry
            .register(FakePlugin::boxed("unittest", "python"))
            .unwrap();
        registry
            .register(FakePlugin::boxed("unittest", "java"))
            .unwrap();

        // "java:unittest" sorts before "python:unittest".
        let plugin = registry.get("unittest", None).unwrap();
        assert_eq!(plugin.language(), "java");
    }

    #[test]
    fn list_filters_by_language() {
        let mut registry = FrameworkRegistry::new();
        registry
            .register(FakePlugin::boxed("jest", "javascript"))
            .unwrap();
        registry
            .register(FakePlugin::boxed("pytest", "python"))
            .unwrap();

        let js = registry.list(Some("javascript"));
        assert_eq!(js.len(), 1);
        assert_eq!(js[0].name(), "jest");
        assert_eq!(registry.list(None).len(), 2);
    }

    #[test]
    fn clear_empties_the_registry() {
        let mut registry = FrameworkRegistry::new();
        registry
            .register(FakePlugin::boxed("jest", "javascript"))
            .unwrap();
        registry.clear();
        assert!(registry.list(None).is_empty());
    }
}
