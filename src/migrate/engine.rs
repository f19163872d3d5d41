//! Project-wide migration orchestration.
//!
//! One `migrate` run owns the state document and the dependency graph.
//! Files are converted strictly in topological order (imports before
//! importers) so the rewriting pass can fix specifiers of files renamed
//! earlier in the same run. State is flushed after every file
//! transition, which is what makes `--continue` resumable after a kill.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;
use rayon::prelude::*;

use super::checklist::{ChecklistEntry, generate_checklist};
use super::classify::{Classification, FileKind, classify};
use super::graph::{build_graph, topo_sort};
use super::normalize::{NormalizeOutcome, normalize};
use super::recovery::{RECOVERY_CONFIDENCE, recover_line_by_line};
use super::rename::renamed_file_name;
use super::rewrite::rewrite_imports;
use super::scanner::scan_files;
use super::state::{FileEntry, FileStatus, LoadedState, MigrationState, StateStore};
use super::validate::{VALIDATION_CONFIDENCE_CAP, validate_output};
use crate::emitter::{EmitterRouter, EmitterStrategy};
use crate::error::{HamletError, Result};
use crate::ir::TestFile;
use crate::markers::{count_todos, count_warnings};
use crate::pipeline::{ConvertError, ConvertOptions, Converter};
use crate::registry::FrameworkRegistry;

pub const DEFAULT_STATE_DIR: &str = ".hamlet";

#[derive(Debug, Clone)]
pub struct MigrateOptions {
    pub source: String,
    pub target: String,
    pub language: Option<String>,
    pub include: Vec<String>,
    pub ignore: Vec<String>,
    pub state_dir: String,
    /// Resume: skip files the loaded state already marks converted.
    pub continue_run: bool,
    /// Retry: attempt only files the loaded state marks failed.
    pub retry_failed: bool,
    pub emitter: Option<EmitterStrategy>,
    pub experimental_ir: bool,
    pub verbose: bool,
}

impl MigrateOptions {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            language: None,
            include: Vec::new(),
            ignore: Vec::new(),
            state_dir: DEFAULT_STATE_DIR.to_string(),
            continue_run: false,
            retry_failed: false,
            emitter: None,
            experimental_ir: false,
            verbose: false,
        }
    }

    fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            emitter: self.emitter,
            experimental_ir: self.experimental_ir,
            language: self.language.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    Converted,
    Failed,
    Skipped,
    SkippedConverted,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::Converted => "converted",
            ProgressStatus::Failed => "failed",
            ProgressStatus::Skipped => "skipped",
            ProgressStatus::SkippedConverted => "skipped-converted",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileResult {
    pub rel_path: String,
    pub status: FileStatus,
    pub confidence: Option<u8>,
    pub warnings: usize,
    pub todos: usize,
    pub error: Option<String>,
    pub renamed_to: Option<String>,
}

#[derive(Debug)]
pub struct MigrationOutcome {
    pub results: Vec<FileResult>,
    pub checklist: String,
    pub state: MigrationState,
}

struct ScannedFile {
    path: PathBuf,
    rel: String,
    bytes: Vec<u8>,
    classification: Classification,
}

pub struct MigrationEngine<'a> {
    registry: &'a FrameworkRegistry,
    router: &'a EmitterRouter,
}

impl<'a> MigrationEngine<'a> {
    pub fn new(registry: &'a FrameworkRegistry, router: &'a EmitterRouter) -> Self {
        Self { registry, router }
    }

    pub fn migrate(
        &self,
        root: &Path,
        opts: &MigrateOptions,
        progress: &mut dyn FnMut(&str, ProgressStatus, Option<u8>),
    ) -> Result<MigrationOutcome> {
        let language = opts.language.as_deref();
        let source = self.registry.get(&opts.source, language).ok_or_else(|| {
            HamletError::UnknownFramework {
                name: opts.source.clone(),
                language: language.map(String::from),
            }
        })?;
        let target = self.registry.get(&opts.target, language).ok_or_else(|| {
            HamletError::UnknownFramework {
                name: opts.target.clone(),
                language: language.map(String::from),
            }
        })?;
        if source.name() == target.name() && source.language() == target.language() {
            return Err(HamletError::SameFramework {
                name: source.name().to_string(),
            });
        }

        // Phase 1: state.
        let store = StateStore::new(root.join(&opts.state_dir));
        let mut state = if opts.continue_run || opts.retry_failed {
            match store.load() {
                LoadedState::Loaded(state) => state,
                LoadedState::Missing => MigrationState::new(&opts.source, &opts.target),
                LoadedState::Corrupted(why) => {
                    eprintln!(
                        "{} migration state is corrupted ({why}); starting fresh",
                        "warning:".bold().yellow()
                    );
                    MigrationState::new(&opts.source, &opts.target)
                }
            }
        } else {
            MigrationState::new(&opts.source, &opts.target)
        };

        // Phase 2 + 3: scan and classify.
        let scan = scan_files(root, &opts.include, &opts.ignore, &opts.state_dir, opts.verbose);
        if opts.verbose && scan.skipped_count > 0 {
            eprintln!(
                "{} {} path(s) could not be accessed during scan",
                "warning:".bold().yellow(),
                scan.skipped_count
            );
        }
        let scanned: Vec<ScannedFile> = scan
            .files
            .par_iter()
            .filter_map(|path| {
                let bytes = fs::read(path).ok()?;
                let preview = String::from_utf8_lossy(&bytes);
                let classification = classify(path, &preview, self.registry);
                let rel = rel_path(root, path);
                Some(ScannedFile {
                    path: path.clone(),
                    rel,
                    bytes,
                    classification,
                })
            })
            .collect();

        // Phase 4 + 5: dependency graph over test and helper files.
        let graph_input: Vec<(PathBuf, String)> = scanned
            .iter()
            .filter(|f| {
                matches!(
                    f.classification.kind,
                    FileKind::Test | FileKind::Helper
                )
            })
            .map(|f| (f.path.clone(), String::from_utf8_lossy(&f.bytes).into_owned()))
            .collect();
        let build = build_graph(&graph_input);
        if opts.verbose {
            for warning in &build.warnings {
                eprintln!("{} {warning}", "warning:".bold().yellow());
            }
            for cycle in &build.graph.cycles {
                let joined: Vec<String> =
                    cycle.iter().map(|p| rel_path(root, p)).collect();
                eprintln!(
                    "{} import cycle: {}",
                    "warning:".bold().yellow(),
                    joined.join(" -> ")
                );
            }
        }

        let mut ordered: Vec<PathBuf> = topo_sort(&build.graph);
        for file in &scanned {
            if !build.graph.nodes.contains(&file.path) {
                ordered.push(file.path.clone());
            }
        }
        let by_path: BTreeMap<&Path, &ScannedFile> = scanned
            .iter()
            .map(|f| (f.path.as_path(), f))
            .collect();

        // Phase 6: conversion loop.
        let converter = Converter::new(self.registry, self.router);
        let convert_opts = opts.convert_options();
        let mut results: Vec<FileResult> = Vec::new();
        let mut renames: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();
        let mut config_notes: Vec<String> = Vec::new();

        for path in &ordered {
            let Some(file) = by_path.get(path.as_path()) else {
                continue;
            };
            let rel = file.rel.clone();
            let prior = state.files.get(&rel).cloned();

            if opts.retry_failed {
                let was_failed = prior
                    .as_ref()
                    .is_some_and(|e| e.status == FileStatus::Failed);
                if !was_failed {
                    let status = match prior.as_ref().map(|e| e.status) {
                        Some(FileStatus::Converted) => ProgressStatus::SkippedConverted,
                        _ => ProgressStatus::Skipped,
                    };
                    progress(&rel, status, prior.as_ref().and_then(|e| e.confidence));
                    continue;
                }
            } else if opts.continue_run
                && prior
                    .as_ref()
                    .is_some_and(|e| e.status == FileStatus::Converted)
            {
                progress(
                    &rel,
                    ProgressStatus::SkippedConverted,
                    prior.as_ref().and_then(|e| e.confidence),
                );
                continue;
            }

            match file.classification.kind {
                FileKind::Fixture | FileKind::TypeDef | FileKind::Other => {
                    let reason = format!(
                        "{} files are copied as-is",
                        file.classification.kind.as_str()
                    );
                    self.mark(
                        &store,
                        &mut state,
                        &mut results,
                        &rel,
                        FileEntry::skipped(&reason),
                        None,
                    )?;
                    progress(&rel, ProgressStatus::Skipped, None);
                    continue;
                }
                FileKind::Config => {
                    config_notes.push(format!(
                        "migrate `{rel}` to the {} configuration format",
                        target.name()
                    ));
                    self.mark(
                        &store,
                        &mut state,
                        &mut results,
                        &rel,
                        FileEntry::skipped("config files need manual migration"),
                        None,
                    )?;
                    progress(&rel, ProgressStatus::Skipped, None);
                    continue;
                }
                FileKind::Test | FileKind::Helper => {}
            }

            // Normalize input.
            let normalized = match normalize(&file.bytes) {
                NormalizeOutcome::Binary => {
                    if opts.verbose {
                        eprintln!(
                            "{} {rel} looks binary, skipping",
                            "warning:".bold().yellow()
                        );
                    }
                    self.mark(
                        &store,
                        &mut state,
                        &mut results,
                        &rel,
                        FileEntry::skipped("binary file"),
                        None,
                    )?;
                    progress(&rel, ProgressStatus::Skipped, None);
                    continue;
                }
                NormalizeOutcome::Text(normalized) => normalized,
            };
            let mut extra_warnings = normalized.issues.len();
            if opts.verbose {
                for issue in &normalized.issues {
                    eprintln!("{} {rel}: {issue}", "warning:".bold().yellow());
                }
            }

            // A file that already speaks the target dialect (e.g. the
            // output of an earlier run) is not a failure.
            if source.detect(&normalized.content) == 0
                && target.detect(&normalized.content) >= 50
            {
                self.mark(
                    &store,
                    &mut state,
                    &mut results,
                    &rel,
                    FileEntry::skipped("already in target framework"),
                    None,
                )?;
                progress(&rel, ProgressStatus::Skipped, None);
                continue;
            }

            // Convert, with recovery and the helper fallback.
            let converted = match converter.convert(
                &normalized.content,
                &opts.source,
                &opts.target,
                &convert_opts,
            ) {
                Ok(conversion) => Some((conversion.code, conversion.report.confidence)),
                Err(ConvertError::Parse(failure)) => {
                    match recover_line_by_line(&normalized.content, &failure, target.as_ref()) {
                        Some(code) => {
                            extra_warnings += 1;
                            Some((code, RECOVERY_CONFIDENCE))
                        }
                        None => {
                            self.mark(
                                &store,
                                &mut state,
                                &mut results,
                                &rel,
                                FileEntry::failed(failure.to_string()),
                                None,
                            )?;
                            progress(&rel, ProgressStatus::Failed, None);
                            continue;
                        }
                    }
                }
                Err(ConvertError::Fatal(HamletError::DetectionMismatch { .. }))
                    if file.classification.kind == FileKind::Helper =>
                {
                    // Helpers rarely score on detection; the baseline
                    // rewrite (imports, renamed APIs) is all they need.
                    let empty = TestFile::new(target.language());
                    Some((target.emit(&empty, &normalized.content), 100))
                }
                Err(ConvertError::Fatal(err @ HamletError::DetectionMismatch { .. })) => {
                    self.mark(
                        &store,
                        &mut state,
                        &mut results,
                        &rel,
                        FileEntry::failed(err.to_string()),
                        None,
                    )?;
                    progress(&rel, ProgressStatus::Failed, None);
                    continue;
                }
                Err(ConvertError::Fatal(err)) => return Err(err),
            };
            let (code, mut confidence) = converted.expect("handled above");

            // Validate output structure.
            let issues = validate_output(&code, &opts.source);
            if !issues.is_empty() {
                confidence = confidence.min(VALIDATION_CONFIDENCE_CAP);
                extra_warnings += issues.len();
                if opts.verbose {
                    for issue in &issues {
                        eprintln!("{} {rel}: {}", "warning:".bold().yellow(), issue.message);
                    }
                }
            }

            // Rename per target conventions and enforce path safety.
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let new_name = renamed_file_name(&file_name, &opts.source, &opts.target);
            let out_path = path.with_file_name(&new_name);
            if !out_path.starts_with(root) {
                return Err(HamletError::PathTraversal { path: out_path });
            }
            let renamed_to = if out_path != *path {
                renames.insert(path.clone(), out_path.clone());
                Some(rel_path(root, &out_path))
            } else {
                None
            };

            // Backup anything we are about to overwrite.
            if out_path.exists() {
                backup_file(&store, root, &out_path)?;
            }

            // Atomic write, then state, then progress.
            if let Err(err) = atomic_write(&out_path, &code) {
                self.mark(
                    &store,
                    &mut state,
                    &mut results,
                    &rel,
                    FileEntry::failed(err.to_string()),
                    renamed_to,
                )?;
                progress(&rel, ProgressStatus::Failed, None);
                continue;
            }

            let todos = count_todos(&code);
            let warnings = count_warnings(&code) + extra_warnings;
            self.mark(
                &store,
                &mut state,
                &mut results,
                &rel,
                FileEntry::converted(confidence),
                renamed_to,
            )?;
            if let Some(last) = results.last_mut() {
                last.warnings = warnings;
                last.todos = todos;
            }
            progress(&rel, ProgressStatus::Converted, Some(confidence));
        }

        // Phase 7: rewrite imports of renamed files.
        for result in &results {
            if result.status != FileStatus::Converted {
                continue;
            }
            let out_rel = result.renamed_to.as_ref().unwrap_or(&result.rel_path);
            let out_path = root.join(out_rel);
            let Ok(content) = fs::read_to_string(&out_path) else {
                continue;
            };
            let (updated, count) = rewrite_imports(&out_path, &content, &renames);
            if count > 0 {
                atomic_write(&out_path, &updated)?;
            }
        }

        // Phase 8: checklist.
        let entries: Vec<ChecklistEntry> = results
            .iter()
            .map(|r| ChecklistEntry {
                path: r.rel_path.clone(),
                status: r.status,
                confidence: r.confidence,
                warnings: r.warnings,
                todos: r.todos,
                error: r.error.clone(),
                renamed_to: r.renamed_to.clone(),
            })
            .collect();
        let checklist =
            generate_checklist(source.name(), target.name(), &entries, &config_notes);
        fs::create_dir_all(store.dir())
            .map_err(|e| HamletError::io(format!("creating {}", store.dir().display()), e))?;
        atomic_write(&store.dir().join("checklist.md"), &checklist)?;

        // Phase 9: final state save.
        store.save(&state)?;

        Ok(MigrationOutcome {
            results,
            checklist,
            state,
        })
    }

    /// Record a file transition: update the in-memory state, flush it to
    /// disk, and mirror it into the results list.
    fn mark(
        &self,
        store: &StateStore,
        state: &mut MigrationState,
        results: &mut Vec<FileResult>,
        rel: &str,
        entry: FileEntry,
        renamed_to: Option<String>,
    ) -> Result<()> {
        state.files.insert(rel.to_string(), entry.clone());
        store.save(state)?;
        results.push(FileResult {
            rel_path: rel.to_string(),
            status: entry.status,
            confidence: entry.confidence,
            warnings: 0,
            todos: 0,
            error: entry.error,
            renamed_to,
        });
        Ok(())
    }
}

fn rel_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Write-then-rename into the final path; the temporary lives alongside
/// its target and never survives a successful write.
pub(crate) fn atomic_write(path: &Path, contents: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!("{file_name}.hamlet.tmp"));
    fs::write(&tmp, contents)
        .map_err(|e| HamletError::io(format!("writing {}", tmp.display()), e))?;
    fs::rename(&tmp, path)
        .map_err(|e| HamletError::io(format!("renaming into {}", path.display()), e))?;
    Ok(())
}

/// Copy a file into `<stateDir>/backups/`, mirroring its project path.
fn backup_file(store: &StateStore, root: &Path, path: &Path) -> Result<()> {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let backup_path = store.backups_dir().join(rel);
    if let Some(parent) = backup_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| HamletError::io(format!("creating {}", parent.display()), e))?;
    }
    fs::copy(path, &backup_path)
        .map_err(|e| HamletError::io(format!("backing up {}", path.display()), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn engine_parts() -> (FrameworkRegistry, EmitterRouter) {
        (FrameworkRegistry::with_builtins(), EmitterRouter::with_builtins())
    }

    fn run(
        root: &Path,
        opts: &MigrateOptions,
    ) -> (MigrationOutcome, Vec<(String, &'static str, Option<u8>)>) {
        let (registry, router) = engine_parts();
        let engine = MigrationEngine::new(&registry, &router);
        let mut events = Vec::new();
        let outcome = engine
            .migrate(root, opts, &mut |rel, status, confidence| {
                events.push((rel.to_string(), status.as_str(), confidence));
            })
            .unwrap();
        (outcome, events)
    }

    #[test]
    fn helper_is_converted_before_its_dependent_test() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "helper.js",
            "export function visitHome() {\n  return '/';\n}\n",
        );
        write(
            dir.path(),
            "math.test.js",
            "\
import { visitHome } from './helper.js';

describe('math', () => {
  it('adds', () => {
    expect(add(1, 2)).toEqual(3);
  });
});
",
        );

        let opts = MigrateOptions::new("jest", "vitest");
        let (outcome, events) = run(dir.path(), &opts);

        assert_eq!(events[0].0, "helper.js");
        assert_eq!(events[1].0, "math.test.js");
        assert_eq!(events[1].1, "converted");
        let (converted, _, failed) = outcome.state.counts();
        assert_eq!((converted, failed), (2, 0));

        let output = fs::read_to_string(dir.path().join("math.test.js")).unwrap();
        assert!(output.contains("from 'vitest'"));
    }

    #[test]
    fn cypress_rename_rewrites_dependent_imports() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "helpers.cy.js",
            "\
describe('helpers', () => {
  it('loads', () => {
    cy.visit('/');
  });
});
",
        );
        write(
            dir.path(),
            "login.cy.js",
            "\
import { fillLogin } from './helpers.cy.js';

describe('login', () => {
  it('works', () => {
    cy.visit('/login');
    cy.get('.error').should('be.visible');
  });
});
",
        );

        let opts = MigrateOptions::new("cypress", "playwright");
        let (outcome, _) = run(dir.path(), &opts);

        let login = outcome
            .results
            .iter()
            .find(|r| r.rel_path == "login.cy.js")
            .unwrap();
        assert_eq!(login.renamed_to.as_deref(), Some("login.spec.js"));

        let rewritten = fs::read_to_string(dir.path().join("login.spec.js")).unwrap();
        assert!(rewritten.contains("from './helpers.spec.js'"));
        assert!(rewritten.contains("await page.goto('/login');"));
        assert!(dir.path().join("helpers.spec.js").exists());
    }

    #[test]
    fn resume_skips_converted_files() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "a.test.js",
            "describe('a', () => {\n  it('x', () => {\n    expect(1).toBe(1);\n  });\n});\n",
        );

        let opts = MigrateOptions::new("jest", "vitest");
        let (_, first_events) = run(dir.path(), &opts);
        assert_eq!(first_events[0].1, "converted");

        let resume_opts = MigrateOptions {
            continue_run: true,
            ..opts
        };
        let (_, second_events) = run(dir.path(), &resume_opts);
        assert_eq!(second_events[0].1, "skipped-converted");
    }

    #[test]
    fn retry_failed_only_touches_failed_files() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "good.test.js",
            "describe('g', () => {\n  it('x', () => {\n    expect(1).toBe(1);\n  });\n});\n",
        );

        let opts = MigrateOptions::new("jest", "vitest");
        run(dir.path(), &opts);

        let retry_opts = MigrateOptions {
            retry_failed: true,
            ..opts
        };
        let (_, events) = run(dir.path(), &retry_opts);
        assert_eq!(events[0].1, "skipped-converted");
    }

    #[test]
    fn fixtures_and_binaries_are_skipped_with_reasons() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "fixtures/user.json", "{\"name\": \"u\"}");
        fs::write(dir.path().join("image.test.js"), b"\x00\x01binary").unwrap();

        let opts = MigrateOptions::new("jest", "vitest");
        let (outcome, _) = run(dir.path(), &opts);

        let fixture = &outcome.state.files["fixtures/user.json"];
        assert_eq!(fixture.status, FileStatus::Skipped);
        let binary = &outcome.state.files["image.test.js"];
        assert_eq!(binary.status, FileStatus::Skipped);
        assert_eq!(binary.reason.as_deref(), Some("binary file"));
    }

    #[test]
    fn checklist_and_state_are_written_under_the_state_dir() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "a.test.js",
            "describe('a', () => {\n  it('x', () => {\n    expect(1).toBe(1);\n  });\n});\n",
        );

        let opts = MigrateOptions::new("jest", "vitest");
        run(dir.path(), &opts);

        assert!(dir.path().join(".hamlet/state.json").exists());
        assert!(dir.path().join(".hamlet/checklist.md").exists());
    }

    #[test]
    fn unknown_target_framework_is_fatal() {
        let dir = TempDir::new().unwrap();
        let (registry, router) = engine_parts();
        let engine = MigrationEngine::new(&registry, &router);
        let err = engine
            .migrate(
                dir.path(),
                &MigrateOptions::new("jest", "nope"),
                &mut |_, _, _| {},
            )
            .unwrap_err();
        assert!(matches!(err, HamletError::UnknownFramework { .. }));
    }
}
