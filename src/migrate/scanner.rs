//! Project scanning.
//!
//! Walks the migration root collecting candidate files, honoring include
//! and ignore patterns. Literal paths are matched by prefix, wildcard
//! patterns by glob. The state directory and the usual vendored trees
//! are always excluded.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use colored::Colorize;
use glob::Pattern;
use walkdir::WalkDir;

/// Directories never worth scanning.
const ALWAYS_IGNORED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "target",
    "__pycache__",
    ".venv",
    "venv",
];

/// Extensions and special names the migration cares about.
const SCANNABLE_EXTENSIONS: &[&str] = &[
    "js", "jsx", "ts", "tsx", "mjs", "cjs", "py", "java", "json", "xml", "gradle", "ini",
];

fn is_glob_pattern(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

pub struct ScanResult {
    /// Sorted for deterministic downstream ordering.
    pub files: Vec<PathBuf>,
    pub skipped_count: usize,
}

pub fn scan_files(
    root: &Path,
    includes: &[String],
    ignores: &[String],
    state_dir_name: &str,
    verbose: bool,
) -> ScanResult {
    let mut files: BTreeSet<PathBuf> = BTreeSet::new();
    let mut skipped_count = 0usize;

    let mut literal_ignores: Vec<PathBuf> = vec![root.join(state_dir_name)];
    let mut glob_ignores: Vec<Pattern> = Vec::new();
    for pattern in ignores {
        if is_glob_pattern(pattern) {
            match Pattern::new(pattern) {
                Ok(compiled) => glob_ignores.push(compiled),
                Err(err) => {
                    if verbose {
                        eprintln!(
                            "{} Invalid ignore pattern '{}': {}",
                            "warning:".bold().yellow(),
                            pattern,
                            err
                        );
                    }
                }
            }
        } else {
            literal_ignores.push(root.join(pattern));
        }
    }

    let dirs_to_scan: Vec<PathBuf> = if includes.is_empty() {
        vec![root.to_path_buf()]
    } else {
        includes
            .iter()
            .filter_map(|include| {
                let path = root.join(include);
                if path.exists() {
                    Some(path)
                } else {
                    if verbose {
                        eprintln!(
                            "{} Include path does not exist: {}",
                            "warning:".bold().yellow(),
                            path.display()
                        );
                    }
                    None
                }
            })
            .collect()
    };

    for dir in dirs_to_scan {
        for entry in WalkDir::new(dir).into_iter().filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            !(e.file_type().is_dir() && ALWAYS_IGNORED_DIRS.contains(&name.as_ref()))
        }) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    skipped_count += 1;
                    if verbose {
                        eprintln!("{} Cannot access path: {}", "warning:".bold().yellow(), err);
                    }
                    continue;
                }
            };
            let path = entry.path();
            if literal_ignores.iter().any(|ignore| path.starts_with(ignore)) {
                continue;
            }
            let path_str = path.to_string_lossy();
            if glob_ignores.iter().any(|pattern| pattern.matches(&path_str)) {
                continue;
            }
            if path.is_file() && is_scannable(path) {
                files.insert(path.to_path_buf());
            }
        }
    }

    ScanResult {
        files: files.into_iter().collect(),
        skipped_count,
    }
}

fn is_scannable(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => SCANNABLE_EXTENSIONS.contains(&ext),
        None => matches!(
            path.file_name().and_then(|n| n.to_str()),
            Some(".mocharc" | "pytest.ini")
        ),
    }
}
