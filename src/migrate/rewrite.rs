//! Import rewriting after renames.
//!
//! Once files have moved to their target names, every converted file
//! that imports a renamed file gets its specifiers updated in place.
//! Only relative specifiers that actually resolve to a renamed path are
//! touched; bare package specifiers, comments, and substring lookalikes
//! are preserved byte for byte.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::graph::resolve_relative;
use super::imports::extract_import_specifiers;

/// Rewrite the specifiers of `content` (a file at `path`) against the
/// renames map (absolute old path → absolute new path). Returns the new
/// content and how many specifiers changed.
pub fn rewrite_imports(
    path: &Path,
    content: &str,
    renames: &BTreeMap<PathBuf, PathBuf>,
) -> (String, usize) {
    if renames.is_empty() {
        return (content.to_string(), 0);
    }

    let mut lines: Vec<String> = content.lines().map(String::from).collect();
    let mut rewritten = 0usize;

    for import in extract_import_specifiers(content) {
        if !import.is_relative() {
            continue;
        }
        let Some(resolved) = resolve_relative(path, &import.specifier) else {
            continue;
        };
        let Some(new_path) = renames.get(&resolved) else {
            continue;
        };
        let Some(new_specifier) = remap_specifier(&import.specifier, &resolved, new_path) else {
            continue;
        };
        if new_specifier == import.specifier {
            continue;
        }

        let index = import.line - 1;
        if let Some(line) = lines.get_mut(index) {
            let updated = replace_quoted(line, &import.specifier, &new_specifier);
            if updated != *line {
                *line = updated;
                rewritten += 1;
            }
        }
    }

    let mut output = lines.join("\n");
    if content.ends_with('\n') {
        output.push('\n');
    }
    (output, rewritten)
}

/// Compute the new specifier, preserving how much of the file name the
/// original spelled out (full name, or name without the final extension).
fn remap_specifier(specifier: &str, old_path: &Path, new_path: &Path) -> Option<String> {
    let old_name = old_path.file_name()?.to_string_lossy();
    let new_name = new_path.file_name()?.to_string_lossy();
    let (dir_part, file_part) = match specifier.rfind('/') {
        Some(slash) => (&specifier[..slash + 1], &specifier[slash + 1..]),
        None => ("", specifier),
    };

    if file_part == old_name {
        return Some(format!("{dir_part}{new_name}"));
    }
    let old_stem = strip_last_extension(&old_name);
    if file_part == old_stem {
        return Some(format!("{dir_part}{}", strip_last_extension(&new_name)));
    }
    // Directory (index.*) specifier; the directory name did not change.
    None
}

fn strip_last_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    }
}

/// Replace the specifier only where it appears as a complete quoted
/// string, so substring matches and prose never change.
fn replace_quoted(line: &str, from: &str, to: &str) -> String {
    let mut out = line.to_string();
    for quote in ['\'', '"', '`'] {
        let needle = format!("{quote}{from}{quote}");
        if out.contains(&needle) {
            out = out.replace(&needle, &format!("{quote}{to}{quote}"));
        }
    }
    out
}
