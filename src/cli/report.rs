//! Report formatting and printing utilities.
//!
//! Cargo-style colored output for single conversions and migration runs.
//! Separate from core logic so hamlet stays usable as a library.

use std::io::{self, Write};

use colored::Colorize;
use unicode_width::UnicodeWidthStr;

use crate::migrate::{FileResult, FileStatus, ProgressStatus};
use crate::score::{ConfidenceLevel, ConfidenceReport};

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

/// Skip mark for consistent output formatting.
pub const SKIP_MARK: &str = "-";

/// Print a single-file conversion report to stdout.
pub fn print_conversion_report(report: &ConfidenceReport) {
    print_conversion_report_to(report, &mut io::stdout().lock());
}

pub fn print_conversion_report_to<W: Write>(report: &ConfidenceReport, writer: &mut W) {
    let headline = format!(
        "{} converted with {}% confidence ({})",
        SUCCESS_MARK,
        report.confidence,
        report.level.as_str()
    );
    let _ = writeln!(writer, "{}", paint_level(&headline, report.level));

    if let Some(coverage) = &report.ir_coverage {
        let _ = writeln!(
            writer,
            "  ir coverage: {}% ({}/{} emittable nodes)",
            coverage.coverage_percent,
            coverage.supported(),
            coverage.total()
        );
        if !coverage.unsupported_kinds.is_empty() {
            let _ = writeln!(
                writer,
                "  unsupported kinds: {}",
                coverage.unsupported_kinds.join(", ")
            );
        }
    }

    if report.details.is_empty() {
        return;
    }
    let _ = writeln!(writer, "  {} node(s) need attention:", report.details.len());
    let type_width = report
        .details
        .iter()
        .map(|d| d.node_type.width())
        .max()
        .unwrap_or(0);
    for detail in &report.details {
        let line = match detail.line {
            Some(line) => format!("line {line}"),
            None => String::new(),
        };
        let _ = writeln!(
            writer,
            "  {:>13}  {}{}  {:>8}  {}",
            detail.detail_type.as_str(),
            detail.node_type,
            " ".repeat(type_width.saturating_sub(detail.node_type.width())),
            line,
            detail.source
        );
    }
}

/// Per-file progress line during a migration.
pub fn print_progress(rel_path: &str, status: ProgressStatus, confidence: Option<u8>) {
    match status {
        ProgressStatus::Converted => {
            let suffix = match confidence {
                Some(confidence) => format!(" ({confidence}%)"),
                None => String::new(),
            };
            println!("  {} {rel_path}{suffix}", SUCCESS_MARK.green());
        }
        ProgressStatus::Failed => println!("  {} {rel_path}", FAILURE_MARK.red()),
        ProgressStatus::Skipped => {
            println!("  {} {rel_path} {}", SKIP_MARK, "(skipped)".dimmed());
        }
        ProgressStatus::SkippedConverted => {
            println!(
                "  {} {rel_path} {}",
                SKIP_MARK,
                "(already converted)".dimmed()
            );
        }
    }
}

/// Migration summary block.
pub fn print_migration_summary(results: &[FileResult]) {
    print_migration_summary_to(results, &mut io::stdout().lock());
}

pub fn print_migration_summary_to<W: Write>(results: &[FileResult], writer: &mut W) {
    let converted = results
        .iter()
        .filter(|r| r.status == FileStatus::Converted)
        .count();
    let skipped = results
        .iter()
        .filter(|r| r.status == FileStatus::Skipped)
        .count();
    let failed = results
        .iter()
        .filter(|r| r.status == FileStatus::Failed)
        .count();

    let _ = writeln!(writer);
    if failed == 0 {
        let _ = writeln!(
            writer,
            "{} {}",
            SUCCESS_MARK.green(),
            format!(
                "Migrated {converted} {} ({skipped} skipped)",
                plural(converted, "file", "files")
            )
            .green()
        );
    } else {
        let _ = writeln!(
            writer,
            "{} {}",
            FAILURE_MARK.red(),
            format!(
                "Migrated {converted} {}, {failed} failed ({skipped} skipped)",
                plural(converted, "file", "files")
            )
            .red()
        );
    }
}

/// Aligned listing of registered plugins.
pub fn print_frameworks_table<W: Write>(
    rows: &[(String, String, String)],
    writer: &mut W,
) {
    let name_width = column_width(rows.iter().map(|(n, _, _)| n.as_str()), "NAME");
    let language_width = column_width(rows.iter().map(|(_, l, _)| l.as_str()), "LANGUAGE");
    let _ = writeln!(
        writer,
        "{:<name_width$}  {:<language_width$}  PARADIGM",
        "NAME", "LANGUAGE"
    );
    for (name, language, paradigm) in rows {
        let name_pad = " ".repeat(name_width.saturating_sub(name.width()));
        let language_pad = " ".repeat(language_width.saturating_sub(language.width()));
        let _ = writeln!(writer, "{name}{name_pad}  {language}{language_pad}  {paradigm}");
    }
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, header: &str) -> usize {
    values
        .map(|v| v.width())
        .chain(std::iter::once(header.width()))
        .max()
        .unwrap_or(0)
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}

fn paint_level(text: &str, level: ConfidenceLevel) -> colored::ColoredString {
    match level {
        ConfidenceLevel::High => text.green(),
        ConfidenceLevel::Medium => text.yellow(),
        ConfidenceLevel::Low => text.red(),
    }
}
