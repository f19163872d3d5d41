//! Migration checklist document.
//!
//! A markdown summary bucketed by confidence: fully converted (≥90),
//! needs review (1–89), manual steps (0 or failed), plus config notes.

use super::state::FileStatus;

#[derive(Debug, Clone)]
pub struct ChecklistEntry {
    pub path: String,
    pub status: FileStatus,
    pub confidence: Option<u8>,
    pub warnings: usize,
    pub todos: usize,
    pub error: Option<String>,
    pub renamed_to: Option<String>,
}

pub fn generate_checklist(
    source: &str,
    target: &str,
    entries: &[ChecklistEntry],
    config_notes: &[String],
) -> String {
    let mut converted = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;
    for entry in entries {
        match entry.status {
            FileStatus::Converted => converted += 1,
            FileStatus::Skipped => skipped += 1,
            FileStatus::Failed => failed += 1,
        }
    }

    let mut out = String::new();
    out.push_str(&format!("# Migration checklist: {source} → {target}\n\n"));

    out.push_str("## Summary\n\n");
    out.push_str(&format!("- Converted: {converted}\n"));
    out.push_str(&format!("- Skipped: {skipped}\n"));
    out.push_str(&format!("- Failed: {failed}\n\n"));

    out.push_str("## Fully converted\n\n");
    let full: Vec<&ChecklistEntry> = entries
        .iter()
        .filter(|e| e.status == FileStatus::Converted && e.confidence.unwrap_or(0) >= 90)
        .collect();
    if full.is_empty() {
        out.push_str("_None._\n\n");
    } else {
        for entry in full {
            out.push_str(&format!(
                "- [x] `{}` — {}%{}\n",
                entry.path,
                entry.confidence.unwrap_or(0),
                rename_note(entry)
            ));
        }
        out.push('\n');
    }

    out.push_str("## Needs review\n\n");
    let review: Vec<&ChecklistEntry> = entries
        .iter()
        .filter(|e| {
            e.status == FileStatus::Converted
                && (1..90).contains(&e.confidence.unwrap_or(0))
        })
        .collect();
    if review.is_empty() {
        out.push_str("_None._\n\n");
    } else {
        for entry in review {
            out.push_str(&format!(
                "- [ ] `{}` — {}%, {} warning(s), {} todo(s){}\n",
                entry.path,
                entry.confidence.unwrap_or(0),
                entry.warnings,
                entry.todos,
                rename_note(entry)
            ));
        }
        out.push('\n');
    }

    out.push_str("## Manual steps\n\n");
    let manual: Vec<&ChecklistEntry> = entries
        .iter()
        .filter(|e| {
            e.status == FileStatus::Failed
                || (e.status == FileStatus::Converted && e.confidence.unwrap_or(0) == 0)
        })
        .collect();
    if manual.is_empty() {
        out.push_str("_None._\n\n");
    } else {
        for entry in manual {
            match &entry.error {
                Some(error) => {
                    out.push_str(&format!("- [ ] `{}` — failed: {error}\n", entry.path));
                }
                None => out.push_str(&format!("- [ ] `{}` — confidence 0\n", entry.path)),
            }
        }
        out.push('\n');
    }

    out.push_str("## Config changes\n\n");
    if config_notes.is_empty() {
        out.push_str("_None._\n");
    } else {
        for note in config_notes {
            out.push_str(&format!("- [ ] {note}\n"));
        }
    }

    out
}

fn rename_note(entry: &ChecklistEntry) -> String {
    match &entry.renamed_to {
        Some(renamed) => format!(" (renamed to `{renamed}`)"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn entry(path: &str, status: FileStatus, confidence: Option<u8>) -> ChecklistEntry {
        ChecklistEntry {
            path: path.to_string(),
            status,
            confidence,
            warnings: 0,
            todos: 0,
            error: None,
            renamed_to: None,
        }
    }

    #[test]
    fn entries_land_in_their_confidence_buckets() {
        let entries = vec![
            entry("a.cy.js", FileStatus::Converted, Some(95)),
            entry("b.cy.js", FileStatus::Converted, Some(71)),
            ChecklistEntry {
                error: Some("detection mismatch".to_string()),
                ..entry("c.cy.js", FileStatus::Failed, None)
            },
            entry("fixtures/data.json", FileStatus::Skipped, None),
        ];
        let doc = generate_checklist("cypress", "playwright", &entries, &[]);

        assert!(doc.contains("# Migration checklist: cypress → playwright"));
        assert!(doc.contains("- Converted: 2"));
        assert!(doc.contains("- Skipped: 1"));
        assert!(doc.contains("- Failed: 1"));

        let full_section = section(&doc, "## Fully converted");
        assert!(full_section.contains("a.cy.js"));
        assert!(!full_section.contains("b.cy.js"));

        let review_section = section(&doc, "## Needs review");
        assert!(review_section.contains("`b.cy.js` — 71%"));
        let manual_section = section(&doc, "## Manual steps");
        assert!(manual_section.contains("c.cy.js"));
        assert!(manual_section.contains("detection mismatch"));
    }

    #[test]
    fn config_notes_get_their_own_section() {
        let doc = generate_checklist(
            "jest",
            "vitest",
            &[],
            &["create vitest.config.ts to replace jest.config.js".to_string()],
        );
        assert!(doc.contains("## Config changes"));
        assert!(doc.contains("- [ ] create vitest.config.ts"));
    }

    #[test]
    fn empty_sections_say_none() {
        let doc = generate_checklist("jest", "vitest", &[], &[]);
        assert_eq!(doc.matches("_None._").count(), 4);
    }

    fn section<'a>(doc: &'a str, heading: &str) -> &'a str {
        let start = doc.find(heading).unwrap();
        let rest = &doc[start + heading.len()..];
        match rest.find("\n## ") {
            Some(end) => &rest[..end],
            None => rest,
        }
    }
}
