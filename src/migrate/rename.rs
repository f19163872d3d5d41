//! Output filename conventions.
//!
//! Cypress and Playwright disagree about spec naming (`.cy.*` vs
//! `.spec.*`); everything else keeps its name. Python and Java
//! extensions are never touched.

/// New file name for a converted file, or the original when the target
/// convention matches already.
pub fn renamed_file_name(file_name: &str, source: &str, target: &str) -> String {
    match (source, target) {
        ("cypress", "playwright") if file_name.contains(".cy.") => {
            file_name.replacen(".cy.", ".spec.", 1)
        }
        ("playwright", "cypress") if file_name.contains(".spec.") => {
            file_name.replacen(".spec.", ".cy.", 1)
        }
        _ => file_name.to_string(),
    }
}
