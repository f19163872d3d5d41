//! In-band diagnostic markers.
//!
//! Anything the pipeline cannot translate deterministically is preserved
//! in the output as a `HAMLET-TODO` comment carrying the original source;
//! review-worthy translations get a `HAMLET-WARNING`. Comment syntax
//! follows the target language.

pub const TODO_TAG: &str = "HAMLET-TODO";
pub const WARNING_TAG: &str = "HAMLET-WARNING";

/// Line-comment syntax per target language family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `//` for JavaScript, TypeScript, Java.
    Slashes,
    /// `#` for Python.
    Hash,
}

impl CommentStyle {
    pub fn for_language(language: &str) -> Self {
        match language {
            "python" => CommentStyle::Hash,
            _ => CommentStyle::Slashes,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            CommentStyle::Slashes => "//",
            CommentStyle::Hash => "#",
        }
    }

    pub fn line(&self, text: &str) -> String {
        format!("{} {}", self.prefix(), text)
    }
}

/// Render a TODO marker block.
///
/// ```text
/// // HAMLET-TODO [3]: unsupported assertion kind 'custom.matcher'
/// // Original: expect(x).customMatcher()
/// // Manual action required: port this assertion manually
/// ```
pub fn todo_marker(
    style: CommentStyle,
    id: usize,
    description: &str,
    original: &str,
    action: &str,
) -> String {
    let mut lines = vec![style.line(&format!("{TODO_TAG} [{id}]: {description}"))];
    if !original.is_empty() {
        for (i, source_line) in original.lines().enumerate() {
            if i == 0 {
                lines.push(style.line(&format!("Original: {source_line}")));
            } else {
                lines.push(style.line(&format!("          {source_line}")));
            }
        }
    }
    lines.push(style.line(&format!("Manual action required: {action}")));
    lines.join("\n")
}

/// Render a single-line warning marker.
pub fn warning_marker(style: CommentStyle, description: &str) -> String {
    style.line(&format!("{WARNING_TAG}: {description}"))
}

/// Count TODO markers in emitted output.
pub fn count_todos(output: &str) -> usize {
    output.matches(TODO_TAG).count()
}

/// Count warning markers in emitted output.
pub fn count_warnings(output: &str) -> usize {
    output.matches(WARNING_TAG).count()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn todo_marker_has_three_parts() {
        let marker = todo_marker(
            CommentStyle::Slashes,
            1,
            "unsupported assertion kind 'custom.matcher'",
            "expect(x).customMatcher()",
            "port this assertion manually",
        );
        assert_eq!(
            marker,
            "// HAMLET-TODO [1]: unsupported assertion kind 'custom.matcher'\n\
             // Original: expect(x).customMatcher()\n\
             // Manual action required: port this assertion manually"
        );
    }

    #[test]
    fn python_markers_use_hash_comments() {
        let marker = warning_marker(CommentStyle::Hash, "approximated fixture scope");
        assert_eq!(marker, "# HAMLET-WARNING: approximated fixture scope");
    }

    #[test]
    fn multiline_original_is_continued() {
        let marker = todo_marker(
            CommentStyle::Slashes,
            2,
            "unconvertible block",
            "line one\nline two",
            "review",
        );
        assert!(marker.contains("// Original: line one"));
        assert!(marker.contains("//           line two"));
    }

    #[test]
    fn counters_count_tags() {
        let out = "// HAMLET-TODO [1]: a\n// HAMLET-WARNING: b\n// HAMLET-TODO [2]: c\n";
        assert_eq!(count_todos(out), 2);
        assert_eq!(count_warnings(out), 1);
    }
}
