//! Line-by-line recovery.
//!
//! When a source file defeats the parser, the regex baseline still works
//! line by line: the target plugin's emitter is run over the raw source
//! with an empty tree, and the output is stamped with a warning marker.
//! Recovered files are pinned to a fixed low confidence so they always
//! land in the review bucket.

use crate::error::ParseFailure;
use crate::ir::TestFile;
use crate::markers::{CommentStyle, warning_marker};
use crate::registry::FrameworkPlugin;

/// Confidence assigned to every recovered file.
pub const RECOVERY_CONFIDENCE: u8 = 30;

/// Re-emit `src` through the target's regex baseline without an IR.
/// Returns `None` when even the baseline produced nothing usable.
pub fn recover_line_by_line(
    src: &str,
    failure: &ParseFailure,
    target: &dyn FrameworkPlugin,
) -> Option<String> {
    if src.trim().is_empty() {
        return None;
    }
    let empty = TestFile::new(target.language());
    let emitted = target.emit(&empty, src);
    if emitted.trim().is_empty() {
        return None;
    }
    let style = CommentStyle::for_language(target.language());
    let marker = warning_marker(
        style,
        &format!("parse failed ({failure}); file converted line by line"),
    );
    Some(format!("{marker}\n{emitted}"))
}
