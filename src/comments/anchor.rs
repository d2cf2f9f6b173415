//! Maps stored comment anchors onto rendered rows.
//!
//! A comment's anchor is always derived from its own stored line numbers
//! and content fingerprint, never from transient row position, so
//! re-fetching or re-ordering the comment list can never move it to a
//! different line. Resolution runs against the inline projection; sideways
//! rows inherit the result through their pairing index.

use crate::domain::{
    AnchorKey, CONTEXT_LINE_MAX, CONTEXT_WINDOW, CommentAnchor,
};
use crate::layout::LayoutRow;

/// The content fingerprint of the row at `index`: the texts of up to
/// [`CONTEXT_WINDOW`] preceding content rows, oldest first, each truncated
/// to [`CONTEXT_LINE_MAX`] chars. Meta and padding rows are skipped.
pub fn content_context(rows: &[LayoutRow], index: usize) -> Vec<String> {
    let mut context: Vec<String> = rows[..index.min(rows.len())]
        .iter()
        .rev()
        .filter(|r| r.is_content())
        .take(CONTEXT_WINDOW)
        .map(|r| truncate(&r.text))
        .collect();
    context.reverse();
    context
}

/// Builds the anchor a new comment on `rows[index]` would store.
pub fn anchor_for_row(file: &str, rows: &[LayoutRow], index: usize) -> Option<CommentAnchor> {
    let row = rows.get(index)?;
    row.is_content().then(|| CommentAnchor {
        file: file.to_string(),
        left_line: row.left_number,
        right_line: row.right_number,
        content_context: content_context(rows, index),
    })
}

/// Finds the inline row a stored anchor refers to.
///
/// Primary match is the exact `.ll/.lr` line-number combination. When
/// renumbering broke it, fall back to comparing content fingerprints as an
/// ordered sequence; the first matching row wins. `None` is the tolerated
/// miss: the comment stays off the diff body for this render pass.
pub fn resolve(anchor: &CommentAnchor, rows: &[LayoutRow]) -> Option<usize> {
    let key = anchor.key();
    if let AnchorKey::Line { .. } = key {
        for (i, row) in rows.iter().enumerate() {
            if row.anchor_key() == Some(key) {
                return Some(i);
            }
        }
    }

    if anchor.content_context.is_empty() {
        return None;
    }
    rows.iter().enumerate().position(|(i, row)| {
        row.is_content() && content_context(rows, i) == anchor.content_context
    })
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= CONTEXT_LINE_MAX {
        text.to_string()
    } else {
        text.chars().take(CONTEXT_LINE_MAX).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WhitespaceMode;
    use crate::layout::InlineLayout;
    use crate::model::build;

    fn rows(diff: &str) -> Vec<LayoutRow> {
        let model = &build(diff, WhitespaceMode::Keep).unwrap()[0];
        InlineLayout::project(model).rows
    }

    const DIFF: &str = r#"diff --git a/f b/f
--- a/f
+++ b/f
@@ -40,6 +40,6 @@
 alpha
 beta
 gamma
 delta
-epsilon old
+epsilon new
 zeta
"#;

    #[test]
    fn context_skips_meta_and_caps_window() {
        let rows = rows(DIFF);
        // zeta is the last row; its 5 predecessors exclude the hunk header
        let context = content_context(&rows, rows.len() - 1);
        assert_eq!(
            context,
            vec!["beta", "gamma", "delta", "epsilon old", "epsilon new"]
        );
    }

    #[test]
    fn context_near_top_is_short() {
        let rows = rows(DIFF);
        assert!(content_context(&rows, 1).is_empty());
        assert_eq!(content_context(&rows, 2), vec!["alpha"]);
    }

    #[test]
    fn primary_match_finds_exact_number_combination() {
        let rows = rows(DIFF);
        let anchor = CommentAnchor {
            file: "f".into(),
            left_line: Some(44),
            right_line: None,
            content_context: vec![],
        };
        let idx = resolve(&anchor, &rows).unwrap();
        assert_eq!(rows[idx].text, "epsilon old");
    }

    #[test]
    fn fallback_matches_content_context() {
        let rows = rows(DIFF);
        // Stored numbers no longer exist anywhere in the model
        let anchor = CommentAnchor {
            file: "f".into(),
            left_line: Some(999),
            right_line: None,
            content_context: vec![
                "alpha".into(),
                "beta".into(),
                "gamma".into(),
                "delta".into(),
                "epsilon old".into(),
            ],
        };
        let idx = resolve(&anchor, &rows).unwrap();
        assert_eq!(rows[idx].text, "epsilon new");
    }

    #[test]
    fn miss_is_tolerated() {
        let rows = rows(DIFF);
        let anchor = CommentAnchor {
            file: "f".into(),
            left_line: Some(999),
            right_line: None,
            content_context: vec!["nothing like this".into()],
        };
        assert_eq!(resolve(&anchor, &rows), None);
    }

    #[test]
    fn first_match_wins_for_repeated_blocks() {
        let diff = r#"diff --git a/f b/f
--- a/f
+++ b/f
@@ -1,10 +1,10 @@
 same
 same
 same
 same
 same
 same
 same
 same
 same
 same
"#;
        let rows = rows(diff);
        let anchor = CommentAnchor {
            file: "f".into(),
            left_line: Some(999),
            right_line: None,
            content_context: vec!["same".into(); CONTEXT_WINDOW],
        };
        // Documented behavior: the first row whose fingerprint matches is
        // chosen, even when several later rows carry the same fingerprint.
        // The 6th content row is the earliest with a full window behind it.
        let idx = resolve(&anchor, &rows).unwrap();
        assert_eq!(rows[idx].left_number, Some(6));
    }
}
