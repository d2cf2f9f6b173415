//! Single-column projection: a direct 1:1 rendering of the chunk sequence.

use serde::{Deserialize, Serialize};

use crate::domain::{DiffChunk, DiffLine, DiffLineKind, FileDisposition, FileModel};

use super::{LayoutRow, RowKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineLayout {
    pub rows: Vec<LayoutRow>,
    /// False for pure adds: the left number column has nothing to show
    pub show_left: bool,
    /// False for pure deletes
    pub show_right: bool,
}

impl InlineLayout {
    pub fn project(model: &FileModel) -> Self {
        let show_left = model.disposition != FileDisposition::PureAdd;
        let show_right = model.disposition != FileDisposition::PureDelete;

        match &model.disposition {
            FileDisposition::MovedAway { target } => {
                return Self {
                    rows: vec![notice_row(format!("File moved to {target}"))],
                    show_left: false,
                    show_right: false,
                };
            }
            FileDisposition::Binary => {
                return Self {
                    rows: vec![notice_row("Binary file (content not shown)".to_string())],
                    show_left: false,
                    show_right: false,
                };
            }
            _ => {}
        }

        let mut rows = Vec::new();
        for (chunk_idx, chunk) in model.chunks.iter().enumerate() {
            match chunk {
                DiffChunk::Meta(meta) => rows.push(row_from(&meta.line, chunk_idx)),
                DiffChunk::Same(lines) | DiffChunk::Add(lines) | DiffChunk::Delete(lines) => {
                    rows.extend(lines.iter().map(|l| row_from(l, chunk_idx)));
                }
                DiffChunk::Edit(edit) => {
                    rows.extend(edit.deletes.iter().map(|l| row_from(l, chunk_idx)));
                    rows.extend(edit.adds.iter().map(|l| row_from(l, chunk_idx)));
                }
            }
        }

        Self {
            rows,
            show_left,
            show_right,
        }
    }
}

fn row_from(line: &DiffLine, chunk: usize) -> LayoutRow {
    let (kind, marker) = match line.kind {
        DiffLineKind::Same => (RowKind::Same, Some(' ')),
        DiffLineKind::Add => (RowKind::Add, Some('+')),
        DiffLineKind::Delete => (RowKind::Delete, Some('-')),
        DiffLineKind::Meta => (RowKind::Meta, None),
    };
    LayoutRow {
        kind,
        marker,
        left_number: line.left_number,
        right_number: line.right_number,
        text: line.text.clone(),
        spans: line.spans.clone(),
        chunk,
        is_full_context: line.is_full_context,
        is_additional_context: line.is_additional_context,
    }
}

fn notice_row(text: String) -> LayoutRow {
    LayoutRow {
        kind: RowKind::Meta,
        marker: None,
        left_number: None,
        right_number: None,
        text,
        spans: None,
        chunk: 0,
        is_full_context: false,
        is_additional_context: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WhitespaceMode;
    use crate::model::build;

    const DIFF: &str = r#"diff --git a/f b/f
--- a/f
+++ b/f
@@ -1,3 +1,3 @@
 context
-foo bar
+foo baz
 tail
"#;

    #[test]
    fn renders_rows_in_chunk_order() {
        let model = &build(DIFF, WhitespaceMode::Keep).unwrap()[0];
        let layout = InlineLayout::project(model);

        let kinds: Vec<RowKind> = layout.rows.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RowKind::Meta,
                RowKind::Same,
                RowKind::Delete,
                RowKind::Add,
                RowKind::Same,
            ]
        );
        assert_eq!(layout.rows[2].marker, Some('-'));
        assert_eq!(layout.rows[2].text, "foo bar");
    }

    #[test]
    fn moved_file_is_one_descriptive_row() {
        let diff = "diff --git a/old.rs b/new.rs\nsimilarity index 100%\nrename from old.rs\nrename to new.rs\n";
        let model = &build(diff, WhitespaceMode::Keep).unwrap()[0];
        let layout = InlineLayout::project(model);
        assert_eq!(layout.rows.len(), 1);
        assert!(layout.rows[0].text.contains("new.rs"));
        assert_eq!(layout.rows[0].kind, RowKind::Meta);
    }
}
