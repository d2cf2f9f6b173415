//! Two-column projection, always derived from the current inline state.
//!
//! Left shows delete/same/meta, right shows add/same/meta; within an edit
//! chunk the shorter side is padded with placeholder rows so row *i* on the
//! left is always vertically aligned with row *i* on the right. Rebuilding
//! from the same inline state is idempotent; transient per-row UI state
//! must be re-applied by the caller afterwards.

use serde::{Deserialize, Serialize};

use super::{InlineLayout, LayoutRow, RowKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidewaysLayout {
    pub left: Vec<LayoutRow>,
    pub right: Vec<LayoutRow>,
    pub show_left: bool,
    pub show_right: bool,
}

impl SidewaysLayout {
    pub fn project(inline: &InlineLayout) -> Self {
        let mut left: Vec<LayoutRow> = Vec::new();
        let mut right: Vec<LayoutRow> = Vec::new();

        let rows = &inline.rows;
        let mut i = 0;
        while i < rows.len() {
            let chunk = rows[i].chunk;
            let mut j = i;
            while j < rows.len() && rows[j].chunk == chunk {
                j += 1;
            }
            let group = &rows[i..j];

            match group[0].kind {
                RowKind::Meta | RowKind::Same | RowKind::Padding => {
                    for row in group {
                        left.push(side_row(row, Side::Left));
                        right.push(side_row(row, Side::Right));
                    }
                }
                RowKind::Delete | RowKind::Add => {
                    // An edit chunk's group is its deletes followed by its
                    // adds; a pure run is all one kind
                    let deletes: Vec<&LayoutRow> =
                        group.iter().filter(|r| r.kind == RowKind::Delete).collect();
                    let adds: Vec<&LayoutRow> =
                        group.iter().filter(|r| r.kind == RowKind::Add).collect();
                    let height = deletes.len().max(adds.len());

                    for k in 0..height {
                        left.push(match deletes.get(k) {
                            Some(row) => side_row(row, Side::Left),
                            None => LayoutRow::padding(chunk),
                        });
                        right.push(match adds.get(k) {
                            Some(row) => side_row(row, Side::Right),
                            None => LayoutRow::padding(chunk),
                        });
                    }
                }
            }

            i = j;
        }

        Self {
            left,
            right,
            show_left: inline.show_left,
            show_right: inline.show_right,
        }
    }

    /// Rows at index `i` pair with each other unless one is padding.
    pub fn is_paired(&self, i: usize) -> bool {
        match (self.left.get(i), self.right.get(i)) {
            (Some(l), Some(r)) => l.kind != RowKind::Padding && r.kind != RowKind::Padding,
            _ => false,
        }
    }

    pub fn height(&self) -> usize {
        debug_assert_eq!(self.left.len(), self.right.len());
        self.left.len()
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Side {
    Left,
    Right,
}

/// Clones a row for one column: the marker is stripped and the other
/// side's line-number column removed.
fn side_row(row: &LayoutRow, side: Side) -> LayoutRow {
    let mut out = row.clone();
    out.marker = None;
    match side {
        Side::Left => out.right_number = None,
        Side::Right => out.left_number = None,
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WhitespaceMode;
    use crate::layout::InlineLayout;
    use crate::model::build;

    const UNEVEN: &str = r#"diff --git a/f b/f
--- a/f
+++ b/f
@@ -1,4 +1,7 @@
 keep
-one
-two
+a one
+a two
+three
+four
+five
 end
"#;

    fn sideways() -> SidewaysLayout {
        let model = &build(UNEVEN, WhitespaceMode::Keep).unwrap()[0];
        SidewaysLayout::project(&InlineLayout::project(model))
    }

    #[test]
    fn columns_have_equal_length() {
        let layout = sideways();
        assert_eq!(layout.left.len(), layout.right.len());
    }

    #[test]
    fn shorter_side_is_padded_within_edit_chunk() {
        let layout = sideways();
        // meta + keep + 5 edit rows + end
        assert_eq!(layout.height(), 8);

        let left_padding = layout
            .left
            .iter()
            .filter(|r| r.kind == RowKind::Padding)
            .count();
        let right_padding = layout
            .right
            .iter()
            .filter(|r| r.kind == RowKind::Padding)
            .count();
        assert_eq!(left_padding, 3);
        assert_eq!(right_padding, 0);
    }

    #[test]
    fn padding_rows_are_unpaired() {
        let layout = sideways();
        for i in 0..layout.height() {
            let padded = layout.left[i].kind == RowKind::Padding
                || layout.right[i].kind == RowKind::Padding;
            assert_eq!(layout.is_paired(i), !padded);
        }
    }

    #[test]
    fn markers_are_stripped_and_number_columns_reduced() {
        let layout = sideways();
        for row in layout.left.iter().chain(layout.right.iter()) {
            assert_eq!(row.marker, None);
        }
        for row in &layout.left {
            assert_eq!(row.right_number, None);
        }
        for row in &layout.right {
            assert_eq!(row.left_number, None);
        }
    }

    #[test]
    fn sides_keep_their_own_rows() {
        let layout = sideways();
        assert!(layout.left.iter().all(|r| r.kind != RowKind::Add));
        assert!(layout.right.iter().all(|r| r.kind != RowKind::Delete));
    }

    #[test]
    fn rebuild_is_idempotent() {
        let model = &build(UNEVEN, WhitespaceMode::Keep).unwrap()[0];
        let inline = InlineLayout::project(model);
        let first = SidewaysLayout::project(&inline);
        let second = SidewaysLayout::project(&inline);
        assert_eq!(first, second);
    }
}
