//! Presentation projections of the chunk model.
//!
//! Layouts never mutate chunk data: they clone what they need into plain
//! row lists a renderer can consume directly.

pub mod inline;
pub mod sideways;
pub mod sync;

use serde::{Deserialize, Serialize};

use crate::domain::{AnchorKey, IntralineSpan};

pub use inline::InlineLayout;
pub use sideways::SidewaysLayout;
pub use sync::{ScrollSync, natural_width, proxy_scrollbar_width};

/// Kind of a rendered row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Same,
    Add,
    Delete,
    Meta,
    /// Blank placeholder keeping the two sideways columns aligned;
    /// never paired and never carries an anchor
    Padding,
}

/// One rendered row of either projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutRow {
    pub kind: RowKind,
    /// Leading diff marker, present in the inline projection only
    #[serde(default)]
    pub marker: Option<char>,
    #[serde(default)]
    pub left_number: Option<u32>,
    #[serde(default)]
    pub right_number: Option<u32>,
    pub text: String,
    #[serde(default)]
    pub spans: Option<Vec<IntralineSpan>>,
    /// Index of the originating chunk in the file model
    pub chunk: usize,
    #[serde(default)]
    pub is_full_context: bool,
    #[serde(default)]
    pub is_additional_context: bool,
}

impl LayoutRow {
    pub fn padding(chunk: usize) -> Self {
        Self {
            kind: RowKind::Padding,
            marker: None,
            left_number: None,
            right_number: None,
            text: String::new(),
            spans: None,
            chunk,
            is_full_context: false,
            is_additional_context: false,
        }
    }

    /// True for rows carrying file content.
    pub fn is_content(&self) -> bool {
        matches!(self.kind, RowKind::Same | RowKind::Add | RowKind::Delete)
    }

    /// The anchor key a comment on this row would be filed under.
    pub fn anchor_key(&self) -> Option<AnchorKey> {
        self.is_content().then_some(AnchorKey::Line {
            left: self.left_number,
            right: self.right_number,
        })
    }
}
