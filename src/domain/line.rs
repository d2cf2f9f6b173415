use serde::{Deserialize, Serialize};

/// Kind of a single diff row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffLineKind {
    /// Unchanged line present on both sides
    Same,
    /// Line only present on the right (new) side
    Add,
    /// Line only present on the left (old) side
    Delete,
    /// Hunk header or other non-content row
    Meta,
}

/// Line terminator of a diff row, recorded for annotation purposes only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
    /// Bare carriage return. The diff parser never emits this (hunk bodies
    /// are framed on `\n`); it exists for models deserialized from
    /// external producers.
    Cr,
    /// Last line of a file without a trailing terminator
    None,
}

/// Operation of an intra-line highlight span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanOp {
    Equal,
    Insert,
    Delete,
}

/// One intra-line span attached to a row of an edit chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntralineSpan {
    pub op: SpanOp,
    pub text: String,
}

impl IntralineSpan {
    pub fn equal(text: impl Into<String>) -> Self {
        Self {
            op: SpanOp::Equal,
            text: text.into(),
        }
    }

    pub fn insert(text: impl Into<String>) -> Self {
        Self {
            op: SpanOp::Insert,
            text: text.into(),
        }
    }

    pub fn delete(text: impl Into<String>) -> Self {
        Self {
            op: SpanOp::Delete,
            text: text.into(),
        }
    }
}

/// A single row of the diff model.
///
/// `text` never carries the leading `+`/`-` marker; layouts re-attach the
/// marker where a presentation calls for it. Adds lack `left_number`,
/// deletes lack `right_number`. Within a file the numbers on each side are
/// strictly increasing among the rows that carry that side's number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub kind: DiffLineKind,
    #[serde(default)]
    pub left_number: Option<u32>,
    #[serde(default)]
    pub right_number: Option<u32>,
    pub text: String,
    #[serde(default)]
    pub line_ending: LineEnding,
    /// Row spliced in by a full-file load
    #[serde(default)]
    pub is_full_context: bool,
    /// Row spliced in by an incremental context expansion
    #[serde(default)]
    pub is_additional_context: bool,
    /// The paired row on the other side differs only in its terminator
    #[serde(default)]
    pub ending_changed: bool,
    /// Intra-line highlight spans, present on rows of edit chunks
    #[serde(default)]
    pub spans: Option<Vec<IntralineSpan>>,
}

impl DiffLine {
    pub fn same(left: u32, right: u32, text: impl Into<String>) -> Self {
        Self {
            kind: DiffLineKind::Same,
            left_number: Some(left),
            right_number: Some(right),
            text: text.into(),
            line_ending: LineEnding::default(),
            is_full_context: false,
            is_additional_context: false,
            ending_changed: false,
            spans: None,
        }
    }

    pub fn add(right: u32, text: impl Into<String>) -> Self {
        Self {
            kind: DiffLineKind::Add,
            left_number: None,
            right_number: Some(right),
            text: text.into(),
            line_ending: LineEnding::default(),
            is_full_context: false,
            is_additional_context: false,
            ending_changed: false,
            spans: None,
        }
    }

    pub fn delete(left: u32, text: impl Into<String>) -> Self {
        Self {
            kind: DiffLineKind::Delete,
            left_number: Some(left),
            right_number: None,
            text: text.into(),
            line_ending: LineEnding::default(),
            is_full_context: false,
            is_additional_context: false,
            ending_changed: false,
            spans: None,
        }
    }

    pub fn meta(text: impl Into<String>) -> Self {
        Self {
            kind: DiffLineKind::Meta,
            left_number: None,
            right_number: None,
            text: text.into(),
            line_ending: LineEnding::default(),
            is_full_context: false,
            is_additional_context: false,
            ending_changed: false,
            spans: None,
        }
    }

    /// True for rows that carry file content (not headers or placeholders).
    pub fn is_content(&self) -> bool {
        self.kind != DiffLineKind::Meta
    }
}
