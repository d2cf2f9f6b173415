use serde::{Deserialize, Serialize};

use super::line::{DiffLine, DiffLineKind};

/// Parsed `@@ -l,ln +r,rn @@` ranges of a hunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HunkHeader {
    pub left_start: u32,
    pub left_len: u32,
    pub right_start: u32,
    pub right_len: u32,
}

impl HunkHeader {
    /// Last left-side line covered by the hunk, per the header.
    pub fn left_end(&self) -> u32 {
        self.left_start + self.left_len.saturating_sub(1)
    }

    /// Last right-side line covered by the hunk, per the header.
    pub fn right_end(&self) -> u32 {
        self.right_start + self.right_len.saturating_sub(1)
    }
}

/// Whether more unchanged lines can still be revealed at a hunk boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContextEdge {
    #[default]
    Expandable,
    /// Reached the file boundary or met the neighboring hunk
    Exhausted,
}

/// A hunk-header row with its parsed ranges and per-boundary context state.
///
/// An unparsable header leaves `header` as `None`: the hunk still renders
/// but can never expand context, so both edges report `Exhausted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaChunk {
    pub line: DiffLine,
    pub header: Option<HunkHeader>,
    #[serde(default)]
    pub before_edge: ContextEdge,
    #[serde(default)]
    pub after_edge: ContextEdge,
}

impl MetaChunk {
    pub fn all_context_loaded(&self) -> bool {
        self.before_edge == ContextEdge::Exhausted && self.after_edge == ContextEdge::Exhausted
    }
}

/// A delete run immediately followed by an add run.
///
/// `delete_pad`/`add_pad` record how many placeholder rows the shorter side
/// needs so both columns of a sideways layout stay vertically aligned:
/// `pad = max(0, other_side_len - this_side_len)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditChunk {
    pub deletes: Vec<DiffLine>,
    pub adds: Vec<DiffLine>,
    pub delete_pad: u32,
    pub add_pad: u32,
}

impl EditChunk {
    pub fn new(deletes: Vec<DiffLine>, adds: Vec<DiffLine>) -> Self {
        let delete_pad = adds.len().saturating_sub(deletes.len()) as u32;
        let add_pad = deletes.len().saturating_sub(adds.len()) as u32;
        Self {
            deletes,
            adds,
            delete_pad,
            add_pad,
        }
    }
}

/// A maximal run of rows of one kind, or a single hunk-header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffChunk {
    Same(Vec<DiffLine>),
    /// Add run with no adjacent delete run
    Add(Vec<DiffLine>),
    /// Delete run with no adjacent add run
    Delete(Vec<DiffLine>),
    Edit(EditChunk),
    Meta(MetaChunk),
}

impl DiffChunk {
    /// Rows of this chunk in inline order (deletes before adds).
    pub fn lines(&self) -> Box<dyn Iterator<Item = &DiffLine> + '_> {
        match self {
            DiffChunk::Same(lines) | DiffChunk::Add(lines) | DiffChunk::Delete(lines) => {
                Box::new(lines.iter())
            }
            DiffChunk::Edit(edit) => Box::new(edit.deletes.iter().chain(edit.adds.iter())),
            DiffChunk::Meta(meta) => Box::new(std::iter::once(&meta.line)),
        }
    }

    pub fn kind_of_first_line(&self) -> DiffLineKind {
        match self {
            DiffChunk::Same(_) => DiffLineKind::Same,
            DiffChunk::Add(_) => DiffLineKind::Add,
            DiffChunk::Delete(_) | DiffChunk::Edit(_) => DiffLineKind::Delete,
            DiffChunk::Meta(_) => DiffLineKind::Meta,
        }
    }
}

/// How a file participates in the diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FileDisposition {
    #[default]
    Modified,
    /// Newly created file; the left side has nothing to render
    PureAdd,
    /// Deleted file; the right side has nothing to render
    PureDelete,
    /// Delete half of a rename; rendered as one descriptive line linking to
    /// the paired add, never as a computed diff
    MovedAway { target: String },
    /// Binary or otherwise non-text content
    Binary,
}

/// The full diff model for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileModel {
    pub old_path: String,
    pub new_path: String,
    pub disposition: FileDisposition,
    pub chunks: Vec<DiffChunk>,
    pub additions: u32,
    pub deletions: u32,
}

impl FileModel {
    /// The path a comment anchor refers to.
    pub fn anchor_path(&self) -> &str {
        if self.new_path.is_empty() || self.new_path == "/dev/null" {
            &self.old_path
        } else {
            &self.new_path
        }
    }

    /// Indices of the meta chunks, in order.
    pub fn meta_indices(&self) -> Vec<usize> {
        self.chunks
            .iter()
            .enumerate()
            .filter_map(|(i, c)| matches!(c, DiffChunk::Meta(_)).then_some(i))
            .collect()
    }
}
