use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::line::DiffLine;

/// Number of preceding content lines captured in a content fingerprint.
pub const CONTEXT_WINDOW: usize = 5;

/// Maximum stored length of one fingerprint line.
pub const CONTEXT_LINE_MAX: usize = 256;

/// Typed key a comment state is filed under.
///
/// Replaces the CSS-class-string keys of the original UI with an explicit
/// value: a `(left, right)` line-number pair (either half may be absent) or
/// the file-level sentinel. `Display` renders the stable string form
/// (`.ll<N>.lr<N>` / `.file`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorKey {
    Line {
        left: Option<u32>,
        right: Option<u32>,
    },
    File,
}

impl AnchorKey {
    pub fn for_line(line: &DiffLine) -> Self {
        AnchorKey::Line {
            left: line.left_number,
            right: line.right_number,
        }
    }
}

impl fmt::Display for AnchorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorKey::Line { left, right } => {
                if let Some(l) = left {
                    write!(f, ".ll{}", l)?;
                }
                if let Some(r) = right {
                    write!(f, ".lr{}", r)?;
                }
                if left.is_none() && right.is_none() {
                    write!(f, ".llnone")?;
                }
                Ok(())
            }
            AnchorKey::File => write!(f, ".file"),
        }
    }
}

impl FromStr for AnchorKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == ".file" {
            return Ok(AnchorKey::File);
        }
        let mut left = None;
        let mut right = None;
        for part in s.split('.').filter(|p| !p.is_empty()) {
            if let Some(num) = part.strip_prefix("ll") {
                if num != "none" {
                    left = Some(num.parse().map_err(|_| format!("bad anchor key: {s}"))?);
                }
            } else if let Some(num) = part.strip_prefix("lr") {
                right = Some(num.parse().map_err(|_| format!("bad anchor key: {s}"))?);
            } else {
                return Err(format!("bad anchor key: {s}"));
            }
        }
        Ok(AnchorKey::Line { left, right })
    }
}

/// Where a comment is attached, as stored with the comment itself.
///
/// `content_context` holds up to [`CONTEXT_WINDOW`] preceding content-line
/// texts (each truncated to [`CONTEXT_LINE_MAX`] chars), the fallback
/// fingerprint used when direct line-number lookup fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CommentAnchor {
    pub file: String,
    #[serde(default)]
    pub left_line: Option<u32>,
    #[serde(default)]
    pub right_line: Option<u32>,
    #[serde(default)]
    pub content_context: Vec<String>,
}

impl CommentAnchor {
    pub fn key(&self) -> AnchorKey {
        if self.left_line.is_none() && self.right_line.is_none() {
            AnchorKey::File
        } else {
            AnchorKey::Line {
                left: self.left_line,
                right: self.right_line,
            }
        }
    }
}

/// A saved comment as supplied by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: String,
    pub author: String,
    pub body: String,
    pub anchor: CommentAnchor,
}

/// An unsaved comment draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PendingComment {
    pub body: String,
    #[serde(default)]
    pub uploaders: Vec<String>,
    #[serde(default)]
    pub login: Option<String>,
}

/// Transient UI state for one anchor key.
///
/// Created on first interaction, merged on subsequent ones, removed when the
/// comment is submitted or cleared. Scoped to a single page view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CommentState {
    #[serde(default)]
    pub pending: Option<PendingComment>,
    #[serde(default)]
    pub collapsed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_renders_both_halves() {
        let key = AnchorKey::Line {
            left: Some(12),
            right: Some(14),
        };
        assert_eq!(key.to_string(), ".ll12.lr14");
    }

    #[test]
    fn key_renders_single_half() {
        let key = AnchorKey::Line {
            left: None,
            right: Some(7),
        };
        assert_eq!(key.to_string(), ".lr7");
    }

    #[test]
    fn key_roundtrips_through_display() {
        for key in [
            AnchorKey::Line {
                left: Some(3),
                right: None,
            },
            AnchorKey::Line {
                left: Some(3),
                right: Some(9),
            },
            AnchorKey::File,
        ] {
            let parsed: AnchorKey = key.to_string().parse().unwrap();
            assert_eq!(parsed, key);
        }
    }

    #[test]
    fn anchor_without_lines_is_file_level() {
        let anchor = CommentAnchor {
            file: "src/lib.rs".into(),
            ..Default::default()
        };
        assert_eq!(anchor.key(), AnchorKey::File);
    }
}
