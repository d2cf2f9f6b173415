//! Domain types for the diff engine.
//! Defines the core data structures shared by the model builder, layouts,
//! context loader and comment anchoring.

pub mod chunk;
pub mod comment;
pub mod error;
pub mod line;

pub use chunk::*;
pub use comment::*;
pub use error::*;
pub use line::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whitespace handling of the intra-line differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WhitespaceMode {
    #[default]
    Keep,
    /// Diff trimmed line content; stripped whitespace is re-attached as
    /// unhighlighted text around the computed spans
    Ignore,
}

/// Which projection of the diff is being presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Inline,
    Sideways,
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline => write!(f, "inline"),
            Self::Sideways => write!(f, "sideways"),
        }
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inline" => Ok(Self::Inline),
            "sideways" | "side-by-side" => Ok(Self::Sideways),
            other => Err(format!("unknown view mode: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_mode_display_parse() {
        assert_eq!(ViewMode::Inline.to_string(), "inline");
        assert_eq!(ViewMode::from_str("side-by-side").unwrap(), ViewMode::Sideways);
        assert!(ViewMode::from_str("diagonal").is_err());
    }
}
