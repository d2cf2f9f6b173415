//! Where unchanged file lines come from when a diff view wants more
//! context than the patch carried.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

/// Supplies post-image file content by line number.
///
/// Implementations fetch from wherever the reviewed revision lives (local
/// checkout, review server, ...). Line numbers are 1-based and refer to the
/// right-hand side of the diff. A range reaching past the end of the file
/// is not an error; the map simply stops at the last line that exists.
#[async_trait]
pub trait LineSource: Send + Sync {
    /// Fetches the lines covered by `ranges` (inclusive start/end pairs).
    async fn fetch_ranges(&self, path: &str, ranges: &[(u32, u32)]) -> Result<BTreeMap<u32, String>>;

    /// Fetches the whole file as raw text.
    async fn fetch_file(&self, path: &str) -> Result<String>;
}

/// Splits raw file text into lines, tolerating any of the three newline
/// conventions. Terminators are stripped; a trailing terminator does not
/// produce an empty final line.
pub fn split_file_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                lines.push(std::mem::take(&mut current));
            }
            '\n' => lines.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Decodes the wire form of a ranged fetch: a JSON object keyed by line
/// number, e.g. `{"6": "fn main() {", "7": "}"}`.
pub fn parse_line_map(json: &str) -> Result<BTreeMap<u32, String>> {
    #[derive(Deserialize)]
    struct Wire(BTreeMap<String, String>);

    let Wire(raw) = serde_json::from_str(json)?;
    let mut map = BTreeMap::new();
    for (key, text) in raw {
        let number: u32 = key
            .parse()
            .map_err(|_| anyhow::anyhow!("non-numeric line key: {key:?}"))?;
        map.insert(number, text);
    }
    Ok(map)
}
