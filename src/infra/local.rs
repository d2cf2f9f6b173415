//! Filesystem-backed collaborators: line source over a local checkout and
//! a comment feed over a JSON file.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::fs;

use crate::comments::CommentFeed;
use crate::context::{LineSource, split_file_lines};
use crate::domain::CommentRecord;

/// Reads post-image lines from files under a root directory, typically the
/// working tree the diff was taken against.
pub struct LocalFiles {
    root: PathBuf,
}

impl LocalFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Rejects paths that would escape the root.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, Component::ParentDir))
        {
            bail!("path escapes diff root: {path}");
        }
        Ok(self.root.join(relative))
    }

    async fn read(&self, path: &str) -> Result<String> {
        let full = self.resolve(path)?;
        fs::read_to_string(&full)
            .await
            .with_context(|| format!("reading {}", full.display()))
    }
}

#[async_trait]
impl LineSource for LocalFiles {
    async fn fetch_ranges(&self, path: &str, ranges: &[(u32, u32)]) -> Result<BTreeMap<u32, String>> {
        let lines = split_file_lines(&self.read(path).await?);
        let mut map = BTreeMap::new();
        for &(lo, hi) in ranges {
            for number in lo..=hi {
                if let Some(text) = lines.get(number as usize - 1) {
                    map.insert(number, text.clone());
                }
            }
        }
        Ok(map)
    }

    async fn fetch_file(&self, path: &str) -> Result<String> {
        self.read(path).await
    }
}

/// Reads saved comments from a JSON array of records.
pub struct JsonComments {
    path: PathBuf,
}

impl JsonComments {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CommentFeed for JsonComments {
    async fn fetch_comments(&self) -> Result<Vec<CommentRecord>> {
        let text = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading {}", self.path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("decoding {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ranges_clip_to_file_length() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "one\ntwo\nthree\n").unwrap();
        let source = LocalFiles::new(dir.path());

        let map = source.fetch_ranges("a.txt", &[(2, 5)]).await.unwrap();
        assert_eq!(
            map.into_iter().collect::<Vec<_>>(),
            vec![(2, "two".to_string()), (3, "three".to_string())]
        );
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = LocalFiles::new(dir.path());
        assert!(source.fetch_file("../etc/passwd").await.is_err());
        assert!(source.fetch_file("/etc/passwd").await.is_err());
    }

    #[tokio::test]
    async fn comment_file_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comments.json");
        std::fs::write(
            &path,
            r#"[{
                "id": "c1",
                "author": "reviewer",
                "body": "why not a slice?",
                "anchor": { "file": "src/lib.rs", "left_line": 4, "right_line": 4 }
            }]"#,
        )
        .unwrap();

        let comments = JsonComments::new(&path).fetch_comments().await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].anchor.left_line, Some(4));
        assert!(comments[0].anchor.content_context.is_empty());
    }

    #[tokio::test]
    async fn malformed_comment_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comments.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(JsonComments::new(&path).fetch_comments().await.is_err());
    }
}
