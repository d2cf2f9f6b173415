//! Where saved review comments come from.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::CommentRecord;

/// Supplies the stored comments of a review, each with its anchor data.
///
/// Implementations fetch from wherever the review lives; the engine only
/// ever re-resolves anchors locally and never writes back through this
/// trait.
#[async_trait]
pub trait CommentFeed: Send + Sync {
    async fn fetch_comments(&self) -> Result<Vec<CommentRecord>>;
}
