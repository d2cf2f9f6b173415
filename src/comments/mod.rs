//! Comment anchoring and per-anchor UI state.

pub mod anchor;
pub mod feed;
pub mod store;

pub use anchor::{anchor_for_row, content_context, resolve};
pub use feed::CommentFeed;
pub use store::CommentStore;
