//! Diff construction and comment anchoring for code-review UIs.
//!
//! The crate parses unified diffs into a chunked per-file model, computes
//! intra-line highlight spans, projects the model into an inline or
//! sideways (two-column) layout, expands unchanged context on demand, and
//! resolves stored review comments back onto rendered rows. [`DiffEngine`]
//! ties the pieces together and keeps them consistent across reloads and
//! mode toggles.

pub mod comments;
pub mod context;
pub mod domain;
pub mod engine;
pub mod infra;
pub mod layout;
pub mod model;

pub use engine::DiffEngine;
