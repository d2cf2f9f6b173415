//! Domain error types for the diff engine.
//!
//! Recoverable conditions (transport failures, anchor misses) are absorbed
//! at the component boundary and reported through return values; only
//! programming-invariant violations propagate as errors to the caller.

use thiserror::Error;

/// Errors raised while building the diff model.
#[derive(Debug, Error)]
pub enum DiffError {
    #[error("Invalid diff format: {0}")]
    InvalidFormat(String),

    #[error("Edit chunk with no rows on either side in {file}")]
    EmptyEditChunk { file: String },

    #[error("Diff operation failed: {0}")]
    OperationFailed(#[from] anyhow::Error),
}

/// Errors raised while expanding context around a hunk.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Context fetch failed for {file}: {message}")]
    Transport { file: String, message: String },

    #[error("Not permitted to read {file}")]
    NotPermitted { file: String },

    #[error("Hunk {hunk} of {file} has no parsable header and cannot expand")]
    NotExpandable { file: String, hunk: usize },
}

/// Unified error type for engine-level operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Diff error: {0}")]
    Diff(#[from] DiffError),

    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    #[error("Invariant violated: {0}")]
    Invariant(String),
}
