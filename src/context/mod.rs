//! Context expansion: fetching unchanged lines around hunks on demand.

pub mod loader;
pub mod source;

pub use loader::{CONTEXT_STEP, ContextLoader, ContextOutcome, EdgeSide};
pub use source::{LineSource, parse_line_map, split_file_lines};
