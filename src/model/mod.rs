//! Diff model construction: unified diff text in, typed chunks out.

pub mod builder;
pub mod intraline;

pub use builder::{FileMeta, build, build_single};
pub use intraline::{IntralineResult, intraline};
