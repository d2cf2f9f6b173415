//! Infrastructure layer (adapters/implementations).
//!
//! IO-heavy pieces: filesystem line source, preference persistence,
//! content hashing.

pub mod hash;
pub mod local;
pub mod prefs;

pub use local::{JsonComments, LocalFiles};
pub use prefs::{ViewerPrefs, load_prefs, save_prefs};
