//! Persistence of the task tree
//!
//! Only own fields are written; effective values are recomputed on load.

pub mod state;

pub use state::*;
