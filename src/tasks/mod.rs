//! The task engine: classification of raw text, the per-user task collection with its lifecycle
//! rules, the retention window applied on load, and the derived statistics.

pub mod classifier;
pub mod entities;
pub mod retention;
pub mod stats;
pub mod tracker;
