//! Personal task tracker for the terminal. Tasks get a priority and category tags from their
//! text, can be timed while being worked on, and are kept per user for 30 days.
//!

pub mod cli;
pub mod session;
pub mod storage;
pub mod tasks;
pub mod timer;
pub mod utils;
