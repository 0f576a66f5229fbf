//! Persistence is organized through [kv::KeyValueStore].
//! The basic idea is:
//!  - Every value is addressed by a namespace and a name, see [kv::StoreKey].
//!  - A user's whole task collection is one value, rewritten after every change.
//!  - Typed access goes through the repositories in [repository].

pub mod file_store;
pub mod kv;
#[cfg(test)]
pub mod memory_store;
pub mod repository;
