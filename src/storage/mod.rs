//! Storage layer for metabolikal-sync.
//!
//! The queue persists through the [`KeyValueStore`] trait. Backends:
//! - [`MemoryStore`]: in-process map, for tests
//! - [`FileStore`]: one JSON file per key
//! - [`Database`]: `SQLite`, which also holds the completion ledger

mod database;
mod file;
mod kv;
mod migrations;

pub use database::Database;
pub use file::FileStore;
pub use kv::{KeyValueStore, MemoryStore};

#[cfg(test)]
pub use kv::MockKeyValueStore;
