//! Named, versioned cache partitions.
//!
//! A partition maps request keys to captured responses. This module defines
//! the async `CacheStore` interface the agent talks to and two backends:
//!
//! - `MemoryStore`, a process-local map guarded by a tokio `RwLock`
//! - `CacheDb`, a durable SQLite store with async access via tokio-rusqlite
//!
//! Neither backend evicts individual entries; whole partitions are dropped.

pub mod connection;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod partitions;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use hash::RequestKey;
pub use memory::MemoryStore;
pub use store::CacheStore;
