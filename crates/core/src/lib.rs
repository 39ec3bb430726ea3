//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - The request/response model intercepted by the agent
//! - Cache partition stores (in-memory and SQLite)
//! - Unified error types
//! - Configuration structures
//! - The host lifecycle interface

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;

pub use cache::{CacheDb, CacheStore, MemoryStore, RequestKey};
pub use config::{AgentConfig, ConfigError};
pub use error::Error;
pub use http::{Destination, Request, RequestMode, Response};
pub use lifecycle::{LocalHost, WorkerHost, WorkerState};
