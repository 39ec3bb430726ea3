//! Cache inspection tools.
//!
//! Read-only views of the partition store; lifecycle and control tools are
//! the only writers.

pub mod get;
pub mod keys;

pub use get::{CacheMatchParams, match_impl};
pub use keys::{CacheKeysParams, keys_impl};
