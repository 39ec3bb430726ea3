//! The swcache agent and its network side.
//!
//! This crate provides the request router, the caching strategies, the
//! install/activate/message handlers, and the HTTP fetcher the server plugs
//! into them.

pub mod agent;
pub mod fetch;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use agent::{
    Bypass, ControlMessage, Fetched, PrecacheFailure, PrecacheReport, Route, Served, ServiceAgent, ServiceWorker,
    classify,
};

pub use fetch::{FetchConfig, Fetcher, HttpFetcher};
