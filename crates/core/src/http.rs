//! Request and response model shared by the store, the fetcher and the agent.
//!
//! These are deliberately small: just enough of a fetch `Request` to route it,
//! and just enough of a `Response` to replay it from a partition.

use std::collections::BTreeMap;

use bytes::Bytes;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::RequestKey;

/// Declared destination of an intercepted request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    #[default]
    Empty,
    Document,
    Script,
    Style,
    Image,
    Font,
    Worker,
    Manifest,
    Other,
}

impl Destination {
    /// Script, style, image and font loads are treated as static assets.
    pub fn is_static_asset(self) -> bool {
        matches!(self, Self::Script | Self::Style | Self::Image | Self::Font)
    }
}

/// Request mode as reported by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    Navigate,
    SameOrigin,
    #[default]
    NoCors,
    Cors,
}

/// An intercepted network request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub destination: Destination,
    pub mode: RequestMode,
    pub accept: Option<String>,
}

impl Request {
    /// A plain GET for `url` with no destination.
    pub fn get(url: Url) -> Self {
        Self { method: "GET".into(), url, destination: Destination::Empty, mode: RequestMode::NoCors, accept: None }
    }

    /// A top-level navigation to `url`.
    pub fn navigate(url: Url) -> Self {
        Self {
            destination: Destination::Document,
            mode: RequestMode::Navigate,
            accept: Some("text/html,application/xhtml+xml".into()),
            ..Self::get(url)
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    /// Whether the Accept header asks for HTML.
    pub fn accepts_html(&self) -> bool {
        self.accept.as_deref().is_some_and(|accept| accept.contains("text/html"))
    }

    /// Key under which this request's response is stored.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, &self.url)
    }
}

/// A captured HTTP response.
///
/// Header names are stored lower-cased. The body is reference counted, so
/// cloning a response to both store and return it does not copy bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub url: String,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl Response {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Bytes>) -> Self {
        Self { url: url.into(), status, headers: BTreeMap::new(), body: body.into() }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Synthesized response used when a navigation has no cache entry, no
    /// network and no offline document.
    pub fn offline_placeholder(url: impl Into<String>) -> Self {
        Self::new(url, 503, "Offline").with_header("content-type", "text/plain")
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    /// Only plain 200 responses are ever written into a partition.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_static_destinations() {
        assert!(Destination::Script.is_static_asset());
        assert!(Destination::Font.is_static_asset());
        assert!(!Destination::Document.is_static_asset());
        assert!(!Destination::Empty.is_static_asset());
    }

    #[test]
    fn test_navigate_request_accepts_html() {
        let request = Request::navigate(url("https://example.com/tools"));
        assert_eq!(request.mode, RequestMode::Navigate);
        assert!(request.accepts_html());
        assert!(request.is_get());
    }

    #[test]
    fn test_method_is_case_insensitive() {
        let request = Request::get(url("https://example.com/")).with_method("get");
        assert!(request.is_get());
        let request = request.with_method("POST");
        assert!(!request.is_get());
    }

    #[test]
    fn test_only_200_is_cacheable() {
        assert!(Response::new("/", 200, "ok").is_cacheable());
        assert!(!Response::new("/", 204, "").is_cacheable());
        assert!(!Response::new("/", 404, "missing").is_cacheable());
        assert!(!Response::new("/", 0, "").is_cacheable());
    }

    #[test]
    fn test_offline_placeholder() {
        let response = Response::offline_placeholder("https://example.com/");
        assert_eq!(response.status, 503);
        assert_eq!(response.content_type(), Some("text/plain"));
        assert!(!response.is_cacheable());
    }

    #[test]
    fn test_destination_serde_names() {
        let dest: Destination = serde_json::from_str("\"style\"").unwrap();
        assert_eq!(dest, Destination::Style);
        let mode: RequestMode = serde_json::from_str("\"same-origin\"").unwrap();
        assert_eq!(mode, RequestMode::SameOrigin);
    }
}
