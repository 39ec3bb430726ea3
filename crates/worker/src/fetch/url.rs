//! URL scoping for the agent: resolving paths against the application origin
//! and deciding whether a URL belongs to it at all.

use url::Url;

/// Schemes used by browser extensions. Requests to them are never cached.
pub const EXTENSION_SCHEMES: &[&str] = &["chrome-extension", "moz-extension", "safari-extension", "safari-web-extension"];

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve `input` against `origin`.
///
/// Steps:
/// 1. Trim leading/trailing whitespace
/// 2. Absolute URLs are kept, anything else is joined onto the origin
/// 3. Remove fragment (#...)
/// 4. Keep query string intact
///
/// Extension schemes are accepted so the router can see and skip them; any
/// other non-http(s) scheme is rejected.
pub fn resolve(origin: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?
        }
        Err(e) => return Err(UrlError::InvalidUrl(e.to_string())),
    };

    match parsed.scheme() {
        "http" | "https" => {}
        scheme if is_extension_scheme(scheme) => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

pub fn is_extension_scheme(scheme: &str) -> bool {
    EXTENSION_SCHEMES.contains(&scheme)
}

/// Scheme, host and port all match.
pub fn is_same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

/// Lower-cased extension of the last path segment, if any.
pub fn path_extension(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.next_back()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
