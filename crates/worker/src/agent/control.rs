//! Control messages sent by application clients.
//!
//! On the wire a message is `{ "type": "SKIP_WAITING" }` or
//! `{ "type": "CLEAR_CACHE" }`; hosts hand over the `type` string.

use swcache_core::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// Activate the installed worker without waiting for old clients.
    SkipWaiting,
    /// Delete every partition, whatever its version.
    ClearCache,
}

impl ControlMessage {
    /// Build a message from its `type` string. Unknown types are rejected.
    pub fn from_type(kind: &str) -> Result<Self, Error> {
        match kind {
            "SKIP_WAITING" => Ok(Self::SkipWaiting),
            "CLEAR_CACHE" => Ok(Self::ClearCache),
            other => Err(Error::InvalidInput(format!("unknown control message type: {other}"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SkipWaiting => "SKIP_WAITING",
            Self::ClearCache => "CLEAR_CACHE",
        }
    }
}
