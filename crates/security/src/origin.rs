//! Origins and `postMessage` target origins.

use std::fmt;
use thiserror::Error;
use url::Url;

/// Represents an origin (scheme, host, port tuple).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Origin {
    pub scheme: String,
    pub host: String,
    pub port: Option<u16>,
}

impl Origin {
    /// Create a new origin from components.
    pub fn new(scheme: &str, host: &str, port: Option<u16>) -> Self {
        Self {
            scheme: scheme.to_lowercase(),
            host: host.to_lowercase(),
            port,
        }
    }

    /// Parse an origin from a URL.
    ///
    /// Returns `None` for schemes whose origin is opaque.
    pub fn from_url(url: &Url) -> Option<Self> {
        let scheme = url.scheme().to_lowercase();

        if matches!(scheme.as_str(), "data" | "file" | "blob" | "javascript" | "about") {
            return None;
        }

        let host = url.host_str()?.to_lowercase();
        let port = url.port_or_known_default();

        Some(Self { scheme, host, port })
    }

    /// Parse an origin from a string URL.
    pub fn parse(url_str: &str) -> Option<Self> {
        let url = Url::parse(url_str).ok()?;
        Self::from_url(&url)
    }

    /// Check if this origin is the same as another.
    pub fn is_same_origin(&self, other: &Origin) -> bool {
        self.scheme == other.scheme
            && self.host == other.host
            && self.effective_port() == other.effective_port()
    }

    /// Get the effective port (using default ports for known schemes).
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| match self.scheme.as_str() {
            "http" | "ws" => 80,
            "https" | "wss" => 443,
            _ => 0,
        })
    }

    /// Serialize the origin to a string.
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let default_port = match self.scheme.as_str() {
            "http" => Some(80),
            "https" => Some(443),
            _ => None,
        };

        match self.port {
            Some(port) if Some(port) != default_port => {
                write!(f, "{}://{}:{}", self.scheme, self.host, port)
            }
            _ => write!(f, "{}://{}", self.scheme, self.host),
        }
    }
}

/// Serialize an optional origin, using `"null"` for opaque origins.
pub fn serialize_origin(origin: Option<&Origin>) -> String {
    origin.map_or_else(|| "null".to_string(), Origin::serialize)
}

/// Error produced when a target origin cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid target origin: '{0}'")]
pub struct OriginError(pub String);

/// The `targetOrigin` argument of `postMessage`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetOrigin {
    /// `"*"`: deliver to any recipient.
    Any,
    /// `"/"`: deliver only to a recipient sharing the sender's origin.
    SameAsSender,
    /// Deliver only to a recipient with exactly this origin.
    Exact(Origin),
}

impl TargetOrigin {
    /// Parse a target origin string.
    pub fn parse(value: &str) -> Result<Self, OriginError> {
        match value {
            "*" => Ok(Self::Any),
            "/" => Ok(Self::SameAsSender),
            other => Origin::parse(other)
                .map(Self::Exact)
                .ok_or_else(|| OriginError(other.to_string())),
        }
    }

    /// Check whether a message from `sender` may be delivered to `recipient`.
    ///
    /// Opaque origins (`None`) only ever match `Any`.
    pub fn allows(&self, sender: Option<&Origin>, recipient: Option<&Origin>) -> bool {
        match self {
            Self::Any => true,
            Self::SameAsSender => match (sender, recipient) {
                (Some(sender), Some(recipient)) => sender.is_same_origin(recipient),
                _ => false,
            },
            Self::Exact(target) => recipient.is_some_and(|r| target.is_same_origin(r)),
        }
    }
}
