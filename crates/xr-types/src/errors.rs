//! Typed errors for config and share-link codecs.
//!
//! Every failure the codecs can report is a variant of [`CodecError`]. They are
//! deterministic parse/validate failures: callers decide whether to abort, skip
//! the offending endpoint, or surface the message. Nothing here is retried.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Coarse error classification for logging and metrics labels.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Enumerated wire token did not resolve.
    Enum,
    /// Port value in none of the accepted forms.
    Port,
    /// Protocol discriminator not in the registered table.
    Dispatch,
    /// Client/account lookup failed.
    Lookup,
    /// Share-link encode/decode failure.
    Link,
    /// Structural document decode failure.
    Document,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Enum => "enum",
            Self::Port => "port",
            Self::Dispatch => "dispatch",
            Self::Lookup => "lookup",
            Self::Link => "link",
            Self::Document => "document",
        };
        f.write_str(s)
    }
}

/// Error returned by every codec entry point.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodecError {
    /// Wire token matches no alias and no declared name of the enum.
    #[error("unknown token '{token}' for enum {enum_name}")]
    UnknownEnumToken { enum_name: String, token: String },

    /// Port is not a number, a `from-to` range or an `env:NAME` reference.
    #[error("invalid port '{input}': {reason}")]
    InvalidPortFormat { input: String, reason: String },

    /// Endpoint protocol tag has no registered settings type.
    #[error("unsupported protocol: {tag}")]
    UnsupportedProtocol { tag: String },

    /// No client with the given key (email, or username for socks/http).
    #[error("client '{key}' not found in endpoint '{endpoint}'")]
    ClientNotFound { key: String, endpoint: String },

    /// More than one client shares the key; lookups must be unique.
    #[error("client '{key}' is defined more than once in endpoint '{endpoint}'")]
    DuplicateClient { key: String, endpoint: String },

    /// Share links cannot be produced or parsed for this protocol.
    #[error("unsupported link protocol: {protocol}")]
    UnsupportedLinkProtocol { protocol: String },

    /// Share link could not be parsed; `segment` is the offending part.
    #[error("malformed share link at '{segment}': {reason}")]
    MalformedShareLink { segment: String, reason: String },

    /// Structural decode failure; `path` points at the offending field.
    #[error("malformed document at {path}: {message}")]
    MalformedDocument { path: String, message: String },
}

impl CodecError {
    #[inline]
    pub fn unknown_enum_token(enum_name: impl Into<String>, token: impl Into<String>) -> Self {
        Self::UnknownEnumToken {
            enum_name: enum_name.into(),
            token: token.into(),
        }
    }

    #[inline]
    pub fn invalid_port(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPortFormat {
            input: input.into(),
            reason: reason.into(),
        }
    }

    #[inline]
    pub fn unsupported_protocol(tag: impl Into<String>) -> Self {
        Self::UnsupportedProtocol { tag: tag.into() }
    }

    #[inline]
    pub fn client_not_found(key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::ClientNotFound {
            key: key.into(),
            endpoint: endpoint.into(),
        }
    }

    #[inline]
    pub fn duplicate_client(key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::DuplicateClient {
            key: key.into(),
            endpoint: endpoint.into(),
        }
    }

    #[inline]
    pub fn unsupported_link(protocol: impl Into<String>) -> Self {
        Self::UnsupportedLinkProtocol {
            protocol: protocol.into(),
        }
    }

    #[inline]
    pub fn malformed_link(segment: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedShareLink {
            segment: segment.into(),
            reason: reason.into(),
        }
    }

    #[inline]
    pub fn malformed_document(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Classification of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::UnknownEnumToken { .. } => ErrorClass::Enum,
            Self::InvalidPortFormat { .. } => ErrorClass::Port,
            Self::UnsupportedProtocol { .. } => ErrorClass::Dispatch,
            Self::ClientNotFound { .. } | Self::DuplicateClient { .. } => ErrorClass::Lookup,
            Self::UnsupportedLinkProtocol { .. } | Self::MalformedShareLink { .. } => {
                ErrorClass::Link
            }
            Self::MalformedDocument { .. } => ErrorClass::Document,
        }
    }

    /// Prefix a document path onto this error.
    ///
    /// `MalformedDocument` paths are joined (`inbounds[0]` + `settings` →
    /// `inbounds[0].settings`); other variants are wrapped unchanged, since
    /// their payload already names the offending value.
    pub fn at(self, prefix: &str) -> Self {
        match self {
            Self::MalformedDocument { path, message } => {
                let path = if path.is_empty() || path == "$" {
                    prefix.to_string()
                } else if path.starts_with('[') {
                    format!("{prefix}{path}")
                } else {
                    format!("{prefix}.{path}")
                };
                Self::MalformedDocument { path, message }
            }
            other => other,
        }
    }
}

/// Result alias used by the codec crates.
pub type CodecResult<T> = Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_payload() {
        let err = CodecError::unsupported_protocol("quantum-tunnel");
        assert_eq!(err.to_string(), "unsupported protocol: quantum-tunnel");
        assert_eq!(err.class(), ErrorClass::Dispatch);

        let err = CodecError::malformed_link("host:port", "missing port");
        assert_eq!(
            err.to_string(),
            "malformed share link at 'host:port': missing port"
        );
        assert_eq!(err.class().to_string(), "link");
    }

    #[test]
    fn at_joins_document_paths() {
        let err = CodecError::malformed_document("settings.clients", "missing field `id`");
        match err.at("inbounds[1]") {
            CodecError::MalformedDocument { path, .. } => {
                assert_eq!(path, "inbounds[1].settings.clients")
            }
            other => panic!("unexpected {other:?}"),
        }

        let err = CodecError::malformed_document("[2]", "bad");
        match err.at("inbounds") {
            CodecError::MalformedDocument { path, .. } => assert_eq!(path, "inbounds[2]"),
            other => panic!("unexpected {other:?}"),
        }

        let err = CodecError::unsupported_protocol("x").at("inbounds[0]");
        assert_eq!(err, CodecError::unsupported_protocol("x"));
    }
}
