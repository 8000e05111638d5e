//! Error types for TPI protocol operations
//!
//! This module defines the error types that can occur when talking to a
//! receiver over TPI or decoding the plain-text bodies it returns.

use crate::protocol::types::{ObjectKind, Verb};

/// Main error type for TPI operations
///
/// Every failure a caller can observe is one of these variants. Nothing
/// in this crate retries on error.
#[derive(Debug)]
pub enum TpiError {
    /// The client was configured with unusable settings
    ///
    /// Raised at construction, before any request is issued, for example
    /// when the receiver address is not a dotted-quad IPv4 address.
    Configuration(&'static str),

    /// The receiver did not list this verb/object pair in its command table
    ///
    /// Raised before any network call is attempted.
    UnsupportedCommand(Verb, ObjectKind),

    /// The HTTP transport failed
    ///
    /// The transport's own error is carried unmodified.
    Transport(Box<dyn core::error::Error + Send + Sync>),

    /// The receiver answered with an empty body or an `ERROR:` line
    ///
    /// Contains the body as received.
    Protocol(String),

    /// The body did not match the object's extraction pattern
    Decode(DecodeError),

    /// A client-side precondition failed; no request was sent
    Validation(String),

    /// A write could not be confirmed from the receiver's echo
    ///
    /// The receiver may or may not have applied the change.
    OperationFailed(Verb, ObjectKind),
}

/// Reasons a present body failed to decode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The pattern for this object matched nothing in the body
    NoMatch(ObjectKind),
    /// A required field was absent from a matched record
    MissingField(&'static str),
    /// A field was present but not in its declared format
    InvalidField { field: &'static str, value: String },
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DecodeError::NoMatch(kind) => write!(f, "no {} record in response", kind),
            DecodeError::MissingField(field) => write!(f, "missing field `{}`", field),
            DecodeError::InvalidField { field, value } => {
                write!(f, "invalid value {:?} for field `{}`", value, field)
            }
        }
    }
}

impl core::fmt::Display for TpiError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TpiError::Configuration(msg) => write!(f, "ConfigurationError: {}", msg),
            TpiError::UnsupportedCommand(verb, object) => write!(
                f,
                "UnsupportedCommandError: {}:{} is not supported by this receiver",
                verb, object
            ),
            TpiError::Transport(err) => write!(f, "TransportError: {}", err),
            TpiError::Protocol(body) if body.trim().is_empty() => {
                write!(f, "ProtocolError: empty response")
            }
            TpiError::Protocol(body) => write!(f, "ProtocolError: {}", body.trim_end()),
            TpiError::Decode(err) => write!(f, "DecodeError: {}", err),
            TpiError::Validation(msg) => write!(f, "ValidationError: {}", msg),
            TpiError::OperationFailed(verb, object) => write!(
                f,
                "OperationFailedError: {}:{} was not confirmed by the receiver",
                verb, object
            ),
        }
    }
}

impl core::error::Error for TpiError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            TpiError::Transport(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl TpiError {
    /// Wraps a transport failure without altering it
    pub fn transport<E>(err: E) -> Self
    where
        E: core::error::Error + Send + Sync + 'static,
    {
        TpiError::Transport(Box::new(err))
    }
}

impl From<DecodeError> for TpiError {
    fn from(err: DecodeError) -> Self {
        TpiError::Decode(err)
    }
}
