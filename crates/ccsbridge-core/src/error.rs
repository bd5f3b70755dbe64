//! Shared error type across ccsbridge crates.

use thiserror::Error;

/// Stable error categories (used in logs, metrics labels, and tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Transport/network failure before authentication.
    Unreachable,
    /// Relay rejected the login.
    InvalidCredentials,
    /// Extension body was not the expected text node.
    MalformedExtension,
    /// JSON encode/decode failed.
    Serialization,
    /// Transport rejected a write.
    SendFailure,
    /// Application callback failed.
    ApplicationCallback,
    /// Operation needs a live session.
    NotConnected,
    /// Invalid configuration or request.
    BadConfig,
    /// Unsupported config version.
    UnsupportedVersion,
    /// HTTP relay answered with a non-success status.
    HttpStatus,
    /// HTTP request failed before a status was received.
    Http,
    /// Internal failure (task join, poisoned state).
    Internal,
}

impl ErrorKind {
    /// String representation used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Unreachable => "UNREACHABLE",
            ErrorKind::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorKind::MalformedExtension => "MALFORMED_EXTENSION",
            ErrorKind::Serialization => "SERIALIZATION",
            ErrorKind::SendFailure => "SEND_FAILURE",
            ErrorKind::ApplicationCallback => "APPLICATION_CALLBACK",
            ErrorKind::NotConnected => "NOT_CONNECTED",
            ErrorKind::BadConfig => "BAD_CONFIG",
            ErrorKind::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorKind::HttpStatus => "HTTP_STATUS",
            ErrorKind::Http => "HTTP",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("relay unreachable: {0}")]
    Unreachable(String),
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
    #[error("malformed extension: {0}")]
    MalformedExtension(String),
    #[error("serialization failed: {0}")]
    Serialization(String),
    #[error("send failed: {0}")]
    SendFailure(String),
    #[error("application callback failed: {0}")]
    ApplicationCallback(String),
    #[error("not connected")]
    NotConnected,
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("received status code: {status}, entity: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("http: {0}")]
    Http(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Map the error to its stable category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::Unreachable(_) => ErrorKind::Unreachable,
            BridgeError::InvalidCredentials(_) => ErrorKind::InvalidCredentials,
            BridgeError::MalformedExtension(_) => ErrorKind::MalformedExtension,
            BridgeError::Serialization(_) => ErrorKind::Serialization,
            BridgeError::SendFailure(_) => ErrorKind::SendFailure,
            BridgeError::ApplicationCallback(_) => ErrorKind::ApplicationCallback,
            BridgeError::NotConnected => ErrorKind::NotConnected,
            BridgeError::BadConfig(_) => ErrorKind::BadConfig,
            BridgeError::UnsupportedVersion => ErrorKind::UnsupportedVersion,
            BridgeError::HttpStatus { .. } => ErrorKind::HttpStatus,
            BridgeError::Http(_) => ErrorKind::Http,
            BridgeError::Internal(_) => ErrorKind::Internal,
        }
    }
}
