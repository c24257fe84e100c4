use crate::domain::ValidationError;
use thiserror::Error;

/// Failures at the wire level, below any notion of a monitoring operation.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {url}: {message}")]
    Connect { url: String, message: String },

    #[error("connection closed")]
    Closed,

    #[error("websocket error: {message}")]
    WebSocket { message: String },

    #[error("handshake failed: {message}")]
    Handshake { message: String },

    #[error("acknowledgment for '{event}' timed out")]
    AckTimeout { event: String },

    #[error("failed to encode payload for '{event}': {source}")]
    Encode {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything a mediator operation can fail with. The dispatcher converts any
/// of these into an `Error: <message>` tool response; nothing escapes as a
/// panic or raw error.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("client not initialized")]
    NotInitialized,

    #[error("invalid monitor configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("connection failed: {0}")]
    Connection(#[from] TransportError),

    #[error("authentication failed: {message}")]
    Authentication { message: String },

    #[error("no credentials configured: set a token or a username and password")]
    NoCredentials,

    #[error("remote operation '{op}' failed: {message}")]
    Operation { op: String, message: String },

    #[error("timed out waiting for '{event}' event")]
    Timeout { event: String },

    #[error("invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),
}
