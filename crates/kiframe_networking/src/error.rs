//! Error types for the transport layer.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::bridge::BridgeState;

/// Transport and protocol errors.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The rendezvous endpoint could not be bound.
    #[error("failed to bind {path}: {source}")]
    Bind {
        /// Rendezvous path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// No producer connected in time.
    #[error("no peer connected to {path} within {timeout_ms}ms")]
    AcceptTimeout {
        /// Rendezvous path.
        path: PathBuf,
        /// Timeout that expired.
        timeout_ms: u64,
    },

    /// A blocking wait gave up.
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    /// `stop()` was called while waiting.
    #[error("operation cancelled by stop")]
    Cancelled,

    /// Operation called in the wrong lifecycle state.
    #[error("invalid bridge state: expected {expected:?}, found {found:?}")]
    InvalidState {
        /// State the operation needs.
        expected: BridgeState,
        /// State the bridge is in.
        found: BridgeState,
    },

    /// Payload longer than a frame header can describe.
    #[error("payload of {len} bytes exceeds limit of {max}")]
    PayloadTooLarge {
        /// Announced length.
        len: u64,
        /// Configured limit.
        max: u32,
    },

    /// Payload is not a valid document of the expected shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// Payload is not UTF-8.
    #[error("payload is not UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// Peer closed the connection.
    #[error("peer disconnected")]
    Disconnected,

    /// Any other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl NetworkError {
    /// True for errors that only spoil one message.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::MalformedPayload(_) | Self::InvalidUtf8(_))
    }
}

/// Result type for transport operations.
pub type NetworkResult<T> = Result<T, NetworkError>;
