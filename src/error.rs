//! Error types for tyrant-cache
//!
//! Provides a unified error type for all operations. Expected outcomes such as
//! a missing key or an existing key on put-if-absent are NOT errors; they are
//! returned as ordinary values by the client.

use thiserror::Error;

/// Result type alias using CacheError
pub type Result<T> = std::result::Result<T, CacheError>;

/// Unified error type for tyrant-cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    /// A session could not be established. Fatal when raised at client
    /// construction; never retried.
    #[error("Connect error ({addr}): {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    /// Socket-level failure during an in-flight request (reset, broken pipe,
    /// timeout, truncated read).
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Request Errors
    // -------------------------------------------------------------------------
    /// The request breaks a wire limit and was never sent.
    #[error("Request too large: {0}")]
    Oversized(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CacheError {
    /// Whether the client should discard its session and retry once.
    ///
    /// Only transport and protocol failures qualify. A corrupt payload or a
    /// bad address will not be fixed by reconnecting.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CacheError::Transport(_) | CacheError::Protocol(_))
    }

    /// Whether this is a socket timeout rather than a hard failure
    pub fn is_timeout(&self) -> bool {
        match self {
            CacheError::Transport(e) => matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}

impl From<bincode::Error> for CacheError {
    fn from(err: bincode::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}
