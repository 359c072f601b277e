//! Error types for the OFS client
//!
//! Provides a unified error type for all client operations.

use thiserror::Error;

/// Result type alias using OfsError
pub type Result<T> = std::result::Result<T, OfsError>;

/// Unified error type for OFS client operations
#[derive(Debug, Error)]
pub enum OfsError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    #[error("Could not connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Not connected")]
    NotConnected,

    #[error("Connection closed by server")]
    ConnectionClosed,

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Content line {line} collides with the end-of-content sentinel")]
    SentinelCollision { line: usize },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl OfsError {
    /// True for failures that happened on the wire.
    ///
    /// After one of these the stream position is unknown, so the client
    /// drops its connection.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            OfsError::Io(_) | OfsError::ConnectionClosed | OfsError::Protocol(_)
        )
    }
}
