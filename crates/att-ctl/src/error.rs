//! Error types for the attenuator control stack

use thiserror::Error;

use att_protocol::ProtocolError;

/// Errors that can occur on a single instrument channel
#[derive(Debug, Error)]
pub enum SessionError {
    /// Failed to open the serial channel
    #[error("failed to open {port}: {source}")]
    Open {
        /// Port the open was attempted on
        port: String,
        /// Underlying serial error
        source: serialport::Error,
    },

    /// No complete response line arrived within the configured timeout
    #[error("timeout waiting for response from {port}")]
    Timeout {
        /// Port the command was issued on
        port: String,
    },

    /// I/O failure on the channel
    #[error("I/O error on {port}: {source}")]
    Io {
        /// Port the command was issued on
        port: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Response did not parse as expected
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Command issued after the session was closed
    #[error("session for {port} is closed")]
    Closed {
        /// Port the session was bound to
        port: String,
    },
}

/// Errors that abort registry construction
///
/// Construction is all-or-nothing: any failure closes every session opened
/// so far and no partial registry is returned.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// No matching devices to open
    #[error("no ACM resources found, please check your devices connection")]
    NoDevices,

    /// A unit failed to open or to answer its initial table query
    #[error("failed to bring up {name} on {port}: {source}")]
    Instrument {
        /// Logical name the unit would have been assigned
        name: String,
        /// Port the unit was being opened on
        port: String,
        /// What went wrong
        source: SessionError,
    },
}

/// Errors from registry lookups
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Unknown logical name
    #[error("instrument not found: {0}")]
    NotFound(String),
}
