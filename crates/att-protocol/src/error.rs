//! Error types for attenuator protocol parsing

use thiserror::Error;

/// Errors that can occur while interpreting instrument responses
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    /// Response line did not parse as a number where one was expected
    #[error("malformed numeric response: {0:?}")]
    MalformedReading(String),

    /// Instrument returned an empty line where a number was expected
    #[error("empty response")]
    EmptyResponse,

    /// Response kept growing without a line terminator
    #[error("response exceeded {limit} bytes without a terminator")]
    OversizeResponse {
        /// Accumulation limit that was hit
        limit: usize,
    },
}
