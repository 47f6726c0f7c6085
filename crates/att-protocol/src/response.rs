//! Instrument response parsing
//!
//! Every command yields exactly one response line. Numeric responses are
//! parsed as floats; the allowed-value table is kept as the instrument
//! formatted it, token for token.

use crate::error::ProtocolError;

/// Parse a single-line numeric response into an attenuation reading in dB
pub fn parse_reading(line: &str) -> Result<f64, ProtocolError> {
    let text = line.trim();
    if text.is_empty() {
        return Err(ProtocolError::EmptyResponse);
    }
    text.parse::<f64>()
        .map_err(|_| ProtocolError::MalformedReading(text.to_string()))
}

/// Split an allowed-value table response into its tokens
///
/// Tokens are NOT trimmed or numerically normalized: the table is the
/// validation source for `set`, and membership is an exact string
/// comparison against what the instrument reported.
pub fn parse_value_table(line: &str) -> Vec<String> {
    line.split(',').map(str::to_string).collect()
}
