//! Attenuator command encoding
//!
//! Commands are ASCII strings of the form `ATT:<operation>?`, optionally
//! followed by a single float argument. The line terminator is appended by
//! the transport layer, not here.

use std::fmt;

/// A command understood by the attenuator control unit
#[derive(Debug, Clone, PartialEq)]
pub enum AttCommand {
    /// Query the allowed-value table: `ATT:ATTTabGet?`
    TableGet,
    /// Query the current attenuation setting: `ATT:ATTGetCurVal?`
    GetCurrent,
    /// Set the attenuation in dB, unit echoes the new value: `ATT:ATTSet? 5.000000`
    Set(f64),
    /// Step the attenuation up one table entry, unit echoes the new value: `ATT:ATTSetUp?`
    StepUp,
    /// Step the attenuation down one table entry, unit echoes the new value: `ATT:ATTSetDown?`
    StepDown,
}

impl AttCommand {
    /// Encode this command to its wire format, without the line terminator
    pub fn encode(&self) -> String {
        match self {
            AttCommand::TableGet => "ATT:ATTTabGet?".to_string(),
            AttCommand::GetCurrent => "ATT:ATTGetCurVal?".to_string(),
            // The units expect the argument with six decimal places
            AttCommand::Set(db) => format!("ATT:ATTSet? {db:.6}"),
            AttCommand::StepUp => "ATT:ATTSetUp?".to_string(),
            AttCommand::StepDown => "ATT:ATTSetDown?".to_string(),
        }
    }

    /// Short mnemonic for log lines
    pub fn name(&self) -> &'static str {
        match self {
            AttCommand::TableGet => "TabGet",
            AttCommand::GetCurrent => "GetCurVal",
            AttCommand::Set(_) => "Set",
            AttCommand::StepUp => "SetUp",
            AttCommand::StepDown => "SetDown",
        }
    }
}

impl fmt::Display for AttCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttCommand::Set(db) => write!(f, "Set({db})"),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_queries() {
        assert_eq!(AttCommand::TableGet.encode(), "ATT:ATTTabGet?");
        assert_eq!(AttCommand::GetCurrent.encode(), "ATT:ATTGetCurVal?");
        assert_eq!(AttCommand::StepUp.encode(), "ATT:ATTSetUp?");
        assert_eq!(AttCommand::StepDown.encode(), "ATT:ATTSetDown?");
    }

    #[test]
    fn test_encode_set_fixed_precision() {
        assert_eq!(AttCommand::Set(5.0).encode(), "ATT:ATTSet? 5.000000");
        assert_eq!(AttCommand::Set(12.5).encode(), "ATT:ATTSet? 12.500000");
        assert_eq!(AttCommand::Set(0.0).encode(), "ATT:ATTSet? 0.000000");
    }

    #[test]
    fn test_display_names() {
        assert_eq!(AttCommand::TableGet.to_string(), "TabGet");
        assert_eq!(AttCommand::Set(5.0).to_string(), "Set(5)");
    }
}
