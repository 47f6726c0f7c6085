//! Control facade
//!
//! The public operations over a registry. Every operation returns an
//! [`OpOutcome`]; lower-layer failures never cross this boundary as errors.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{Read, Write};

use tracing::debug;

use att_protocol::AttCommand;

use crate::registry::AttRegistry;

/// Message for get/set against an unknown logical name
const MSG_NAME_NOT_FOUND: &str = "Instrument name not found";
/// Message for a set value outside the unit's table. Step operations reuse
/// this message for unknown names as well; downstream tooling matches on
/// the exact text of both messages.
const MSG_UNSUPPORTED_VALUE: &str = "Unsupported attenuation value";

/// Result triple of one control operation
#[derive(Debug, Clone, PartialEq)]
pub struct OpOutcome {
    /// Whether the operation succeeded
    pub success: bool,
    /// Attenuation reading in dB, when one was obtained
    pub value: Option<f64>,
    /// Failure description, empty on success
    pub message: String,
}

impl OpOutcome {
    /// Successful outcome carrying a reading
    pub fn ok(value: f64) -> Self {
        Self {
            success: true,
            value: Some(value),
            message: String::new(),
        }
    }

    /// Failed outcome with a description
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            value: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for OpOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(v) => write!(f, "({}, {}, {:?})", self.success, v, self.message),
            None => write!(f, "({}, none, {:?})", self.success, self.message),
        }
    }
}

/// Public control operations over a set of registered attenuators
pub struct AttControl<T> {
    registry: AttRegistry<T>,
}

impl<T> AttControl<T> {
    /// Wrap an initialized registry
    pub fn new(registry: AttRegistry<T>) -> Self {
        Self { registry }
    }

    /// Logical instrument names in discovery order
    pub fn names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Allowed attenuation tokens per instrument
    pub fn allowed_values(&self) -> BTreeMap<String, Vec<String>> {
        self.registry.allowed_values()
    }

    /// Close every session
    pub fn shutdown(&mut self) {
        self.registry.shutdown();
    }
}

impl<T: Read + Write> AttControl<T> {
    /// Query the current attenuation of one instrument
    pub fn get_value(&mut self, name: &str) -> OpOutcome {
        let session = match self.registry.session_mut(name) {
            Ok(s) => s,
            Err(_) => return OpOutcome::fail(MSG_NAME_NOT_FOUND),
        };

        match session.query_reading(&AttCommand::GetCurrent) {
            Ok(db) => OpOutcome::ok(db),
            Err(e) => OpOutcome::fail(e.to_string()),
        }
    }

    /// Set the attenuation of one instrument to an allowed value
    ///
    /// `token` is validated against the unit's cached table by exact string
    /// comparison: `"5.0"` is rejected when the table says `"5"`.
    pub fn set_value(&mut self, name: &str, token: &str) -> OpOutcome {
        let allowed = match self.registry.allowed_values_for(name) {
            Some(table) => table,
            None => return OpOutcome::fail(MSG_NAME_NOT_FOUND),
        };
        if !allowed.iter().any(|t| t == token) {
            debug!("{}: {:?} not in table {:?}", name, token, allowed);
            return OpOutcome::fail(MSG_UNSUPPORTED_VALUE);
        }

        // A table token the unit itself reported should always be numeric;
        // treat one that is not like any other unusable value.
        let db: f64 = match token.trim().parse() {
            Ok(v) => v,
            Err(_) => return OpOutcome::fail(MSG_UNSUPPORTED_VALUE),
        };

        self.issue(name, &AttCommand::Set(db))
    }

    /// Increase the attenuation by one table step
    pub fn step_up(&mut self, name: &str) -> OpOutcome {
        if !self.registry.contains(name) {
            return OpOutcome::fail(MSG_UNSUPPORTED_VALUE);
        }
        self.issue(name, &AttCommand::StepUp)
    }

    /// Decrease the attenuation by one table step
    pub fn step_down(&mut self, name: &str) -> OpOutcome {
        if !self.registry.contains(name) {
            return OpOutcome::fail(MSG_UNSUPPORTED_VALUE);
        }
        self.issue(name, &AttCommand::StepDown)
    }

    /// Issue a command against a registered instrument, folding any session
    /// failure into the outcome
    fn issue(&mut self, name: &str, command: &AttCommand) -> OpOutcome {
        let session = match self.registry.session_mut(name) {
            Ok(s) => s,
            Err(e) => return OpOutcome::fail(e.to_string()),
        };

        match session.query_reading(command) {
            Ok(db) => OpOutcome::ok(db),
            Err(e) => OpOutcome::fail(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        assert_eq!(OpOutcome::ok(5.0).to_string(), "(true, 5, \"\")");
        assert_eq!(OpOutcome::ok(12.5).to_string(), "(true, 12.5, \"\")");
        assert_eq!(
            OpOutcome::fail("Unsupported attenuation value").to_string(),
            "(false, none, \"Unsupported attenuation value\")"
        );
    }
}
