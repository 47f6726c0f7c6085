//! Simulated attenuator unit
//!
//! Holds the mechanical state (an index into the allowed-value table) and
//! answers protocol commands with protocol-accurate response lines. Written
//! bytes are accumulated until a full terminated command arrives; response
//! bytes wait in an output queue until read.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use att_protocol::parse_reading;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Line terminator used by attenuator units
const TERMINATOR: &[u8] = b"\r\n";

/// Configuration for creating a simulated unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimAttenuatorConfig {
    /// Display name/identifier
    pub id: String,
    /// Allowed-value table, ascending in dB
    pub table: Vec<String>,
    /// Starting position in the table
    pub initial_index: usize,
}

impl Default for SimAttenuatorConfig {
    fn default() -> Self {
        Self {
            id: "sim-att".to_string(),
            table: ["0", "5", "10", "15", "20", "25", "30"]
                .map(str::to_string)
                .to_vec(),
            initial_index: 0,
        }
    }
}

/// A simulated attenuator unit driven through `Read` + `Write`
#[derive(Debug)]
pub struct SimAttenuator {
    /// Unique identifier for this simulated unit
    id: String,
    /// Allowed-value table
    table: Vec<String>,
    /// Current position in the table
    index: usize,
    /// Bytes written by the controller, pending command framing
    inbound: Vec<u8>,
    /// Response bytes waiting to be read
    outbound: VecDeque<u8>,
    /// Swallow responses (unit goes silent)
    mute: bool,
    /// Replace responses with a non-numeric error line
    garble: bool,
}

impl SimAttenuator {
    /// Create a simulated unit with the default table
    pub fn new(id: impl Into<String>) -> Self {
        Self::from_config(SimAttenuatorConfig {
            id: id.into(),
            ..Default::default()
        })
    }

    /// Create a simulated unit with a specific table
    pub fn with_table(id: impl Into<String>, table: &[&str]) -> Self {
        Self::from_config(SimAttenuatorConfig {
            id: id.into(),
            table: table.iter().map(|t| t.to_string()).collect(),
            initial_index: 0,
        })
    }

    /// Create a simulated unit from configuration
    pub fn from_config(config: SimAttenuatorConfig) -> Self {
        let table = if config.table.is_empty() {
            SimAttenuatorConfig::default().table
        } else {
            config.table
        };
        let index = config.initial_index.min(table.len() - 1);

        Self {
            id: config.id,
            table,
            index,
            inbound: Vec::new(),
            outbound: VecDeque::new(),
            mute: false,
            garble: false,
        }
    }

    /// Get the unit's identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current position in the allowed-value table
    pub fn current_index(&self) -> usize {
        self.index
    }

    /// Current attenuation token
    pub fn current_value(&self) -> &str {
        &self.table[self.index]
    }

    /// Allowed-value table
    pub fn table(&self) -> &[String] {
        &self.table
    }

    /// Silence the unit: commands are still executed but nothing is sent
    /// back, so the controller's read runs into its timeout
    pub fn set_mute(&mut self, mute: bool) {
        self.mute = mute;
    }

    /// Make the unit answer every command with a non-numeric error line
    pub fn set_garble(&mut self, garble: bool) {
        self.garble = garble;
    }

    /// Process buffered input into commands and queue their responses
    fn pump(&mut self) {
        while let Some(end) = find_terminator(&self.inbound) {
            let line: Vec<u8> = self.inbound.drain(..end + TERMINATOR.len()).collect();
            let command = String::from_utf8_lossy(&line[..end]).into_owned();
            trace!("{} <- {:?}", self.id, command);
            self.handle_command(&command);
        }
    }

    /// Execute one command and queue its single response line
    fn handle_command(&mut self, command: &str) {
        let response = match command {
            "ATT:ATTTabGet?" => self.table.join(","),
            "ATT:ATTGetCurVal?" => self.table[self.index].clone(),
            "ATT:ATTSetUp?" => {
                if self.index + 1 < self.table.len() {
                    self.index += 1;
                }
                self.table[self.index].clone()
            }
            "ATT:ATTSetDown?" => {
                self.index = self.index.saturating_sub(1);
                self.table[self.index].clone()
            }
            _ => match command.strip_prefix("ATT:ATTSet? ") {
                Some(arg) => self.apply_set(arg),
                None => {
                    debug!("{}: unknown command {:?}", self.id, command);
                    "?ERR".to_string()
                }
            },
        };

        if self.mute {
            return;
        }

        let line = if self.garble {
            "?ERR".to_string()
        } else {
            response
        };
        trace!("{} -> {:?}", self.id, line);
        self.outbound.extend(line.as_bytes());
        self.outbound.extend(TERMINATOR);
    }

    /// Move to the table entry numerically equal to the requested value
    ///
    /// A value outside the table leaves the setting unchanged; either way
    /// the response reports the resulting position.
    fn apply_set(&mut self, arg: &str) -> String {
        if let Ok(requested) = parse_reading(arg) {
            let hit = self
                .table
                .iter()
                .position(|t| parse_reading(t) == Ok(requested));
            if let Some(i) = hit {
                self.index = i;
            }
        }
        self.table[self.index].clone()
    }
}

impl Write for SimAttenuator {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inbound.extend_from_slice(buf);
        self.pump();
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Read for SimAttenuator {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.outbound.is_empty() {
            // A real port with a read timeout behaves the same way when the
            // unit stays silent.
            return Err(std::io::Error::new(ErrorKind::TimedOut, "unit idle"));
        }

        let n = self.outbound.len().min(buf.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.outbound.pop_front().unwrap_or_default();
        }
        Ok(n)
    }
}

/// Find the end of the first complete command line
fn find_terminator(data: &[u8]) -> Option<usize> {
    data.windows(TERMINATOR.len())
        .position(|w| w == TERMINATOR)
}

/// Cloneable handle to a shared simulated unit
///
/// Lets a test hand the unit to a session while keeping a second handle to
/// inspect state or inject faults mid-run.
#[derive(Debug, Clone)]
pub struct SharedSim(Arc<Mutex<SimAttenuator>>);

impl SharedSim {
    /// Wrap a simulated unit in a shared handle
    pub fn new(unit: SimAttenuator) -> Self {
        Self(Arc::new(Mutex::new(unit)))
    }

    /// Lock the underlying unit
    pub fn lock(&self) -> MutexGuard<'_, SimAttenuator> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Read for SharedSim {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.lock().read(buf)
    }
}

impl Write for SharedSim {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.lock().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.lock().flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(unit: &mut SimAttenuator, command: &str) -> String {
        unit.write_all(command.as_bytes()).unwrap();
        unit.write_all(b"\r\n").unwrap();

        let mut out = Vec::new();
        let mut buf = [0u8; 64];
        loop {
            match unit.read(&mut buf) {
                Ok(n) => out.extend_from_slice(&buf[..n]),
                Err(_) => break,
            }
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_table_query() {
        let mut unit = SimAttenuator::with_table("t", &["0", "5", "10"]);
        assert_eq!(exchange(&mut unit, "ATT:ATTTabGet?"), "0,5,10\r\n");
    }

    #[test]
    fn test_get_current_value() {
        let mut unit = SimAttenuator::with_table("t", &["0", "5", "10"]);
        assert_eq!(exchange(&mut unit, "ATT:ATTGetCurVal?"), "0\r\n");
    }

    #[test]
    fn test_set_moves_to_matching_entry() {
        let mut unit = SimAttenuator::with_table("t", &["0", "5", "10"]);
        assert_eq!(exchange(&mut unit, "ATT:ATTSet? 5.000000"), "5\r\n");
        assert_eq!(unit.current_index(), 1);
    }

    #[test]
    fn test_set_outside_table_keeps_state() {
        let mut unit = SimAttenuator::with_table("t", &["0", "5", "10"]);
        assert_eq!(exchange(&mut unit, "ATT:ATTSet? 7.000000"), "0\r\n");
        assert_eq!(unit.current_index(), 0);
    }

    #[test]
    fn test_step_up_and_down() {
        let mut unit = SimAttenuator::with_table("t", &["0", "5", "10"]);
        assert_eq!(exchange(&mut unit, "ATT:ATTSetUp?"), "5\r\n");
        assert_eq!(exchange(&mut unit, "ATT:ATTSetUp?"), "10\r\n");
        assert_eq!(exchange(&mut unit, "ATT:ATTSetDown?"), "5\r\n");
    }

    #[test]
    fn test_steps_clamp_at_table_bounds() {
        let mut unit = SimAttenuator::with_table("t", &["0", "5"]);
        assert_eq!(exchange(&mut unit, "ATT:ATTSetDown?"), "0\r\n");
        assert_eq!(exchange(&mut unit, "ATT:ATTSetUp?"), "5\r\n");
        assert_eq!(exchange(&mut unit, "ATT:ATTSetUp?"), "5\r\n");
    }

    #[test]
    fn test_command_split_across_writes() {
        let mut unit = SimAttenuator::with_table("t", &["0", "5"]);
        unit.write_all(b"ATT:ATTGet").unwrap();
        unit.write_all(b"CurVal?\r").unwrap();
        unit.write_all(b"\n").unwrap();

        let mut buf = [0u8; 16];
        let n = unit.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"0\r\n");
    }

    #[test]
    fn test_unknown_command_gets_error_line() {
        let mut unit = SimAttenuator::new("t");
        assert_eq!(exchange(&mut unit, "ATT:Bogus?"), "?ERR\r\n");
    }

    #[test]
    fn test_mute_swallows_response() {
        let mut unit = SimAttenuator::with_table("t", &["0", "5"]);
        unit.set_mute(true);
        unit.write_all(b"ATT:ATTSetUp?\r\n").unwrap();

        let mut buf = [0u8; 16];
        let err = unit.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TimedOut);
        // The command itself still executed
        assert_eq!(unit.current_index(), 1);
    }

    #[test]
    fn test_garble_replaces_response() {
        let mut unit = SimAttenuator::with_table("t", &["0", "5"]);
        unit.set_garble(true);
        assert_eq!(exchange(&mut unit, "ATT:ATTGetCurVal?"), "?ERR\r\n");
    }

    #[test]
    fn test_idle_read_times_out() {
        let mut unit = SimAttenuator::new("t");
        let mut buf = [0u8; 16];
        assert_eq!(
            unit.read(&mut buf).unwrap_err().kind(),
            ErrorKind::TimedOut
        );
    }

    #[test]
    fn test_shared_handle_sees_state_changes() {
        let handle = SharedSim::new(SimAttenuator::with_table("t", &["0", "5"]));
        let mut io = handle.clone();

        io.write_all(b"ATT:ATTSetUp?\r\n").unwrap();
        let mut buf = [0u8; 16];
        let n = io.read(&mut buf).unwrap();

        assert_eq!(&buf[..n], b"5\r\n");
        assert_eq!(handle.lock().current_index(), 1);
    }

    #[test]
    fn test_from_config_clamps_index() {
        let unit = SimAttenuator::from_config(SimAttenuatorConfig {
            id: "t".to_string(),
            table: vec!["0".to_string(), "5".to_string()],
            initial_index: 9,
        });
        assert_eq!(unit.current_index(), 1);
    }
}
