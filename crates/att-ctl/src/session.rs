//! Instrument session
//!
//! One session owns one exclusive serial channel to one attenuator unit.
//! Commands go out as a single terminated line; every command yields exactly
//! one response line, read with a bounded deadline. There is no retry logic
//! at this layer, a failed round trip surfaces immediately.

use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use serialport::SerialPort;
use tracing::{debug, trace};

use att_protocol::{parse_reading, AttCommand, ProtocolError};

use crate::error::SessionError;

/// Accumulation limit for a single response line
const MAX_RESPONSE_LEN: usize = 256;

/// Per-session channel settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Deadline for one command/response round trip
    pub timeout: Duration,
    /// Line terminator appended to commands and expected on responses
    pub terminator: Vec<u8>,
    /// Baud rate for the serial channel (CDC-ACM units ignore it, but the
    /// port still has to be configured with something)
    pub baud_rate: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(1000),
            terminator: b"\r\n".to_vec(),
            baud_rate: 115_200,
        }
    }
}

/// An open command/response channel to one attenuator unit
///
/// Generic over the transport so tests can drive a simulated unit; real
/// sessions use `Box<dyn SerialPort>`.
pub struct AttSession<T> {
    transport: Option<T>,
    port: String,
    timeout: Duration,
    terminator: Vec<u8>,
}

impl AttSession<Box<dyn SerialPort>> {
    /// Open a serial channel to the unit at `port_name`
    pub fn open(port_name: &str, config: &SessionConfig) -> Result<Self, SessionError> {
        let port = serialport::new(port_name, config.baud_rate)
            .timeout(config.timeout)
            .open()
            .map_err(|e| SessionError::Open {
                port: port_name.to_string(),
                source: e,
            })?;

        debug!("Opened {} at {} baud", port_name, config.baud_rate);
        Ok(Self::over(port, port_name, config))
    }
}

impl<T> AttSession<T> {
    /// Wrap an already-open transport
    pub fn over(transport: T, port: impl Into<String>, config: &SessionConfig) -> Self {
        Self {
            transport: Some(transport),
            port: port.into(),
            timeout: config.timeout,
            terminator: config.terminator.clone(),
        }
    }

    /// Port name this session is bound to
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Whether the channel is still open
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Release the channel
    ///
    /// Idempotent; a closed session rejects further commands.
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            debug!("Closed {}", self.port);
        }
    }
}

impl<T: Read + Write> AttSession<T> {
    /// Issue a command and read its single response line
    ///
    /// Writes the encoded command plus terminator, then reads until one full
    /// terminator sequence arrives or the deadline passes. The returned line
    /// has the terminator stripped.
    pub fn query(&mut self, command: &AttCommand) -> Result<String, SessionError> {
        let port = self.port.clone();
        let transport = self
            .transport
            .as_mut()
            .ok_or_else(|| SessionError::Closed { port: port.clone() })?;

        let mut frame = command.encode().into_bytes();
        frame.extend_from_slice(&self.terminator);

        trace!("{} <- {}", port, command);
        transport
            .write_all(&frame)
            .and_then(|()| transport.flush())
            .map_err(|source| SessionError::Io {
                port: port.clone(),
                source,
            })?;

        let deadline = Instant::now() + self.timeout;
        let mut line: Vec<u8> = Vec::with_capacity(32);
        let mut buf = [0u8; 64];

        loop {
            match transport.read(&mut buf) {
                Ok(0) => {
                    return Err(SessionError::Io {
                        port,
                        source: std::io::Error::new(
                            ErrorKind::UnexpectedEof,
                            "channel closed by peer",
                        ),
                    });
                }
                Ok(n) => {
                    line.extend_from_slice(&buf[..n]);
                    if let Some(end) = find_terminator(&line, &self.terminator) {
                        let text = String::from_utf8_lossy(&line[..end]).into_owned();
                        trace!("{} -> {:?}", port, text);
                        return Ok(text);
                    }
                    if line.len() > MAX_RESPONSE_LEN {
                        return Err(SessionError::Protocol(ProtocolError::OversizeResponse {
                            limit: MAX_RESPONSE_LEN,
                        }));
                    }
                }
                Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {}
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(source) => return Err(SessionError::Io { port, source }),
            }

            if Instant::now() >= deadline {
                return Err(SessionError::Timeout { port });
            }
        }
    }

    /// Issue a command and parse its response as an attenuation reading in dB
    pub fn query_reading(&mut self, command: &AttCommand) -> Result<f64, SessionError> {
        let line = self.query(command)?;
        Ok(parse_reading(&line)?)
    }
}

/// Find the end of the first complete line, returning the index where the
/// terminator starts
fn find_terminator(data: &[u8], terminator: &[u8]) -> Option<usize> {
    if terminator.is_empty() || data.len() < terminator.len() {
        return None;
    }
    data.windows(terminator.len())
        .position(|w| w == terminator)
}
