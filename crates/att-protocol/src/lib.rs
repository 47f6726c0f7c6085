//! Attenuator Protocol Library
//!
//! This crate provides encoding and parsing for the ASCII command protocol
//! spoken by mechanical RF attenuator units over their USB-ACM serial
//! interface.
//!
//! # Format
//! - Commands: `ATT:<operation>?` with an optional float argument
//! - Responses: exactly one text line per command
//! - Numeric responses carry the attenuation setting in dB
//! - The allowed-value table is returned as comma-separated tokens
//!
//! # Example
//!
//! ```rust
//! use att_protocol::{parse_reading, AttCommand};
//!
//! let cmd = AttCommand::Set(5.0);
//! assert_eq!(cmd.encode(), "ATT:ATTSet? 5.000000");
//!
//! let db = parse_reading("5.00").unwrap();
//! assert_eq!(db, 5.0);
//! ```

pub mod command;
pub mod error;
pub mod response;

pub use command::AttCommand;
pub use error::ProtocolError;
pub use response::{parse_reading, parse_value_table};
