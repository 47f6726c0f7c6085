//! Attenuator Simulation Library
//!
//! This crate provides a simulated attenuator unit for testing the control
//! stack without physical hardware. The simulator speaks the same
//! line-terminated ASCII protocol as a real unit and is driven through the
//! blocking `Read`/`Write` traits, so a session uses it unmodified in place
//! of a serial port.
//!
//! # Example
//!
//! ```rust
//! use std::io::{Read, Write};
//! use att_sim::SimAttenuator;
//!
//! let mut unit = SimAttenuator::with_table("bench", &["0", "5", "10"]);
//! unit.write_all(b"ATT:ATTGetCurVal?\r\n").unwrap();
//!
//! let mut buf = [0u8; 32];
//! let n = unit.read(&mut buf).unwrap();
//! assert_eq!(&buf[..n], b"0\r\n");
//! ```

pub mod attenuator;

pub use attenuator::{SharedSim, SimAttenuator, SimAttenuatorConfig};
