//! Attenuator Control Library
//!
//! This crate provides the control stack for mechanical RF attenuator units:
//!
//! - **AttSession**: one exclusive, blocking serial channel to one unit,
//!   issuing line-terminated commands and reading single-line responses
//! - **AttRegistry**: maps stable logical names (`att0`, `att1`, ...) to
//!   sessions in discovery order and caches each unit's allowed-value table
//! - **AttControl**: the public get/set/step operations, which validate
//!   inputs against the registry and never propagate errors to the caller
//!
//! # Example
//!
//! ```rust,no_run
//! use att_ctl::{AttControl, AttRegistry, SessionConfig};
//!
//! let config = SessionConfig::default();
//! let registry = AttRegistry::open(&["/dev/ttyACM0".to_string()], &config).unwrap();
//! let mut ctl = AttControl::new(registry);
//!
//! println!("{}", ctl.set_value("att0", "5"));
//! ```

pub mod control;
pub mod error;
pub mod registry;
pub mod session;

pub use control::{AttControl, OpOutcome};
pub use error::{DiscoveryError, RegistryError, SessionError};
pub use registry::AttRegistry;
pub use session::{AttSession, SessionConfig};
