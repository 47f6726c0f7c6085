//! Attenuator registry
//!
//! Maps stable logical names to instrument sessions. Names are assigned in
//! discovery order (`att0`, `att1`, ...) when the registry is built and are
//! never re-derived afterwards. Each unit's allowed-value table is fetched
//! once, right after its session opens, and cached for the registry's
//! lifetime.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use serialport::SerialPort;
use tracing::{info, warn};

use att_protocol::{parse_value_table, AttCommand};

use crate::error::{DiscoveryError, RegistryError, SessionError};
use crate::session::{AttSession, SessionConfig};

/// One registered unit: logical name, open session, cached value table
struct AttEntry<T> {
    name: String,
    session: AttSession<T>,
    allowed: Vec<String>,
}

/// Ordered mapping of logical names to attenuator sessions
pub struct AttRegistry<T> {
    entries: Vec<AttEntry<T>>,
}

impl AttRegistry<Box<dyn SerialPort>> {
    /// Open one session per address, in enumeration order
    ///
    /// Fails with [`DiscoveryError::NoDevices`] if `addresses` is empty.
    /// Construction is all-or-nothing: if any unit fails to open or to
    /// answer its table query, every session opened so far is closed and
    /// the error propagates.
    pub fn open(addresses: &[String], config: &SessionConfig) -> Result<Self, DiscoveryError> {
        Self::open_with(addresses, |addr| AttSession::open(addr, config))
    }
}

impl<T: Read + Write> AttRegistry<T> {
    /// Registry construction over an arbitrary session opener
    ///
    /// The opener is called once per address, in order. Used directly by
    /// tests to build registries over simulated units.
    pub fn open_with<A, F>(addresses: &[A], mut open: F) -> Result<Self, DiscoveryError>
    where
        A: AsRef<str>,
        F: FnMut(&str) -> Result<AttSession<T>, SessionError>,
    {
        if addresses.is_empty() {
            return Err(DiscoveryError::NoDevices);
        }

        let mut entries: Vec<AttEntry<T>> = Vec::with_capacity(addresses.len());
        for (index, addr) in addresses.iter().enumerate() {
            let addr = addr.as_ref();
            let name = format!("att{index}");

            let brought_up = open(addr).and_then(|mut session| {
                let table = session.query(&AttCommand::TableGet)?;
                Ok((session, parse_value_table(&table)))
            });

            match brought_up {
                Ok((session, allowed)) => {
                    info!("{} on {} allows {:?}", name, addr, allowed);
                    entries.push(AttEntry {
                        name,
                        session,
                        allowed,
                    });
                }
                Err(source) => {
                    warn!("Bring-up of {} on {} failed: {}", name, addr, source);
                    for entry in &mut entries {
                        entry.session.close();
                    }
                    return Err(DiscoveryError::Instrument {
                        name,
                        port: addr.to_string(),
                        source,
                    });
                }
            }
        }

        info!("Registry up with {} instrument(s)", entries.len());
        Ok(Self { entries })
    }
}

impl<T> AttRegistry<T> {
    /// Logical names in discovery order
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    /// Number of registered units
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty (only after `shutdown`)
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a logical name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Allowed-value tables for every unit, keyed by logical name
    pub fn allowed_values(&self) -> BTreeMap<String, Vec<String>> {
        self.entries
            .iter()
            .map(|e| (e.name.clone(), e.allowed.clone()))
            .collect()
    }

    /// Allowed-value table for one unit
    pub fn allowed_values_for(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.allowed.as_slice())
    }

    /// Session for a logical name
    pub fn session_mut(&mut self, name: &str) -> Result<&mut AttSession<T>, RegistryError> {
        self.entries
            .iter_mut()
            .find(|e| e.name == name)
            .map(|e| &mut e.session)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Close every session
    ///
    /// Idempotent; also runs on drop, so teardown happens on every exit
    /// path.
    pub fn shutdown(&mut self) {
        for entry in &mut self.entries {
            entry.session.close();
        }
        self.entries.clear();
    }
}

impl<T> Drop for AttRegistry<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
