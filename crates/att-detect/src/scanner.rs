//! Serial port scanner
//!
//! This module provides serial port enumeration and the substring filter
//! that selects ACM-class ports hosting attenuator control units.

use serialport::{available_ports, SerialPortType};
use tracing::info;

use crate::error::DetectError;

/// Substring marking CDC-ACM serial devices in enumerated port names
pub const ACM_PATTERN: &str = "ACM";

/// Information about a serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name (e.g., /dev/ttyACM0, COM3)
    pub port: String,
    /// USB Vendor ID (if USB)
    pub vid: Option<u16>,
    /// USB Product ID (if USB)
    pub pid: Option<u16>,
    /// USB serial number (if available)
    pub serial_number: Option<String>,
    /// USB manufacturer string
    pub manufacturer: Option<String>,
    /// USB product string
    pub product: Option<String>,
}

impl PortInfo {
    /// Create from serialport crate's port info
    fn from_serialport(name: String, port_type: &SerialPortType) -> Self {
        match port_type {
            SerialPortType::UsbPort(usb) => Self {
                port: name,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                serial_number: usb.serial_number.clone(),
                manufacturer: usb.manufacturer.clone(),
                product: usb.product.clone(),
            },
            _ => Self {
                port: name,
                vid: None,
                pid: None,
                serial_number: None,
                manufacturer: None,
                product: None,
            },
        }
    }
}

/// Serial port scanner configuration
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Keep only ports whose name contains this substring
    pub match_pattern: String,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            match_pattern: ACM_PATTERN.to_string(),
        }
    }
}

/// Serial port scanner
pub struct PortScanner {
    config: ScannerConfig,
}

impl PortScanner {
    /// Create a new scanner filtering for ACM-class ports
    pub fn new() -> Self {
        Self {
            config: ScannerConfig::default(),
        }
    }

    /// Create a scanner with custom configuration
    pub fn with_config(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// Enumerate all available serial ports
    pub fn enumerate_ports(&self) -> Result<Vec<PortInfo>, DetectError> {
        info!("Enumerating serial ports...");
        let ports = available_ports().map_err(|e| DetectError::EnumerationFailed(e.to_string()))?;

        let result: Vec<_> = ports
            .into_iter()
            .map(|p| PortInfo::from_serialport(p.port_name, &p.port_type))
            .collect();

        if result.is_empty() {
            info!("No serial ports found");
        } else {
            info!("Found {} serial port(s)", result.len());
            for port in &result {
                let desc = port.product.as_deref().unwrap_or("Unknown");
                info!("  {} - {}", port.port, desc);
            }
        }

        Ok(result)
    }

    /// Enumerate ports and keep only those matching the configured pattern
    ///
    /// Enumeration order is preserved; the registry derives logical names
    /// from the position of each port in this list.
    pub fn matching_ports(&self) -> Result<Vec<PortInfo>, DetectError> {
        let matched: Vec<_> = self
            .enumerate_ports()?
            .into_iter()
            .filter(|p| self.matches(p))
            .collect();

        info!(
            "{} port(s) match pattern {:?}",
            matched.len(),
            self.config.match_pattern
        );
        Ok(matched)
    }

    /// Check if a port name matches the configured pattern
    fn matches(&self, port: &PortInfo) -> bool {
        port.port.contains(&self.config.match_pattern)
    }
}

impl Default for PortScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::UsbPortInfo;

    fn usb_port(name: &str) -> PortInfo {
        let usb_info = SerialPortType::UsbPort(UsbPortInfo {
            vid: 0x2341,
            pid: 0x0043,
            serial_number: Some("A7031".to_string()),
            manufacturer: Some("Generic".to_string()),
            product: Some("USB ACM control".to_string()),
        });
        PortInfo::from_serialport(name.to_string(), &usb_info)
    }

    #[test]
    fn test_port_info_from_usb() {
        let info = usb_port("/dev/ttyACM0");

        assert_eq!(info.port, "/dev/ttyACM0");
        assert_eq!(info.vid, Some(0x2341));
        assert_eq!(info.pid, Some(0x0043));
        assert_eq!(info.product.as_deref(), Some("USB ACM control"));
    }

    #[test]
    fn test_default_pattern_selects_acm_ports() {
        let scanner = PortScanner::new();

        assert!(scanner.matches(&usb_port("/dev/ttyACM0")));
        assert!(scanner.matches(&usb_port("/dev/ttyACM12")));
        assert!(!scanner.matches(&usb_port("/dev/ttyUSB0")));
        assert!(!scanner.matches(&usb_port("COM3")));
    }

    #[test]
    fn test_custom_pattern() {
        let scanner = PortScanner::with_config(ScannerConfig {
            match_pattern: "USB".to_string(),
        });

        assert!(scanner.matches(&usb_port("/dev/ttyUSB0")));
        assert!(!scanner.matches(&usb_port("/dev/ttyACM0")));
    }
}
