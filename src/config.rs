//! Configuration surface for the two links.
//!
//! Both configs deserialize from JSON with defaulted fields, so an embedding
//! application can pass `{}`-style minimal documents:
//!
//! ```
//! use xgb_sim::config::FastEnetConfig;
//!
//! let config = FastEnetConfig::from_json(r#"{ "port": 2004 }"#).unwrap();
//! assert_eq!(config.port, 2004);
//! assert_eq!(config.bind_addr, "0.0.0.0");
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, XgbError};

/// FastEnet TCP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FastEnetConfig {
    /// Bind address.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl FastEnetConfig {
    /// Parse from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| XgbError::ConfigParse(e.to_string()))
    }
}

impl Default for FastEnetConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    2004
}

/// Cnet serial link configuration. Defaults follow the unit's factory
/// settings: 9600 baud, 8 data bits, no parity, 1 stop bit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CnetConfig {
    /// Serial device path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub path: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_data_bits")]
    pub data_bits: u8,
    /// `"none"`, `"even"` or `"odd"`.
    #[serde(default = "default_parity")]
    pub parity: String,
    #[serde(default = "default_stop_bits")]
    pub stop_bits: u8,
    /// Station id answered on the link.
    #[serde(default = "default_station")]
    pub station: u8,
}

impl CnetConfig {
    /// Configuration for a port path with all defaults.
    pub fn for_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: default_baud_rate(),
            data_bits: default_data_bits(),
            parity: default_parity(),
            stop_bits: default_stop_bits(),
            station: default_station(),
        }
    }

    /// Parse from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| XgbError::ConfigParse(e.to_string()))
    }
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_data_bits() -> u8 {
    8
}

fn default_parity() -> String {
    "none".to_string()
}

fn default_stop_bits() -> u8 {
    1
}

fn default_station() -> u8 {
    1
}
