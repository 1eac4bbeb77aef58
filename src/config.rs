//! Kiosk configuration
//!
//! Presentation settings for a kiosk, read from YAML. Every field has a
//! default, so an empty file is a valid configuration.

use std::{fs, path::Path};

use jiff::tz::TimeZone;
use serde::Deserialize;
use thiserror::Error;

use crate::receipt::StoreDetails;

/// Default number of random draws for a sample receipt.
pub const DEFAULT_SAMPLE_SIZE: usize = 8;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading the configuration file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Unknown time zone name
    #[error("Unknown time zone {0}: {1}")]
    TimeZone(String, #[source] jiff::Error),
}

/// Store header and footer settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store name
    pub name: String,

    /// Address line
    pub address: String,

    /// Footer lines
    pub footer: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let store = StoreDetails::default();

        Self {
            name: store.name,
            address: store.address,
            footer: store.footer,
        }
    }
}

/// Kiosk configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KioskConfig {
    /// Receipt header/footer
    pub store: StoreConfig,

    /// IANA time zone used for receipt timestamps
    pub time_zone: String,

    /// Number of random draws in a sample receipt
    pub sample_size: usize,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            time_zone: "UTC".to_string(),
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

impl KioskConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text. Blank text yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be parsed.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        Ok(serde_norway::from_str(yaml)?)
    }

    /// Resolve the store details printed on receipts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TimeZone`] if the time zone is unknown.
    pub fn store_details(&self) -> Result<StoreDetails, ConfigError> {
        let time_zone = if self.time_zone.eq_ignore_ascii_case("UTC") {
            TimeZone::UTC
        } else {
            TimeZone::get(&self.time_zone)
                .map_err(|err| ConfigError::TimeZone(self.time_zone.clone(), err))?
        };

        Ok(StoreDetails {
            name: self.store.name.clone(),
            address: self.store.address.clone(),
            footer: self.store.footer.clone(),
            time_zone,
        })
    }
}
