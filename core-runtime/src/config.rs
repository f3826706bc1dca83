//! # Workspace Configuration
//!
//! Describes which driver instances a process should create and how it
//! should log. The document is JSON:
//!
//! ```json
//! {
//!   "logging": { "format": "compact", "level": "debug" },
//!   "drivers": [
//!     { "name": "alarm", "driver": "mp3",
//!       "parameters": { "File": "/srv/sounds/alarm.mp3", "Loop": true } },
//!     { "name": "heater", "driver": "tasmota",
//!       "parameters": { "Address": "192.168.1.11:9999" } }
//!   ]
//! }
//! ```
//!
//! Validation here is structural only (names present and unique). Parameter
//! validation belongs to each driver's factory and happens when the
//! [`DriverRegistry`](crate::registry::DriverRegistry) builds the driver.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{DriverConfig, WorkspaceConfig};
//! use serde_json::json;
//!
//! let config = WorkspaceConfig::builder()
//!     .driver(DriverConfig::new("alarm", "mp3").with_parameter("File", json!("alarm.mp3")))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::logging::LoggingConfig;
use hal_traits::Parameters;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Logging setup
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Driver instances to create, in order
    #[serde(default)]
    pub drivers: Vec<DriverConfig>,
}

/// One driver instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Instance name, unique within the document
    pub name: String,

    /// Factory name the instance is built with (e.g. `mp3`, `tasmota`)
    pub driver: String,

    /// Raw parameters handed to the factory
    #[serde(default)]
    pub parameters: Parameters,
}

impl DriverConfig {
    pub fn new(name: impl Into<String>, driver: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: driver.into(),
            parameters: Parameters::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }
}

impl WorkspaceConfig {
    /// Creates a new builder for constructing a `WorkspaceConfig`.
    pub fn builder() -> WorkspaceConfigBuilder {
        WorkspaceConfigBuilder::default()
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(document: &str) -> Result<Self> {
        let config: WorkspaceConfig = serde_json::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read configuration file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&document)
    }

    /// Validates driver entries.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a driver has an empty name or type, or if
    /// two drivers share a name.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for (index, driver) in self.drivers.iter().enumerate() {
            if driver.name.trim().is_empty() {
                return Err(Error::Config(format!(
                    "Driver #{} has an empty name. Give every driver a unique name.",
                    index
                )));
            }

            if driver.driver.trim().is_empty() {
                return Err(Error::Config(format!(
                    "Driver '{}' does not say which driver type to use. \
                     Set \"driver\" to a registered factory name such as \"mp3\".",
                    driver.name
                )));
            }

            if !seen.insert(driver.name.as_str()) {
                return Err(Error::Config(format!(
                    "Driver name '{}' is used more than once",
                    driver.name
                )));
            }
        }

        Ok(())
    }

    /// Looks up a driver entry by instance name.
    pub fn driver(&self, name: &str) -> Option<&DriverConfig> {
        self.drivers.iter().find(|d| d.name == name)
    }
}

/// Builder for constructing [`WorkspaceConfig`] instances.
#[derive(Debug, Default)]
pub struct WorkspaceConfigBuilder {
    logging: Option<LoggingConfig>,
    drivers: Vec<DriverConfig>,
}

impl WorkspaceConfigBuilder {
    /// Sets the logging configuration.
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Appends a driver instance.
    pub fn driver(mut self, driver: DriverConfig) -> Self {
        self.drivers.push(driver);
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<WorkspaceConfig> {
        let config = WorkspaceConfig {
            logging: self.logging.unwrap_or_default(),
            drivers: self.drivers,
        };
        config.validate()?;
        Ok(config)
    }
}
