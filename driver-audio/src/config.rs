//! # Audio Pin Configuration
//!
//! The configuration surface of an audio pin is a file path and a loop flag.
//! It is fixed when the driver is created.

use crate::error::{PlaybackError, Result};
use hal_traits::{parameter_value, ConfigParameter, ParameterType, Parameters};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};

/// Parameter holding the audio file path.
pub const FILE_PARAMETER: &str = "File";

/// Parameter selecting looping playback.
pub const LOOP_PARAMETER: &str = "Loop";

/// Audio pin configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioPinConfig {
    /// File played while the pin is on.
    pub file_path: PathBuf,

    /// Restart from the beginning on end-of-stream instead of switching off.
    #[serde(default)]
    pub looping: bool,
}

impl AudioPinConfig {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            looping: false,
        }
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Validate the configuration.
    ///
    /// Whether the file exists is not checked here. A missing file surfaces
    /// when a session tries to open it.
    pub fn validate(&self) -> Result<()> {
        if self.file_path.as_os_str().is_empty() {
            return Err(PlaybackError::InvalidConfig(format!(
                "{} cannot be empty",
                FILE_PARAMETER
            )));
        }
        Ok(())
    }

    /// Parameter schema for factories building audio pins.
    pub fn schema() -> Vec<ConfigParameter> {
        vec![
            ConfigParameter::required(FILE_PARAMETER, ParameterType::String, 0),
            ConfigParameter::optional(LOOP_PARAMETER, ParameterType::Boolean, 1, json!(false)),
        ]
    }

    /// Build a configuration from parameters already checked against
    /// [`schema`](Self::schema).
    pub fn from_parameters(schema: &[ConfigParameter], parameters: &Parameters) -> Result<Self> {
        let file = parameter_value(schema, parameters, FILE_PARAMETER)
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                PlaybackError::InvalidConfig(format!(
                    "{} is a required parameter, but was not received.",
                    FILE_PARAMETER
                ))
            })?;

        let looping = parameter_value(schema, parameters, LOOP_PARAMETER)
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let config = Self::new(file).with_looping(looping);
        config.validate()?;
        Ok(config)
    }
}
