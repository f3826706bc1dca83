//! # Audio Driver Factory
//!
//! Builds [`AudioPinDriver`]s from `File`/`Loop` parameters. Registered under
//! the name `mp3`, although any format the decoder understands plays.

use crate::config::AudioPinConfig;
use crate::controller::PlaybackController;
use crate::driver::AudioPinDriver;
use crate::output::AudioOutput;
use crate::traits::AudioSource;
use core_runtime::events::EventBus;
use hal_traits::{
    to_error_string, Capability, ConfigParameter, Driver, DriverFactory, HalError, Metadata,
    Parameters, Result as HalResult,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Name the factory registers under.
pub const DRIVER_NAME: &str = "mp3";

const DRIVER_DESCRIPTION: &str = "Plays an audio file while the pin is on";

/// Factory for audio pin drivers.
pub struct AudioDriverFactory {
    metadata: Metadata,
    parameters: Vec<ConfigParameter>,
    source: Arc<dyn AudioSource>,
    output: Arc<AudioOutput>,
    events: Option<EventBus>,
    stop_timeout: Option<Duration>,
}

impl AudioDriverFactory {
    /// Factory decoding through symphonia and playing through the global output.
    #[cfg(feature = "decoder")]
    pub fn new() -> Self {
        Self::with_source(Arc::new(crate::decoder::SymphoniaSource::new()))
    }

    /// Factory decoding through `source` and playing through the global output.
    pub fn with_source(source: Arc<dyn AudioSource>) -> Self {
        Self {
            metadata: Metadata::new(DRIVER_NAME, DRIVER_DESCRIPTION)
                .with_capability(Capability::DigitalOutput),
            parameters: AudioPinConfig::schema(),
            source,
            output: AudioOutput::global(),
            events: None,
            stop_timeout: None,
        }
    }

    pub fn with_output(mut self, output: Arc<AudioOutput>) -> Self {
        self.output = output;
        self
    }

    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = Some(timeout);
        self
    }

    /// Build the concrete driver type.
    pub fn build(&self, parameters: &Parameters) -> HalResult<AudioPinDriver> {
        let failures = self.validate_parameters(parameters);
        if !failures.is_empty() {
            return Err(HalError::InvalidParameters(to_error_string(&failures)));
        }

        let config = AudioPinConfig::from_parameters(&self.parameters, parameters)?;

        let mut controller = PlaybackController::new(
            self.metadata.name.clone(),
            config,
            Arc::clone(&self.source),
            Arc::clone(&self.output),
        );
        if let Some(events) = &self.events {
            controller = controller.with_event_bus(events.clone());
        }
        if let Some(timeout) = self.stop_timeout {
            controller = controller.with_stop_timeout(timeout);
        }

        Ok(AudioPinDriver::new(self.metadata.clone(), controller))
    }
}

#[cfg(feature = "decoder")]
impl Default for AudioDriverFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverFactory for AudioDriverFactory {
    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn parameters(&self) -> &[ConfigParameter] {
        &self.parameters
    }

    #[instrument(skip(self, parameters))]
    fn new_driver(&self, parameters: &Parameters) -> HalResult<Arc<dyn Driver>> {
        let driver = self.build(parameters)?;
        debug!(config = ?driver.controller().config(), "Audio driver created");
        Ok(Arc::new(driver))
    }
}

impl fmt::Debug for AudioDriverFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioDriverFactory")
            .field("metadata", &self.metadata)
            .field("output", &self.output)
            .finish()
    }
}
