//! # Audio Pin Driver
//!
//! Exposes a [`PlaybackController`] as a HAL driver with a single digital
//! output pin. Writing `true` starts playback, writing `false` stops it.

use crate::controller::PlaybackController;
use async_trait::async_trait;
use hal_traits::{
    Capability, DigitalOutputDriver, DigitalOutputPin, Driver, HalError, Metadata, Pin,
    Result as HalResult,
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// The single output pin of an audio driver.
#[derive(Debug)]
pub struct AudioPin {
    name: String,
    controller: Arc<PlaybackController>,
}

impl AudioPin {
    pub fn new(name: impl Into<String>, controller: Arc<PlaybackController>) -> Self {
        Self {
            name: name.into(),
            controller,
        }
    }

    pub fn controller(&self) -> &Arc<PlaybackController> {
        &self.controller
    }
}

#[async_trait]
impl Pin for AudioPin {
    fn name(&self) -> &str {
        &self.name
    }

    fn number(&self) -> usize {
        0
    }

    async fn close(&self) -> HalResult<()> {
        self.controller.stop().await.map_err(HalError::from)
    }
}

#[async_trait]
impl DigitalOutputPin for AudioPin {
    #[instrument(skip(self), fields(pin = %self.name))]
    async fn write(&self, state: bool) -> HalResult<()> {
        if state {
            self.controller.start()?;
        } else {
            self.controller.stop().await?;
        }
        Ok(())
    }

    fn last_state(&self) -> bool {
        self.controller.is_active()
    }
}

/// Driver exposing one [`AudioPin`].
#[derive(Debug)]
pub struct AudioPinDriver {
    metadata: Metadata,
    pin: Arc<AudioPin>,
}

impl AudioPinDriver {
    /// Wraps `controller`. The pin takes the driver's name.
    pub fn new(metadata: Metadata, controller: PlaybackController) -> Self {
        let pin = Arc::new(AudioPin::new(metadata.name.clone(), Arc::new(controller)));
        Self { metadata, pin }
    }

    pub fn pin(&self) -> &Arc<AudioPin> {
        &self.pin
    }

    pub fn controller(&self) -> &Arc<PlaybackController> {
        self.pin.controller()
    }
}

#[async_trait]
impl Driver for AudioPinDriver {
    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn pins(&self, capability: Capability) -> HalResult<Vec<Arc<dyn Pin>>> {
        match capability {
            Capability::DigitalOutput => Ok(vec![self.pin.clone() as Arc<dyn Pin>]),
            other => Err(HalError::UnsupportedCapability(other)),
        }
    }

    fn as_digital_output(&self) -> Option<&dyn DigitalOutputDriver> {
        Some(self)
    }

    async fn close(&self) -> HalResult<()> {
        debug!(driver = %self.metadata.name, "Closing audio driver");
        self.pin.close().await
    }
}

impl DigitalOutputDriver for AudioPinDriver {
    fn digital_output_pins(&self) -> Vec<Arc<dyn DigitalOutputPin>> {
        vec![self.pin.clone() as Arc<dyn DigitalOutputPin>]
    }

    fn digital_output_pin(&self, index: usize) -> HalResult<Arc<dyn DigitalOutputPin>> {
        if index != 0 {
            return Err(HalError::InvalidPin(index));
        }
        Ok(self.pin.clone() as Arc<dyn DigitalOutputPin>)
    }
}
