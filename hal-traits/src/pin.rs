//! Pin and driver contracts shared by every output driver.

use crate::capability::{Capability, Metadata};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A single addressable pin exposed by a driver.
#[async_trait]
pub trait Pin: Send + Sync {
    /// Pin name, unique within its driver.
    fn name(&self) -> &str;

    /// Zero-based index of the pin within its driver.
    fn number(&self) -> usize;

    /// Release any resource held by the pin.
    async fn close(&self) -> Result<()>;
}

/// Boolean output pin.
///
/// `write(true)` switches the underlying device on, `write(false)` switches it
/// off. `last_state` reports the last state accepted by the driver, which is
/// not necessarily the physical state of the device.
#[async_trait]
pub trait DigitalOutputPin: Pin {
    async fn write(&self, state: bool) -> Result<()>;

    fn last_state(&self) -> bool;
}

/// A hardware driver instance.
#[async_trait]
pub trait Driver: Send + Sync {
    fn metadata(&self) -> &Metadata;

    fn name(&self) -> &str {
        &self.metadata().name
    }

    /// Pins exposed for `capability`.
    ///
    /// # Errors
    ///
    /// Returns [`HalError::UnsupportedCapability`](crate::HalError::UnsupportedCapability)
    /// when the driver has no pins of that kind.
    fn pins(&self, capability: Capability) -> Result<Vec<Arc<dyn Pin>>>;

    /// Digital output view of this driver, if it has one.
    fn as_digital_output(&self) -> Option<&dyn DigitalOutputDriver> {
        None
    }

    async fn close(&self) -> Result<()>;
}

/// Driver exposing digital output pins.
pub trait DigitalOutputDriver: Driver {
    fn digital_output_pins(&self) -> Vec<Arc<dyn DigitalOutputPin>>;

    /// # Errors
    ///
    /// Returns [`HalError::InvalidPin`](crate::HalError::InvalidPin) for an
    /// index the driver does not expose.
    fn digital_output_pin(&self, index: usize) -> Result<Arc<dyn DigitalOutputPin>>;
}
