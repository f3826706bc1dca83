//! # Smart-Plug Driver
//!
//! One digital output pin switching the relay of a TP-Link compatible plug.

use crate::command::{CommandClient, Sysinfo};
use crate::error::Result;
use async_trait::async_trait;
use core_runtime::events::{CoreEvent, EventBus, RelayEvent};
use hal_traits::{
    Capability, DigitalOutputDriver, DigitalOutputPin, Driver, HalError, Metadata, Pin,
    Result as HalResult,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// The relay pin. Its state reflects the last command the plug accepted.
#[derive(Debug)]
pub struct RelayPin {
    name: String,
    client: CommandClient,
    state: AtomicBool,
    events: Option<EventBus>,
}

impl RelayPin {
    pub fn new(name: impl Into<String>, client: CommandClient) -> Self {
        Self {
            name: name.into(),
            client,
            state: AtomicBool::new(false),
            events: None,
        }
    }

    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn client(&self) -> &CommandClient {
        &self.client
    }

    #[instrument(skip(self), fields(pin = %self.name, address = %self.client.address()))]
    async fn switch(&self, on: bool) -> Result<()> {
        match self.client.set_relay(on).await {
            Ok(()) => {
                self.state.store(on, Ordering::SeqCst);
                info!(on, "Relay switched");
                self.emit(RelayEvent::Switched {
                    driver: self.name.clone(),
                    on,
                });
                Ok(())
            }
            Err(e) => {
                warn!(on, error = %e, "Relay command failed");
                self.emit(RelayEvent::CommandFailed {
                    driver: self.name.clone(),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn emit(&self, event: RelayEvent) {
        if let Some(events) = &self.events {
            events.emit(CoreEvent::Relay(event)).ok();
        }
    }
}

#[async_trait]
impl Pin for RelayPin {
    fn name(&self) -> &str {
        &self.name
    }

    fn number(&self) -> usize {
        0
    }

    async fn close(&self) -> HalResult<()> {
        Ok(())
    }
}

#[async_trait]
impl DigitalOutputPin for RelayPin {
    async fn write(&self, state: bool) -> HalResult<()> {
        self.switch(state).await.map_err(HalError::from)
    }

    fn last_state(&self) -> bool {
        self.state.load(Ordering::SeqCst)
    }
}

/// Driver for a single smart plug.
#[derive(Debug)]
pub struct TasmotaDriver {
    metadata: Metadata,
    pin: Arc<RelayPin>,
}

impl TasmotaDriver {
    pub fn new(metadata: Metadata, pin: RelayPin) -> Self {
        Self {
            metadata,
            pin: Arc::new(pin),
        }
    }

    pub fn pin(&self) -> &Arc<RelayPin> {
        &self.pin
    }

    /// Switch the relay on.
    pub async fn on(&self) -> Result<()> {
        self.pin.switch(true).await
    }

    /// Switch the relay off.
    pub async fn off(&self) -> Result<()> {
        self.pin.switch(false).await
    }

    /// Ask the plug for its device information.
    pub async fn info(&self) -> Result<Sysinfo> {
        self.pin.client().sysinfo().await
    }
}

#[async_trait]
impl Driver for TasmotaDriver {
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
        debug!(driver = %self.metadata.name, "Closing smart-plug driver");
        self.pin.close().await
    }
}

impl DigitalOutputDriver for TasmotaDriver {
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
