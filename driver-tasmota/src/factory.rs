//! # Smart-Plug Driver Factory

use crate::command::{CommandClient, Connector, TcpConnector, DEFAULT_TIMEOUT};
use crate::driver::{RelayPin, TasmotaDriver};
use core_runtime::events::EventBus;
use hal_traits::{
    parameter_value, to_error_string, Capability, ConfigParameter, Driver, DriverFactory,
    HalError, Metadata, ParameterType, Parameters, Result as HalResult,
};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Name the factory registers under.
pub const DRIVER_NAME: &str = "tasmota";

/// `host:port` of the plug.
pub const ADDRESS_PARAMETER: &str = "Address";

pub const DEFAULT_ADDRESS: &str = "192.168.1.11:9999";

const DRIVER_DESCRIPTION: &str = "Switches the relay of a TP-Link compatible smart plug";

/// Factory for smart-plug drivers.
pub struct TasmotaFactory {
    metadata: Metadata,
    parameters: Vec<ConfigParameter>,
    connector: Arc<dyn Connector>,
    timeout: Duration,
    events: Option<EventBus>,
}

impl TasmotaFactory {
    pub fn new() -> Self {
        Self::with_connector(Arc::new(TcpConnector))
    }

    pub fn with_connector(connector: Arc<dyn Connector>) -> Self {
        Self {
            metadata: Metadata::new(DRIVER_NAME, DRIVER_DESCRIPTION)
                .with_capability(Capability::DigitalOutput),
            parameters: vec![ConfigParameter::required(ADDRESS_PARAMETER, ParameterType::String, 0)
                .with_default(json!(DEFAULT_ADDRESS))],
            connector,
            timeout: DEFAULT_TIMEOUT,
            events: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Build the concrete driver type.
    pub fn build(&self, parameters: &Parameters) -> HalResult<TasmotaDriver> {
        let failures = self.validate_parameters(parameters);
        if !failures.is_empty() {
            return Err(HalError::InvalidParameters(to_error_string(&failures)));
        }

        let address = parameter_value(&self.parameters, parameters, ADDRESS_PARAMETER)
            .and_then(|value| value.as_str().map(str::to_string))
            .filter(|address| !address.is_empty())
            .ok_or_else(|| {
                HalError::InvalidParameters(format!("{} must not be empty", ADDRESS_PARAMETER))
            })?;

        let client = CommandClient::with_connector(address, Arc::clone(&self.connector))
            .with_timeout(self.timeout);
        let mut pin = RelayPin::new(self.metadata.name.clone(), client);
        if let Some(events) = &self.events {
            pin = pin.with_event_bus(events.clone());
        }

        Ok(TasmotaDriver::new(self.metadata.clone(), pin))
    }
}

impl Default for TasmotaFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverFactory for TasmotaFactory {
    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn parameters(&self) -> &[ConfigParameter] {
        &self.parameters
    }

    #[instrument(skip(self, parameters))]
    fn new_driver(&self, parameters: &Parameters) -> HalResult<Arc<dyn Driver>> {
        let driver = self.build(parameters)?;
        debug!(address = %driver.pin().client().address(), "Smart-plug driver created");
        Ok(Arc::new(driver))
    }
}

impl fmt::Debug for TasmotaFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TasmotaFactory")
            .field("metadata", &self.metadata)
            .field("timeout", &self.timeout)
            .finish()
    }
}
