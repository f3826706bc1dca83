//! Workspace facade crate.
//!
//! Re-exports the pin drivers behind feature flags and wires their factories
//! into a [`DriverRegistry`], so a host application can go from a workspace
//! configuration file to running drivers without naming each crate.
//!
//! ```ignore
//! let config = WorkspaceConfig::from_file("drivers.json")?;
//! let drivers = default_registry(Some(EventBus::default()))?.build_all(&config.drivers)?;
//! ```

pub use core_runtime::{events::EventBus, DriverRegistry, WorkspaceConfig};

#[cfg(feature = "audio")]
pub use driver_audio;

#[cfg(feature = "tasmota")]
pub use driver_tasmota;

/// Registry holding a factory for every enabled driver type.
///
/// Drivers built from it publish to `events` when one is given.
#[cfg_attr(
    not(any(feature = "audio", feature = "tasmota")),
    allow(unused_mut, unused_variables)
)]
pub fn default_registry(events: Option<EventBus>) -> core_runtime::Result<DriverRegistry> {
    let mut registry = DriverRegistry::new();

    #[cfg(feature = "audio")]
    {
        let mut factory = driver_audio::AudioDriverFactory::new();
        if let Some(events) = &events {
            factory = factory.with_event_bus(events.clone());
        }
        registry.register(driver_audio::DRIVER_NAME, std::sync::Arc::new(factory))?;
    }

    #[cfg(feature = "tasmota")]
    {
        let mut factory = driver_tasmota::TasmotaFactory::new();
        if let Some(events) = &events {
            factory = factory.with_event_bus(events.clone());
        }
        registry.register(driver_tasmota::DRIVER_NAME, std::sync::Arc::new(factory))?;
    }

    Ok(registry)
}
