//! # Driver Registry
//!
//! Maps factory names (`mp3`, `tasmota`, ...) to [`DriverFactory`]
//! implementations and turns [`DriverConfig`] entries into live drivers.
//!
//! ```ignore
//! let mut registry = DriverRegistry::new();
//! registry.register("mp3", Arc::new(AudioDriverFactory::new().with_event_bus(event_bus.clone())))?;
//! registry.register("tasmota", Arc::new(TasmotaFactory::new().with_event_bus(event_bus)))?;
//!
//! let drivers = registry.build_all(&config.drivers)?;
//! ```

use crate::config::DriverConfig;
use crate::error::{Error, Result};
use hal_traits::{Driver, DriverFactory};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Registered driver factories.
#[derive(Default, Clone)]
pub struct DriverRegistry {
    factories: HashMap<String, Arc<dyn DriverFactory>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `name`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the name is empty or already taken.
    pub fn register(&mut self, name: impl Into<String>, factory: Arc<dyn DriverFactory>) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::Config("Driver factory name cannot be empty".to_string()));
        }
        if self.factories.contains_key(&name) {
            return Err(Error::Config(format!(
                "Driver factory '{}' is already registered",
                name
            )));
        }

        debug!(factory = %name, "Registered driver factory");
        self.factories.insert(name, factory);
        Ok(())
    }

    pub fn factory(&self, name: &str) -> Option<Arc<dyn DriverFactory>> {
        self.factories.get(name).cloned()
    }

    /// Registered factory names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Builds one driver from its configuration entry.
    ///
    /// # Errors
    ///
    /// - `Error::UnknownDriver` when no factory is registered for `config.driver`
    /// - `Error::Driver` when the factory rejects the parameters or fails
    #[instrument(skip(self, config), fields(name = %config.name, driver = %config.driver))]
    pub fn build(&self, config: &DriverConfig) -> Result<Arc<dyn Driver>> {
        let factory = self
            .factory(&config.driver)
            .ok_or_else(|| Error::UnknownDriver(config.driver.clone()))?;

        match factory.new_driver(&config.parameters) {
            Ok(driver) => {
                info!("Driver created");
                Ok(driver)
            }
            Err(source) => {
                warn!(error = %source, "Driver creation failed");
                Err(Error::Driver {
                    name: config.name.clone(),
                    source,
                })
            }
        }
    }

    /// Builds every configured driver, keyed by instance name.
    ///
    /// Stops at the first failure. Drivers created before the failure are
    /// dropped, which stops any playback they started.
    pub fn build_all(&self, configs: &[DriverConfig]) -> Result<BTreeMap<String, Arc<dyn Driver>>> {
        let mut drivers = BTreeMap::new();
        for config in configs {
            let driver = self.build(config)?;
            drivers.insert(config.name.clone(), driver);
        }
        Ok(drivers)
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("factories", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hal_traits::{
        to_error_string, Capability, ConfigParameter, HalError, Metadata, ParameterType, Parameters,
        Pin,
    };
    use serde_json::json;

    struct FakeDriver {
        metadata: Metadata,
    }

    #[async_trait]
    impl Driver for FakeDriver {
        fn metadata(&self) -> &Metadata {
            &self.metadata
        }

        fn pins(&self, capability: Capability) -> hal_traits::Result<Vec<Arc<dyn Pin>>> {
            Err(HalError::UnsupportedCapability(capability))
        }

        async fn close(&self) -> hal_traits::Result<()> {
            Ok(())
        }
    }

    struct FakeFactory {
        metadata: Metadata,
        parameters: Vec<ConfigParameter>,
    }

    impl FakeFactory {
        fn new() -> Self {
            Self {
                metadata: Metadata::new("fake", "Test driver"),
                parameters: vec![ConfigParameter::required("Path", ParameterType::String, 0)],
            }
        }
    }

    impl DriverFactory for FakeFactory {
        fn metadata(&self) -> &Metadata {
            &self.metadata
        }

        fn parameters(&self) -> &[ConfigParameter] {
            &self.parameters
        }

        fn new_driver(&self, parameters: &Parameters) -> hal_traits::Result<Arc<dyn Driver>> {
            let failures = self.validate_parameters(parameters);
            if !failures.is_empty() {
                return Err(HalError::InvalidParameters(to_error_string(&failures)));
            }
            Ok(Arc::new(FakeDriver {
                metadata: self.metadata.clone(),
            }))
        }
    }

    fn registry() -> DriverRegistry {
        let mut registry = DriverRegistry::new();
        registry.register("fake", Arc::new(FakeFactory::new())).unwrap();
        registry
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = registry();
        let result = registry.register("fake", Arc::new(FakeFactory::new()));
        assert!(matches!(result, Err(Error::Config(_))));
        assert_eq!(registry.names(), vec!["fake".to_string()]);
    }

    #[test]
    fn test_register_rejects_empty_name() {
        let mut registry = DriverRegistry::new();
        assert!(registry.register("", Arc::new(FakeFactory::new())).is_err());
    }

    #[test]
    fn test_build_unknown_driver() {
        let config = DriverConfig::new("thing", "nope");
        match registry().build(&config) {
            Err(Error::UnknownDriver(name)) => assert_eq!(name, "nope"),
            other => panic!("expected unknown driver, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_build_reports_parameter_failures() {
        let config = DriverConfig::new("thing", "fake");
        match registry().build(&config) {
            Err(Error::Driver { name, source }) => {
                assert_eq!(name, "thing");
                assert!(source
                    .to_string()
                    .contains("Path is a required parameter, but was not received."));
            }
            other => panic!("expected driver error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_build_all_keys_by_instance_name() {
        let configs = vec![
            DriverConfig::new("b", "fake").with_parameter("Path", json!("/tmp/b")),
            DriverConfig::new("a", "fake").with_parameter("Path", json!("/tmp/a")),
        ];

        let drivers = registry().build_all(&configs).unwrap();
        let names: Vec<&String> = drivers.keys().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(drivers["a"].name(), "fake");
    }

    #[test]
    fn test_build_all_stops_at_first_failure() {
        let configs = vec![
            DriverConfig::new("a", "fake").with_parameter("Path", json!("/tmp/a")),
            DriverConfig::new("b", "fake"),
        ];
        assert!(registry().build_all(&configs).is_err());
    }
}
