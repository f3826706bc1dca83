//! Driver capabilities and descriptive metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of pin a driver can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    DigitalInput,
    DigitalOutput,
    Pwm,
    AnalogInput,
}

impl Capability {
    /// Stable identifier used in configuration files and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::DigitalInput => "digital-input",
            Capability::DigitalOutput => "digital-output",
            Capability::Pwm => "pwm",
            Capability::AnalogInput => "analog-input",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of a driver type or driver instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Display name, also used as the pin name for single-pin drivers.
    pub name: String,
    /// Human readable description.
    pub description: String,
    /// Capabilities the driver can expose pins for.
    pub capabilities: Vec<Capability>,
}

impl Metadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            capabilities: Vec::new(),
        }
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}
