//! Driver factories and their parameter schema.
//!
//! A factory describes the parameters a driver needs, validates a parameter
//! map against that description, and builds driver instances. Parameters are
//! carried as JSON values so they can come straight from a configuration file.

use crate::capability::Metadata;
use crate::error::Result;
use crate::pin::Driver;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Raw driver parameters keyed by parameter name.
pub type Parameters = serde_json::Map<String, Value>;

/// Validation failures keyed by parameter name.
pub type ValidationFailures = BTreeMap<String, Vec<String>>;

/// Value type of a configuration parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Integer,
    Decimal,
    Boolean,
}

impl ParameterType {
    /// Whether `value` has this type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParameterType::String => value.is_string(),
            ParameterType::Integer => value.is_i64() || value.is_u64(),
            ParameterType::Decimal => value.is_number(),
            ParameterType::Boolean => value.is_boolean(),
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParameterType::String => "string",
            ParameterType::Integer => "integer",
            ParameterType::Decimal => "decimal",
            ParameterType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// Schema entry for one driver parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    /// Display order in configuration front-ends.
    pub order: u32,
    /// Suggested value. Only used in place of a missing optional parameter.
    pub default: Value,
    pub required: bool,
}

impl ConfigParameter {
    pub fn required(name: impl Into<String>, param_type: ParameterType, order: u32) -> Self {
        Self {
            name: name.into(),
            param_type,
            order,
            default: Value::Null,
            required: true,
        }
    }

    pub fn optional(
        name: impl Into<String>,
        param_type: ParameterType,
        order: u32,
        default: Value,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            order,
            default,
            required: false,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = default;
        self
    }
}

/// Builds driver instances of one type.
pub trait DriverFactory: Send + Sync {
    fn metadata(&self) -> &Metadata;

    fn parameters(&self) -> &[ConfigParameter];

    /// Check `parameters` against the schema. An empty map means valid.
    fn validate_parameters(&self, parameters: &Parameters) -> ValidationFailures {
        validate_against(self.parameters(), parameters)
    }

    /// Validate `parameters` and build a driver.
    ///
    /// # Errors
    ///
    /// Returns [`HalError::InvalidParameters`](crate::HalError::InvalidParameters)
    /// with every validation failure when the parameters are rejected.
    fn new_driver(&self, parameters: &Parameters) -> Result<Arc<dyn Driver>>;
}

/// Validate `parameters` against `schema`, collecting every failure.
pub fn validate_against(schema: &[ConfigParameter], parameters: &Parameters) -> ValidationFailures {
    let mut failures = ValidationFailures::new();

    for param in schema {
        match parameters.get(&param.name) {
            Some(value) if !param.param_type.matches(value) => {
                failures.entry(param.name.clone()).or_default().push(format!(
                    "{} is not a {}. {} was received.",
                    param.name, param.param_type, value
                ));
            }
            Some(_) => {}
            None if param.required => {
                failures.entry(param.name.clone()).or_default().push(format!(
                    "{} is a required parameter, but was not received.",
                    param.name
                ));
            }
            None => {}
        }
    }

    failures
}

/// Value of `name` in `parameters`, falling back to the schema default.
pub fn parameter_value<'a>(
    schema: &'a [ConfigParameter],
    parameters: &'a Parameters,
    name: &str,
) -> Option<&'a Value> {
    parameters.get(name).or_else(|| {
        schema
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.default)
            .filter(|v| !v.is_null())
    })
}

/// Flatten validation failures into one message.
pub fn to_error_string(failures: &ValidationFailures) -> String {
    failures
        .values()
        .flatten()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}
