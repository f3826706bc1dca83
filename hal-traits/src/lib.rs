//! # Hardware Abstraction Traits
//!
//! The contract every output driver in this workspace implements.
//!
//! ## Overview
//!
//! Orchestration code never talks to a device directly. It discovers what a
//! driver can do through its [`Metadata`] and [`Capability`] list, enumerates
//! pins, and reads or writes them through the traits defined here. Drivers are
//! created by a [`DriverFactory`], which also publishes the parameter schema a
//! configuration front-end needs.
//!
//! ## Traits
//!
//! - [`Driver`] - metadata, capability-based pin enumeration, shutdown
//! - [`DigitalOutputDriver`] - indexed access to digital output pins
//! - [`Pin`] / [`DigitalOutputPin`] - boolean write and last-state readback
//! - [`DriverFactory`] - parameter schema, validation, construction
//!
//! ## Drivers
//!
//! | Driver | Crate | Pins |
//! |--------|-------|------|
//! | Audio playback | `driver-audio` | 1 digital output |
//! | Smart plug | `driver-tasmota` | 1 digital output |
//!
//! ## Error Handling
//!
//! All traits return [`HalError`]. Driver crates keep their own richer error
//! enums and convert at this boundary, keeping the message of the original
//! error.
//!
//! ## Thread Safety
//!
//! Every trait requires `Send + Sync` so drivers and pins can be shared across
//! async tasks behind an `Arc`.

pub mod capability;
pub mod error;
pub mod factory;
pub mod pin;

pub use capability::{Capability, Metadata};
pub use error::{HalError, Result};
pub use factory::{
    parameter_value, to_error_string, validate_against, ConfigParameter, DriverFactory,
    ParameterType, Parameters, ValidationFailures,
};
pub use pin::{DigitalOutputDriver, DigitalOutputPin, Driver, Pin};
