//! # Smart-Plug Driver
//!
//! Switches the relay of a TP-Link compatible smart plug (HS1xx, or a Tasmota
//! device emulating one) from a HAL digital output pin.
//!
//! ## Overview
//!
//! - [`protocol`]: autokey cipher and length-prefixed framing
//! - [`command`]: command documents, the [`Connector`] seam and [`CommandClient`]
//! - [`TasmotaDriver`]: one relay pin, plus `on`/`off`/`info`
//! - [`TasmotaFactory`]: builds drivers from an `Address` parameter

pub mod command;
pub mod driver;
pub mod error;
pub mod factory;
pub mod protocol;

pub use command::{
    CommandClient, Connection, Connector, Plug, RelayCommand, Sysinfo, SysinfoQuery,
    TcpConnector, DEFAULT_TIMEOUT,
};
pub use driver::{RelayPin, TasmotaDriver};
pub use error::{Result, TasmotaError};
pub use factory::{TasmotaFactory, ADDRESS_PARAMETER, DEFAULT_ADDRESS, DRIVER_NAME};
