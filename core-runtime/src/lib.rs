//! # Core Runtime Module
//!
//! Shared runtime infrastructure for processes hosting pin drivers:
//! - Logging and tracing setup
//! - JSON workspace configuration
//! - Event bus for driver state changes
//! - Driver registry mapping factory names to factories
//!
//! ## Overview
//!
//! Driver crates depend on this crate for the event bus and for logging
//! conventions. Host processes use the configuration and registry to create
//! the drivers they were told to run.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod registry;

pub use config::{DriverConfig, WorkspaceConfig};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, PlaybackEvent, RelayEvent};
pub use registry::DriverRegistry;
