//! # Audio Pin Driver
//!
//! A digital output pin whose *on* state plays an audio file in the
//! background and whose *off* state stops it.
//!
//! ## Overview
//!
//! - [`PlaybackController`] owns at most one playback session and runs its
//!   decode-and-output loop on a dedicated thread
//! - [`AudioPinDriver`] / [`AudioPin`] map the controller onto the HAL pin
//!   contract from `hal-traits`
//! - [`AudioDriverFactory`] builds drivers from `File` / `Loop` parameters
//! - [`AudioOutput`] holds the process-wide sink shared by every pin
//! - [`SymphoniaSource`] decodes files with Symphonia (feature `decoder`)
//! - [`CpalSink`] plays on the default output device (feature `cpal-output`)
//!
//! ## Usage
//!
//! ```ignore
//! use driver_audio::{AudioDriverFactory, AudioOutput, NullSink};
//! use hal_traits::{DriverFactory, Parameters};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! AudioOutput::global().initialize(Arc::new(NullSink::new()))?;
//!
//! let mut params = Parameters::new();
//! params.insert("File".into(), json!("/srv/sounds/alarm.mp3"));
//! params.insert("Loop".into(), json!(true));
//!
//! let driver = AudioDriverFactory::new().new_driver(&params)?;
//! let pin = driver.as_digital_output().unwrap().digital_output_pin(0)?;
//! pin.write(true).await?;
//! ```

pub mod config;
pub mod controller;
#[cfg(feature = "cpal-output")]
pub mod cpal_sink;
#[cfg(feature = "decoder")]
pub mod decoder;
pub mod driver;
pub mod error;
pub mod factory;
pub mod output;
pub mod traits;

pub use config::AudioPinConfig;
pub use controller::{
    PlaybackController, SessionOutcome, SessionReport, SessionStats, DEFAULT_STOP_TIMEOUT,
};
#[cfg(feature = "cpal-output")]
pub use cpal_sink::{CpalSink, CpalSinkConfig};
#[cfg(feature = "decoder")]
pub use decoder::{SymphoniaSource, SymphoniaStream};
pub use driver::{AudioPin, AudioPinDriver};
pub use error::{PlaybackError, Result};
pub use factory::{AudioDriverFactory, DRIVER_NAME};
pub use output::{AudioOutput, NullSink};
pub use traits::{AudioSink, AudioSource, AudioStream, FrameRead, FRAME_SAMPLES};
