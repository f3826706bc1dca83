//! # Audio Pin Demo
//!
//! Switches an audio pin on, lets it play for a while, and switches it off.
//!
//! Run with:
//! ```bash
//! # Discard audio, just watch the logs
//! cargo run -p driver-audio --example playback_demo -- /path/to/alarm.mp3
//!
//! # Play on the default output device, looping for 10 seconds
//! cargo run -p driver-audio --example playback_demo --features cpal-output -- /path/to/alarm.mp3 loop 10
//! ```

use anyhow::{Context, Result};
use core_runtime::events::EventBus;
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use driver_audio::{AudioDriverFactory, AudioOutput, AudioSink};
use hal_traits::{DriverFactory, Parameters};
use serde_json::json;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[cfg(feature = "cpal-output")]
fn open_sink() -> Result<Arc<dyn AudioSink>> {
    Ok(Arc::new(driver_audio::CpalSink::open_default()?))
}

#[cfg(not(feature = "cpal-output"))]
fn open_sink() -> Result<Arc<dyn AudioSink>> {
    Ok(Arc::new(driver_audio::NullSink::new()))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug),
    )?;

    let args: Vec<String> = env::args().collect();
    let file = args
        .get(1)
        .context("usage: playback_demo <file> [loop] [seconds]")?;
    let looping = args.get(2).map(|a| a == "loop").unwrap_or(false);
    let seconds: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(5);

    AudioOutput::global().initialize(open_sink()?)?;

    let bus = EventBus::default();
    let mut events = bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            info!(?event, "Playback event");
        }
    });

    let mut params = Parameters::new();
    params.insert("File".to_string(), json!(file));
    params.insert("Loop".to_string(), json!(looping));

    let driver = AudioDriverFactory::new()
        .with_event_bus(bus)
        .new_driver(&params)?;
    let pin = driver
        .as_digital_output()
        .context("audio driver has no digital output")?
        .digital_output_pin(0)?;

    pin.write(true).await?;
    info!(seconds, "Pin switched on");

    for _ in 0..seconds {
        tokio::time::sleep(Duration::from_secs(1)).await;
        if !pin.last_state() {
            info!("Playback ended on its own");
            break;
        }
    }

    pin.write(false).await?;
    info!("Pin switched off");
    driver.close().await?;
    Ok(())
}
