//! Logging system demonstration
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run -p core-runtime --example logging_demo
//!
//! # JSON format
//! cargo run -p core-runtime --example logging_demo -- json
//!
//! # Compact format with a custom filter
//! cargo run -p core-runtime --example logging_demo -- compact "driver_audio=trace"
//! ```

use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use core_runtime::logging::{init_logging, strip_path, LogFormat, LogLevel, LoggingConfig};
use std::env;
use tracing::{debug, info, info_span, instrument, warn};

fn main() {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::default(),
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace)
        .with_spans(true);

    if let Some(filter) = args.get(2) {
        config = config.with_filter(filter.clone());
    }

    if let Err(e) = init_logging(config) {
        eprintln!("Failed to initialize logging: {}", e);
        return;
    }

    info!(format = ?format, "Logging initialized");

    let bus = EventBus::default();
    let mut events = bus.subscribe();

    simulate_session(&bus, "/home/reef/sounds/alarm.mp3");

    while let Ok(event) = events.try_recv() {
        info!(severity = ?event.severity(), description = event.description(), "Event received");
    }
}

#[instrument(skip(bus, path), fields(file = %strip_path(path)))]
fn simulate_session(bus: &EventBus, path: &str) {
    let span = info_span!("playback", driver = "alarm", session_id = 1u64);
    let _guard = span.enter();

    bus.emit(CoreEvent::Playback(PlaybackEvent::Started {
        driver: "alarm".to_string(),
        session_id: 1,
    }))
    .ok();

    for restart in 1..=2u64 {
        debug!(restarts = restart, "End of stream, rewinding");
        bus.emit(CoreEvent::Playback(PlaybackEvent::Restarted {
            driver: "alarm".to_string(),
            session_id: 1,
            restarts: restart,
        }))
        .ok();
    }

    warn!(failures = 1u64, "Sink write failed, continuing");

    bus.emit(CoreEvent::Playback(PlaybackEvent::Stopped {
        driver: "alarm".to_string(),
        session_id: 1,
    }))
    .ok();
}
