//! # cpal Output Sink
//!
//! Plays frames on the default output device.
//!
//! Writers push into a ring buffer; the device callback pops from it and pads
//! with silence when it runs dry. A full buffer makes `write_frame` back off
//! and retry until the write timeout, after which the rest of the frame is
//! dropped and `SinkWriteFailed` is returned.
//!
//! `cpal::Stream` is not `Send`, so the stream lives on its own thread for as
//! long as the sink exists.
//!
//! Frames are passed through unchanged: the file's sample rate and channel
//! layout are expected to match the device.

use crate::error::{PlaybackError, Result};
use crate::traits::AudioSink;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

const BUFFER_BACKOFF: Duration = Duration::from_micros(500);

/// Ring buffer and back-pressure settings.
#[derive(Debug, Clone)]
pub struct CpalSinkConfig {
    /// Ring buffer capacity in samples
    pub buffer_samples: usize,
    /// Longest a write may wait for room in the buffer
    pub write_timeout: Duration,
}

impl Default for CpalSinkConfig {
    fn default() -> Self {
        Self {
            // About half a second of 48 kHz stereo
            buffer_samples: 48_000,
            write_timeout: Duration::from_millis(200),
        }
    }
}

impl CpalSinkConfig {
    pub fn with_buffer_samples(mut self, samples: usize) -> Self {
        self.buffer_samples = samples;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }
}

struct DeviceInfo {
    name: String,
    sample_rate: u32,
    channels: u16,
}

/// Sink backed by the default cpal output device.
pub struct CpalSink {
    producer: Mutex<HeapProd<f32>>,
    write_timeout: Duration,
    device: DeviceInfo,
    shutdown: Mutex<Option<mpsc::Sender<()>>>,
    device_thread: Mutex<Option<JoinHandle<()>>>,
}

impl CpalSink {
    /// Open the default output device with default settings.
    pub fn open_default() -> Result<Self> {
        Self::open(CpalSinkConfig::default())
    }

    /// Open the default output device.
    ///
    /// # Errors
    ///
    /// Returns `AudioDeviceError` when there is no output device, its default
    /// format is not f32, or the stream cannot be started.
    pub fn open(config: CpalSinkConfig) -> Result<Self> {
        let (producer, consumer) = HeapRb::<f32>::new(config.buffer_samples.max(1)).split();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<DeviceInfo>>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || {
                let stream = match build_stream(consumer) {
                    Ok((stream, info)) => {
                        ready_tx.send(Ok(info)).ok();
                        stream
                    }
                    Err(e) => {
                        ready_tx.send(Err(e)).ok();
                        return;
                    }
                };

                // Returns once the sink drops its sender.
                shutdown_rx.recv().ok();
                drop(stream);
                debug!("Audio output stream closed");
            })
            .map_err(|e| PlaybackError::AudioDeviceError(format!("failed to spawn output thread: {}", e)))?;

        let device = match ready_rx.recv() {
            Ok(Ok(info)) => info,
            Ok(Err(e)) => {
                handle.join().ok();
                return Err(e);
            }
            Err(_) => {
                handle.join().ok();
                return Err(PlaybackError::AudioDeviceError(
                    "output thread exited before the stream started".to_string(),
                ));
            }
        };

        info!(
            device = %device.name,
            sample_rate = device.sample_rate,
            channels = device.channels,
            "Audio output device opened"
        );

        Ok(Self {
            producer: Mutex::new(producer),
            write_timeout: config.write_timeout,
            device,
            shutdown: Mutex::new(Some(shutdown_tx)),
            device_thread: Mutex::new(Some(handle)),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.device.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.device.channels
    }
}

fn build_stream(mut consumer: HeapCons<f32>) -> Result<(cpal::Stream, DeviceInfo)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| PlaybackError::AudioDeviceError("no output device available".to_string()))?;

    let name = device.name().unwrap_or_else(|_| "unknown".to_string());
    let supported = device
        .default_output_config()
        .map_err(|e| PlaybackError::AudioDeviceError(format!("no default output config: {}", e)))?;

    if supported.sample_format() != cpal::SampleFormat::F32 {
        return Err(PlaybackError::AudioDeviceError(format!(
            "unsupported device sample format: {:?}",
            supported.sample_format()
        )));
    }

    let config: cpal::StreamConfig = supported.into();
    let info = DeviceInfo {
        name,
        sample_rate: config.sample_rate.0,
        channels: config.channels,
    };

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let read = consumer.pop_slice(data);
                data[read..].fill(0.0);
            },
            |err| error!(error = %err, "Audio output stream error"),
            None,
        )
        .map_err(|e| PlaybackError::AudioDeviceError(format!("failed to build stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| PlaybackError::AudioDeviceError(format!("failed to start stream: {}", e)))?;

    Ok((stream, info))
}

impl AudioSink for CpalSink {
    fn write_frame(&self, samples: &[f32]) -> Result<()> {
        let deadline = Instant::now() + self.write_timeout;
        let mut remaining = samples;

        while !remaining.is_empty() {
            let written = self.producer.lock().push_slice(remaining);
            remaining = &remaining[written..];

            if written == 0 {
                if Instant::now() >= deadline {
                    return Err(PlaybackError::SinkWriteFailed(format!(
                        "output buffer full, dropped {} samples",
                        remaining.len()
                    )));
                }
                thread::sleep(BUFFER_BACKOFF);
            }
        }

        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "cpal output '{}' ({} Hz, {} ch)",
            self.device.name, self.device.sample_rate, self.device.channels
        )
    }
}

impl Drop for CpalSink {
    fn drop(&mut self) {
        self.shutdown.lock().take();
        if let Some(handle) = self.device_thread.lock().take() {
            if handle.join().is_err() {
                warn!("Audio output thread panicked");
            }
        }
    }
}
