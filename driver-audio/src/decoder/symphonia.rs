//! # Symphonia Audio Source
//!
//! [`AudioSource`] that opens local files and decodes them with Symphonia.

use crate::error::{PlaybackError, Result};
use crate::traits::{AudioSource, AudioStream, FrameRead};
use core_runtime::logging::strip_path;
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, error, instrument, trace, warn};

/// Packets that may fail to decode in a row before the stream is given up.
const MAX_CONSECUTIVE_ERRORS: usize = 10;

/// Opens files through Symphonia's default probe and codec registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaSource;

impl SymphoniaSource {
    pub fn new() -> Self {
        Self
    }
}

impl AudioSource for SymphoniaSource {
    #[instrument(skip(self, path), fields(file = %strip_path(&path.to_string_lossy())))]
    fn open(&self, path: &Path) -> Result<Box<dyn AudioStream>> {
        Ok(Box::new(SymphoniaStream::open(path)?))
    }
}

/// Format reader and decoder for one selected track.
struct Pipeline {
    reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
}

impl Pipeline {
    fn probe(mss: MediaSourceStream, hint: &Hint) -> std::result::Result<Self, String> {
        let probed = symphonia::default::get_probe()
            .format(
                hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| format!("failed to probe format: {}", e))?;

        let reader = probed.format;

        let track = reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| "no decodable audio track".to_string())?;

        let track_id = track.id;
        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| format!("failed to create codec decoder: {}", e))?;

        debug!(
            track_id,
            sample_rate = ?track.codec_params.sample_rate,
            channels = ?track.codec_params.channels.map(|c| c.count()),
            "Selected audio track"
        );

        Ok(Self {
            reader,
            decoder,
            track_id,
        })
    }
}

/// Decoded file served as fixed-size frames of interleaved f32 samples.
pub struct SymphoniaStream {
    path: PathBuf,
    hint: Hint,
    /// `None` only after a failed rewind.
    pipeline: Option<Pipeline>,
    /// Samples of the last decoded packet not yet handed out.
    pending: Vec<f32>,
    pending_pos: usize,
    eof: bool,
}

impl SymphoniaStream {
    /// Open `path` and build its decoder.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            error!(error = %e, "Failed to open audio file");
            PlaybackError::StreamOpenFailed(format!("{}: {}", path.display(), e))
        })?;

        let hint = hint_from_path(path);
        let mss = MediaSourceStream::new(Box::new(file) as Box<dyn MediaSource>, Default::default());

        let pipeline = Pipeline::probe(mss, &hint).map_err(|e| {
            error!(error = %e, "Failed to build decoder");
            PlaybackError::StreamOpenFailed(format!("{}: {}", path.display(), e))
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            hint,
            pipeline: Some(pipeline),
            pending: Vec::new(),
            pending_pos: 0,
            eof: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Refill `pending` from the next packet. Returns `false` at the end of
    /// the stream.
    fn decode_next_packet(&mut self) -> Result<bool> {
        let pipeline = self
            .pipeline
            .as_mut()
            .ok_or_else(|| PlaybackError::DecodeFailed("stream is closed".to_string()))?;

        let mut consecutive_errors = 0;

        loop {
            let packet = match pipeline.reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    trace!("Reached end of stream");
                    return Ok(false);
                }
                Err(SymphoniaError::ResetRequired) => {
                    return Err(PlaybackError::DecodeFailed(
                        "track list changed, reset required".to_string(),
                    ));
                }
                Err(e) => {
                    return Err(PlaybackError::DecodeFailed(format!(
                        "failed to read packet: {}",
                        e
                    )));
                }
            };

            while !pipeline.reader.metadata().is_latest() {
                pipeline.reader.metadata().pop();
            }

            if packet.track_id() != pipeline.track_id {
                continue;
            }

            match pipeline.decoder.decode(&packet) {
                Ok(decoded) => {
                    let mut samples = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
                    samples.copy_interleaved_ref(decoded);

                    self.pending.clear();
                    self.pending.extend_from_slice(samples.samples());
                    self.pending_pos = 0;
                    return Ok(true);
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    consecutive_errors += 1;
                    warn!(
                        attempt = consecutive_errors,
                        max = MAX_CONSECUTIVE_ERRORS,
                        error = %e,
                        "Skipping packet with decode error"
                    );
                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        return Err(PlaybackError::DecodeFailed(format!(
                            "{} consecutive packets failed to decode: {}",
                            MAX_CONSECUTIVE_ERRORS, e
                        )));
                    }
                }
                Err(SymphoniaError::IoError(e)) => {
                    consecutive_errors += 1;
                    warn!(
                        attempt = consecutive_errors,
                        max = MAX_CONSECUTIVE_ERRORS,
                        error = %e,
                        "Skipping corrupted packet"
                    );
                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        return Err(PlaybackError::DecodeFailed(format!(
                            "stream corrupted after {} failed packets: {}",
                            MAX_CONSECUTIVE_ERRORS, e
                        )));
                    }
                }
                Err(e) => {
                    return Err(PlaybackError::DecodeFailed(format!(
                        "failed to decode packet: {}",
                        e
                    )));
                }
            }
        }
    }
}

impl AudioStream for SymphoniaStream {
    fn read_frame(&mut self, buf: &mut [f32]) -> Result<FrameRead> {
        let mut written = 0;

        while written < buf.len() {
            let available = self.pending.len() - self.pending_pos;
            if available > 0 {
                let n = available.min(buf.len() - written);
                buf[written..written + n]
                    .copy_from_slice(&self.pending[self.pending_pos..self.pending_pos + n]);
                self.pending_pos += n;
                written += n;
                continue;
            }

            if self.eof || !self.decode_next_packet()? {
                self.eof = true;
                break;
            }
        }

        if written == 0 && self.eof {
            return Ok(FrameRead::EndOfStream);
        }
        Ok(FrameRead::Samples(written))
    }

    fn rewind(&mut self) -> Result<()> {
        let pipeline = self
            .pipeline
            .take()
            .ok_or_else(|| PlaybackError::RestartFailed("stream is closed".to_string()))?;

        let mut mss = pipeline.reader.into_inner();
        mss.seek(SeekFrom::Start(0))
            .map_err(|e| PlaybackError::RestartFailed(format!("failed to seek to start: {}", e)))?;

        let pipeline = Pipeline::probe(mss, &self.hint).map_err(PlaybackError::RestartFailed)?;

        self.pipeline = Some(pipeline);
        self.pending.clear();
        self.pending_pos = 0;
        self.eof = false;
        debug!(file = %strip_path(&self.path.to_string_lossy()), "Stream rewound");
        Ok(())
    }
}

/// Probe hint from the file extension.
fn hint_from_path(path: &Path) -> Hint {
    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }
    hint
}
