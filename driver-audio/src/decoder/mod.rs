//! # Audio Decoder Module
//!
//! File decoding through the pure-Rust Symphonia library.
//!
//! ```text
//! File → MediaSourceStream → FormatReader → Decoder → interleaved f32 frames
//! ```
//!
//! Which containers and codecs are understood depends on the `symphonia`
//! features enabled for the workspace (`all` by default). Rewinding a looping
//! stream rebuilds the format reader and decoder from byte zero, so any
//! format that can be opened can also be looped.

mod symphonia;

pub use self::symphonia::{SymphoniaSource, SymphoniaStream};
