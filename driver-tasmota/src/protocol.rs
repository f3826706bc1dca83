//! # TP-Link Wire Protocol
//!
//! Every message is a JSON document obfuscated with the "autokey" XOR cipher
//! and prefixed with its length as a big-endian `u32`. Requests and responses
//! share the same framing.

use crate::error::{Result, TasmotaError};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// First key of the autokey cipher.
pub const INITIAL_KEY: u8 = 171;

/// Largest response accepted from a plug.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Obfuscate `plain`. Each output byte becomes the key for the next one.
pub fn encrypt(plain: &[u8]) -> Vec<u8> {
    let mut key = INITIAL_KEY;
    plain
        .iter()
        .map(|byte| {
            key ^= byte;
            key
        })
        .collect()
}

/// Reverse [`encrypt`].
pub fn decrypt(cipher: &[u8]) -> Vec<u8> {
    let mut key = INITIAL_KEY;
    cipher
        .iter()
        .map(|&byte| {
            let plain = key ^ byte;
            key = byte;
            plain
        })
        .collect()
}

/// Length-prefixed, encrypted frame for `plain`.
pub fn encode_frame(plain: &[u8]) -> Result<Vec<u8>> {
    let len = u32::try_from(plain.len())
        .map_err(|_| TasmotaError::Protocol(format!("payload of {} bytes", plain.len())))?;

    let mut frame = Vec::with_capacity(4 + plain.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend(encrypt(plain));
    Ok(frame)
}

pub async fn write_frame<W>(writer: &mut W, plain: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    writer.write_all(&encode_frame(plain)?).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame and return its decrypted payload.
pub async fn read_frame<R>(reader: &mut R) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let len = reader.read_u32().await? as usize;
    if len > MAX_FRAME_LEN {
        return Err(TasmotaError::Protocol(format!(
            "frame of {} bytes exceeds {} byte limit",
            len, MAX_FRAME_LEN
        )));
    }

    let mut cipher = vec![0u8; len];
    reader.read_exact(&mut cipher).await?;
    Ok(decrypt(&cipher))
}
