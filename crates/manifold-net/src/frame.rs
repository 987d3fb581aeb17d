//! Length-prefixed bincode framing.
//!
//! Wire format: `[u32 big-endian length][bincode payload]`. The length is
//! validated against [`MAX_FRAME_BYTES`] before any allocation happens, so
//! a corrupt or hostile peer cannot make the reader balloon.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{NetError, Result};

/// Reject any single frame larger than 64 MiB. Context value payloads are
/// chunked at 1024 bytes well below this; the limit only guards framing.
pub const MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

/// Read a `[u32 BE length][payload]` frame.
pub async fn read_frame<T>(io: &mut T) -> Result<Vec<u8>>
where
    T: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    io.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(NetError::FrameTooLarge {
            len,
            max: MAX_FRAME_BYTES,
        });
    }
    let mut buf = vec![0u8; len];
    io.read_exact(&mut buf).await?;
    Ok(buf)
}

/// Write a `[u32 BE length][payload]` frame.
pub async fn write_frame<T>(io: &mut T, data: &[u8]) -> Result<()>
where
    T: AsyncWrite + Unpin,
{
    let len = u32::try_from(data.len()).map_err(|_| NetError::FrameTooLarge {
        len: data.len(),
        max: MAX_FRAME_BYTES,
    })?;
    io.write_all(&len.to_be_bytes()).await?;
    io.write_all(data).await?;
    io.flush().await?;
    Ok(())
}

/// Read one frame and decode its payload.
pub async fn read_message<T, M>(io: &mut T) -> Result<M>
where
    T: AsyncRead + Unpin,
    M: DeserializeOwned,
{
    let buf = read_frame(io).await?;
    let (msg, _) = bincode::serde::decode_from_slice(&buf, bincode::config::standard())
        .map_err(|e| NetError::Serialization(e.to_string()))?;
    Ok(msg)
}

/// Encode a message and write it as one frame.
pub async fn write_message<T, M>(io: &mut T, msg: &M) -> Result<()>
where
    T: AsyncWrite + Unpin,
    M: Serialize,
{
    let buf = bincode::serde::encode_to_vec(msg, bincode::config::standard())
        .map_err(|e| NetError::Serialization(e.to_string()))?;
    write_frame(io, &buf).await
}

// ── Tests ─────────────────────────────────────────────────────────────────────
