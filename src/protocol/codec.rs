//! Length-prefixed framing codec.
//!
//! Wire format: `[u32 BE length][payload]`. The length counts payload bytes
//! only, so a row or column of any size arrives intact regardless of how the
//! transport splits it into reads.

use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{MatmulError, Result};

/// Maximum frame size: 16 MiB.
pub const MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

/// Writes one frame and flushes the writer.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let len = u32::try_from(payload.len()).map_err(|_| MatmulError::FrameTooLarge {
        size: u32::MAX,
        max: MAX_FRAME_SIZE,
    })?;
    if len > MAX_FRAME_SIZE {
        return Err(MatmulError::FrameTooLarge {
            size: len,
            max: MAX_FRAME_SIZE,
        });
    }
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one frame.
///
/// EOF before any header byte is `ConnectionClosed`: the peer went away
/// without sending anything.
pub async fn read_frame<R>(reader: &mut R) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            return Err(MatmulError::ConnectionClosed);
        }
        Err(e) => return Err(MatmulError::Io(e)),
    }

    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_SIZE {
        return Err(MatmulError::FrameTooLarge {
            size: len,
            max: MAX_FRAME_SIZE,
        });
    }

    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

pub async fn write_text<W>(writer: &mut W, text: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    write_frame(writer, text.as_bytes()).await
}

/// Reads one frame and interprets it as UTF-8 text.
pub async fn read_text<R>(reader: &mut R) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let bytes = read_frame(reader).await?;
    String::from_utf8(bytes)
        .map_err(|e| MatmulError::MalformedMessage(format!("payload is not UTF-8: {}", e)))
}
