//! Adapts a duplex byte stream into exact-length reads and whole-buffer
//! writes, mapping the handful of ways an OS socket can misbehave into the
//! `ChannelError` taxonomy.
//!
//! `tokio`'s `AsyncReadExt::read_exact` already buffers internally across
//! short reads, so this module's job is narrow: turn `UnexpectedEof` into
//! `Closed`, resets/aborts into `Reset`, and so on, instead of handing
//! callers a raw `io::Error` to match on.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ChannelError;

/// Reads exactly `n` bytes from `reader`, or fails with a classified
/// `ChannelError`. EOF before `n` bytes arrive surfaces as `Closed`.
pub async fn read_exact<R>(reader: &mut R, n: usize) -> Result<Vec<u8>, ChannelError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; n];
    reader
        .read_exact(&mut buf)
        .await
        .map_err(ChannelError::from_io)?;
    Ok(buf)
}

/// Writes all of `bytes` to `writer`, or fails with a classified
/// `ChannelError`.
pub async fn write_all<W>(writer: &mut W, bytes: &[u8]) -> Result<(), ChannelError>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(bytes)
        .await
        .map_err(ChannelError::from_io)?;
    writer.flush().await.map_err(ChannelError::from_io)?;
    Ok(())
}

/// Reads a little-endian `u32`.
pub async fn read_u32_le<R>(reader: &mut R) -> Result<u32, ChannelError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 4];
    reader
        .read_exact(&mut buf)
        .await
        .map_err(ChannelError::from_io)?;
    Ok(u32::from_le_bytes(buf))
}

/// Writes a little-endian `u32`.
pub async fn write_u32_le<W>(writer: &mut W, v: u32) -> Result<(), ChannelError>
where
    W: AsyncWrite + Unpin,
{
    write_all(writer, &v.to_le_bytes()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_exact_round_trips_over_duplex() {
        let (mut a, mut b) = tokio::io::duplex(64);
        write_all(&mut a, b"hello").await.unwrap();
        let got = read_exact(&mut b, 5).await.unwrap();
        assert_eq!(got, b"hello");
    }

    #[tokio::test]
    async fn read_exact_on_closed_channel_is_closed_error() {
        let (a, mut b) = tokio::io::duplex(64);
        drop(a);
        let err = read_exact(&mut b, 1).await.unwrap_err();
        assert!(matches!(err, ChannelError::Closed));
    }

    #[tokio::test]
    async fn u32_le_round_trip() {
        let (mut a, mut b) = tokio::io::duplex(64);
        write_u32_le(&mut a, 0x0102_0304).await.unwrap();
        let v = read_u32_le(&mut b).await.unwrap();
        assert_eq!(v, 0x0102_0304);
    }
}
