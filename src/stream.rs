//! The post-handshake packet stream: length-prefixed, per-record-nonce
//! XChaCha20-Poly1305 frames over an arbitrary duplex channel.
//!
//! Wraps a generic `AsyncRead + AsyncWrite` in a session-keyed codec, and
//! splits into independent `Reader`/`Writer` halves the way
//! `tokio::io::split` splits a duplex stream — so a caller can hand the
//! write half to one task and the read half to another without a shared
//! lock.

use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};

use crate::channel;
use crate::config::Options;
use crate::crypto::{self, SecretKey32};
use crate::error::{Error, MessageError};

/// Bytes of fixed overhead a sealed frame adds to its plaintext: the 4-byte
/// length prefix, the 24-byte nonce, and the 16-byte AEAD tag.
pub const FRAME_OVERHEAD: usize = 4 + crypto::XNONCE_LEN + crypto::TAG_LEN;

/// The write half of an established packet stream.
pub struct Writer<W> {
    inner: W,
    enc_key: SecretKey32,
    max_plaintext_size: u32,
}

/// The read half of an established packet stream.
pub struct Reader<R> {
    inner: R,
    dec_key: SecretKey32,
    max_plaintext_size: u32,
}

/// An established, bidirectional packet stream wrapping a single duplex
/// channel `T`. Call [`PacketStream::split`] to obtain independently usable
/// halves, the way [`tokio::io::split`] does for its underlying stream.
pub struct PacketStream<T> {
    inner: T,
    enc_key: SecretKey32,
    dec_key: SecretKey32,
    max_plaintext_size: u32,
}

impl<T> PacketStream<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(inner: T, enc_key: SecretKey32, dec_key: SecretKey32, opts: &Options) -> Self {
        PacketStream {
            inner,
            enc_key,
            dec_key,
            max_plaintext_size: opts.max_plaintext_size,
        }
    }

    /// Seals and sends one frame carrying `plaintext`.
    pub async fn write_packet(&mut self, plaintext: &[u8]) -> Result<(), Error> {
        write_packet(&mut self.inner, &self.enc_key, self.max_plaintext_size, plaintext).await
    }

    /// Reads and opens the next frame, returning its plaintext.
    pub async fn read_packet(&mut self) -> Result<Vec<u8>, Error> {
        read_packet(&mut self.inner, &self.dec_key, self.max_plaintext_size).await
    }

    /// Splits into independent halves sharing no state but the session
    /// keys, mirroring `tokio::io::split`'s lock-free read/write split.
    pub fn split(self) -> (Reader<ReadHalf<T>>, Writer<WriteHalf<T>>) {
        let (read_half, write_half) = tokio::io::split(self.inner);
        (
            Reader {
                inner: read_half,
                dec_key: self.dec_key,
                max_plaintext_size: self.max_plaintext_size,
            },
            Writer {
                inner: write_half,
                enc_key: self.enc_key,
                max_plaintext_size: self.max_plaintext_size,
            },
        )
    }
}

impl<W> Writer<W>
where
    W: AsyncWrite + Unpin,
{
    pub async fn write_packet(&mut self, plaintext: &[u8]) -> Result<(), Error> {
        write_packet(&mut self.inner, &self.enc_key, self.max_plaintext_size, plaintext).await
    }
}

impl<R> Reader<R>
where
    R: AsyncRead + Unpin,
{
    pub async fn read_packet(&mut self) -> Result<Vec<u8>, Error> {
        read_packet(&mut self.inner, &self.dec_key, self.max_plaintext_size).await
    }
}

async fn write_packet<W>(
    writer: &mut W,
    enc_key: &SecretKey32,
    max_plaintext_size: u32,
    plaintext: &[u8],
) -> Result<(), Error>
where
    W: AsyncWrite + Unpin,
{
    if plaintext.len() > max_plaintext_size as usize {
        return Err(MessageError::TooLarge {
            len: plaintext.len(),
            limit: max_plaintext_size as usize,
        }
        .into());
    }

    let nonce = crypto::xnonce();
    let ciphertext = crypto::xchacha20poly1305_seal(enc_key.as_bytes(), &nonce, plaintext)?;

    // Wire layout is `len(u32 LE) || nonce(24 B) || ciphertext(len B)` —
    // `len` covers the ciphertext only, not the nonce that follows it.
    let mut frame = Vec::with_capacity(4 + crypto::XNONCE_LEN + ciphertext.len());
    frame.extend_from_slice(&(ciphertext.len() as u32).to_le_bytes());
    frame.extend_from_slice(&nonce);
    frame.extend_from_slice(&ciphertext);

    channel::write_all(writer, &frame).await?;
    tracing::trace!(plaintext_len = plaintext.len(), "packet written");
    Ok(())
}

async fn read_packet<R>(
    reader: &mut R,
    dec_key: &SecretKey32,
    max_plaintext_size: u32,
) -> Result<Vec<u8>, Error>
where
    R: AsyncRead + Unpin,
{
    // `len` claims the ciphertext size (tag included); a frame claiming
    // more than that cannot possibly decrypt within the configured
    // plaintext bound, so it's rejected before the nonce or ciphertext
    // are even read off the wire.
    let read_bound = max_plaintext_size as usize + crypto::TAG_LEN;

    let len = channel::read_u32_le(reader).await.map_err(Error::Channel)? as usize;
    if len == 0 || len > read_bound {
        return Err(MessageError::TooLarge {
            len,
            limit: read_bound,
        }
        .into());
    }

    let nonce_bytes = channel::read_exact(reader, crypto::XNONCE_LEN).await?;
    let nonce: [u8; crypto::XNONCE_LEN] = nonce_bytes.try_into().unwrap();
    let ciphertext = channel::read_exact(reader, len).await?;

    let plaintext = crypto::xchacha20poly1305_open(dec_key.as_bytes(), &nonce, &ciphertext)?;
    tracing::trace!(plaintext_len = plaintext.len(), "packet read");
    Ok(plaintext)
}
