//! A confidential, authenticated, packet-oriented transport over any
//! duplex byte channel.
//!
//! Two peers run [`connect`] over a shared `AsyncRead + AsyncWrite`
//! channel (a TCP socket, a Unix pipe, an in-memory `tokio::io::duplex`,
//! anything). Neither side is configured as client or server: the
//! handshake resolves an Initiator/Responder role from a nonce exchange,
//! derives a pair of XChaCha20-Poly1305 session keys over an X25519
//! Diffie-Hellman exchange, and optionally authenticates the exchange
//! with a pre-shared secret. The result is a [`stream::PacketStream`] that
//! seals and opens one frame per `write_packet`/`read_packet` call.
//!
//! ```ignore
//! let opts = Options::default().with_psk(b"a shared 16+ byte secret".to_vec());
//! let mut stream = cryptoframe::connect(io, &opts).await?;
//! stream.write_packet(b"hello").await?;
//! let reply = stream.read_packet().await?;
//! ```

pub mod channel;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handshake;
pub mod stream;

pub use config::Options;
pub use error::{ChannelError, CryptoError, Error, MessageError, Result};
pub use handshake::{HandshakeOutput, Role};
pub use stream::{PacketStream, Reader, Writer};

use tokio::io::{AsyncRead, AsyncWrite};

/// Runs the handshake over `io` and wraps it in a [`PacketStream`].
///
/// Both peers call this the same way, over the same channel — there is no
/// separate "connect" vs. "accept" entry point, since the protocol itself
/// resolves which side is which.
pub async fn connect<T>(mut io: T, opts: &Options) -> Result<PacketStream<T>>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    let out = handshake::handshake(&mut io, opts).await?;
    tracing::info!(role = ?out.role, "transport established");
    Ok(PacketStream::new(io, out.enc_key, out.dec_key, opts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn end_to_end_ping_pong_without_psk() {
        let (a, b) = tokio::io::duplex(1 << 16);
        let opts = Options::default();

        let (stream_a, stream_b) =
            tokio::join!(connect(a, &opts), connect(b, &opts));
        let mut stream_a = stream_a.unwrap();
        let mut stream_b = stream_b.unwrap();

        stream_a.write_packet(b"ping").await.unwrap();
        assert_eq!(stream_b.read_packet().await.unwrap(), b"ping");

        stream_b.write_packet(b"pong").await.unwrap();
        assert_eq!(stream_a.read_packet().await.unwrap(), b"pong");
    }

    #[tokio::test]
    async fn end_to_end_psk_success_round_trips_a_kilobyte_payload() {
        let (a, b) = tokio::io::duplex(1 << 16);
        let opts = Options::default().with_psk(vec![0x41; 32]);

        let (stream_a, stream_b) = tokio::join!(connect(a, &opts), connect(b, &opts));
        let mut stream_a = stream_a.unwrap();
        let mut stream_b = stream_b.unwrap();

        let payload = vec![0x7Eu8; 1024];
        stream_a.write_packet(&payload).await.unwrap();
        assert_eq!(stream_b.read_packet().await.unwrap(), payload);
    }

    #[tokio::test]
    async fn end_to_end_psk_mismatch_fails_before_any_application_data() {
        let (a, b) = tokio::io::duplex(1 << 16);
        let opts_a = Options::default().with_psk(vec![0x11; 32]);
        let opts_b = Options::default().with_psk(vec![0x22; 32]);

        let (res_a, res_b) = tokio::join!(connect(a, &opts_a), connect(b, &opts_b));
        assert!(matches!(res_a, Err(Error::Crypto(CryptoError::Authentication))));
        assert!(matches!(res_b, Err(Error::Crypto(CryptoError::Authentication))));
    }

    #[tokio::test]
    async fn split_halves_are_independently_usable() {
        let (a, b) = tokio::io::duplex(1 << 16);
        let opts = Options::default();

        let (stream_a, stream_b) = tokio::join!(connect(a, &opts), connect(b, &opts));
        let (mut reader_a, mut writer_a) = stream_a.unwrap().split();
        let (mut reader_b, mut writer_b) = stream_b.unwrap().split();

        let send = tokio::spawn(async move {
            writer_a.write_packet(b"from a").await.unwrap();
        });
        let recv = tokio::spawn(async move { reader_b.read_packet().await.unwrap() });
        send.await.unwrap();
        assert_eq!(recv.await.unwrap(), b"from a");

        writer_b.write_packet(b"from b").await.unwrap();
        assert_eq!(reader_a.read_packet().await.unwrap(), b"from b");
    }
}
