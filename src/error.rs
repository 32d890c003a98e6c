//! Structured error taxonomy surfaced across the public API.
//!
//! Every variant carries a kind suitable for programmatic handling; none of
//! the `Display` impls below ever interpolate key material, shared secrets,
//! or PSK bytes — only lengths, byte offsets, and variant names.

use thiserror::Error;

/// Errors raised by the cryptographic primitives (`crate::crypto`) and by
/// the handshake's authentication step.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Transcript MAC mismatch, or PSK-presence disagreement between peers.
    #[error("peer authentication failed")]
    Authentication,

    /// X25519 Diffie-Hellman input was not well-formed (wrong length).
    #[error("key exchange failed")]
    KeyExchange,

    /// A configured key (PSK, session key) did not meet size requirements.
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(&'static str),

    /// HKDF expand failed (only possible for pathological output lengths).
    #[error("key derivation failed")]
    KeyDerivation,

    /// AEAD seal failed. Should not happen for well-formed inputs.
    #[error("encryption failed")]
    Encryption,

    /// AEAD open failed — authentication tag mismatch. Not retryable.
    #[error("decryption failed")]
    Decryption,
}

/// Errors raised while encoding or decoding application-level messages.
#[derive(Error, Debug)]
pub enum MessageError {
    /// Plaintext (on write) or frame length (on read) exceeded the
    /// configured bound.
    #[error("message too large: {len} exceeds limit of {limit}")]
    TooLarge { len: usize, limit: usize },

    /// The codec could not serialize a value.
    #[error("serialization failed: {0}")]
    Serialization(&'static str),

    /// The codec could not deserialize a value (truncated input, invalid
    /// UTF-8, bad varint sentinel, bad option tag, ...).
    #[error("deserialization failed: {0}")]
    Deserialization(&'static str),

    /// A decoded value violated a format invariant (e.g. nsecs out of range).
    #[error("invalid format: {0}")]
    InvalidFormat(&'static str),
}

/// Errors raised by the `ByteChannel` adapter and the transport state
/// machine.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The peer closed the connection (EOF before the requested bytes
    /// arrived).
    #[error("channel closed")]
    Closed,

    /// The underlying connection was reset by the peer.
    #[error("connection reset")]
    Reset,

    /// The underlying connection was refused.
    #[error("connection refused")]
    Refused,

    /// A caller-imposed deadline elapsed.
    #[error("operation timed out")]
    Timeout,

    /// EOF was reached exactly at a message boundary (used internally;
    /// distinct from `Closed`, which denotes a short read).
    #[error("end of stream")]
    Eof,

    /// The handshake failed to complete (wraps the underlying cause).
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// The caller performed an operation the stream's current state
    /// forbids (e.g. a second concurrent read on the same half).
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    /// Any other I/O error, mapped from `std::io::Error`.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChannelError {
    /// Classifies a raw I/O error the way a real OS socket would report it.
    pub(crate) fn from_io(err: std::io::Error) -> Self {
        use std::io::ErrorKind::*;
        match err.kind() {
            UnexpectedEof => ChannelError::Closed,
            ConnectionReset | ConnectionAborted | BrokenPipe => ChannelError::Reset,
            ConnectionRefused => ChannelError::Refused,
            TimedOut => ChannelError::Timeout,
            _ => ChannelError::Io(err),
        }
    }
}

/// Top-level error type returned from the public API. Each family keeps its
/// own `Display`/`Error` impl; this just lets callers write one `Result`
/// type for the crate's entry points.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Message(#[from] MessageError),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Channel(ChannelError::from_io(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
