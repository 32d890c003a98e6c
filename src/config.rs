//! Transport configuration: the maximum accepted plaintext size and an
//! optional pre-shared secret.
//!
//! A plain `Default` impl plus chainable `with_*` builder methods, with
//! `serde` derives so callers can persist it (`serde_json`/TOML) if they
//! want to, even though this crate itself never touches a filesystem.

use serde::{Deserialize, Serialize};

use crate::crypto::MIN_PSK_LEN;
use crate::error::CryptoError;

/// Default bound on plaintext size per frame (64 KiB).
pub const DEFAULT_MAX_PLAINTEXT_SIZE: u32 = 65536;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Options {
    /// Upper bound on a single frame's plaintext, in bytes. Must be `>= 1`.
    pub max_plaintext_size: u32,

    /// Optional pre-shared secret authenticating the handshake transcript.
    /// Must be `>= 16` bytes when present.
    pub psk: Option<Vec<u8>>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            max_plaintext_size: DEFAULT_MAX_PLAINTEXT_SIZE,
            psk: None,
        }
    }
}

impl Options {
    pub fn with_max_plaintext_size(mut self, size: u32) -> Self {
        self.max_plaintext_size = size;
        self
    }

    pub fn with_psk(mut self, psk: impl Into<Vec<u8>>) -> Self {
        self.psk = Some(psk.into());
        self
    }

    /// Sets the PSK from a string, attempting base64 decoding first and
    /// falling back to raw UTF-8 bytes, per the documented behavior of the
    /// reference implementation.
    pub fn with_psk_str(mut self, psk: &str) -> Self {
        use base64::{engine::general_purpose::STANDARD, Engine as _};
        let bytes = STANDARD
            .decode(psk)
            .unwrap_or_else(|_| psk.as_bytes().to_vec());
        self.psk = Some(bytes);
        self
    }

    /// Validates the configured bounds before any handshake bytes are sent.
    pub fn validate(&self) -> Result<(), CryptoError> {
        if self.max_plaintext_size < 1 {
            return Err(CryptoError::InvalidKeyMaterial(
                "max_plaintext_size must be at least 1",
            ));
        }
        if let Some(psk) = &self.psk {
            if psk.len() < MIN_PSK_LEN {
                return Err(CryptoError::InvalidKeyMaterial(
                    "psk must be at least 16 bytes",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let opts = Options::default();
        assert_eq!(opts.max_plaintext_size, 65536);
        assert!(opts.psk.is_none());
    }

    #[test]
    fn short_psk_fails_validation() {
        let opts = Options::default().with_psk(vec![0x41; 15]);
        assert!(matches!(
            opts.validate(),
            Err(CryptoError::InvalidKeyMaterial(_))
        ));
    }

    #[test]
    fn zero_max_plaintext_size_fails_validation() {
        let opts = Options::default().with_max_plaintext_size(0);
        assert!(opts.validate().is_err());
    }

    #[test]
    fn psk_str_prefers_base64_then_falls_back_to_utf8() {
        let opts = Options::default().with_psk_str("QUFBQUFBQUFBQUFBQUFBQQ=="); // base64("AAAAAAAAAAAAAAAA")
        assert_eq!(opts.psk.unwrap(), b"AAAAAAAAAAAAAAAA".to_vec());

        let opts = Options::default().with_psk_str("not-valid-base64!!");
        assert_eq!(opts.psk.unwrap(), b"not-valid-base64!!".to_vec());
    }
}
