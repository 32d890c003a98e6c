//! Thin façade over the cryptographic primitives the handshake and packet
//! stream are built from: X25519 ECDH, XChaCha20-Poly1305 AEAD, SHA-256,
//! HMAC-SHA256, HKDF-SHA256, and a CSPRNG.
//!
//! Nothing here panics on adversary-controlled input; malformed sizes come
//! back as `CryptoError` variants instead.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use x25519_dalek::{EphemeralSecret, PublicKey};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

/// Length in bytes of an X25519 public key, a SHA-256 digest, and every
/// session/shared key used in this crate.
pub const KEY_LEN: usize = 32;
/// Length in bytes of a role-resolution nonce.
pub const NONCE32_LEN: usize = 32;
/// Length in bytes of an XChaCha20-Poly1305 nonce.
pub const XNONCE_LEN: usize = 24;
/// Length in bytes of the Poly1305 authentication tag.
pub const TAG_LEN: usize = 16;
/// Minimum accepted PSK length.
pub const MIN_PSK_LEN: usize = 16;

/// A freshly generated ephemeral X25519 key pair. Destroyed (the secret
/// scalar zeroized) once it is consumed by [`ecdh`].
pub struct KeyPair {
    secret: EphemeralSecret,
    pub public: [u8; KEY_LEN],
}

/// A 32-byte key that zeroizes its backing memory on drop. Used for shared
/// secrets and derived session keys.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretKey32(pub [u8; KEY_LEN]);

impl SecretKey32 {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

/// Generates a fresh ephemeral X25519 key pair using the OS CSPRNG.
pub fn x25519_keygen() -> KeyPair {
    let secret = EphemeralSecret::random_from_rng(OsRng);
    let public = PublicKey::from(&secret);
    KeyPair {
        secret,
        public: *public.as_bytes(),
    }
}

/// Performs X25519 Diffie-Hellman between `pair`'s ephemeral secret and
/// `peer_public`, consuming `pair` (the secret is single-use by
/// construction). Rejects malformed peer key sizes before reaching the
/// curve arithmetic.
pub fn ecdh(pair: KeyPair, peer_public: &[u8]) -> Result<SecretKey32, CryptoError> {
    if peer_public.len() != KEY_LEN {
        return Err(CryptoError::KeyExchange);
    }
    let mut peer_bytes = [0u8; KEY_LEN];
    peer_bytes.copy_from_slice(peer_public);
    let peer_pub = PublicKey::from(peer_bytes);
    let shared = pair.secret.diffie_hellman(&peer_pub);
    Ok(SecretKey32(*shared.as_bytes()))
}

/// SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256(key, data).
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    // A `key` of any length is valid per RFC 2104; HMAC itself hashes
    // over-length keys down before use.
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    let result = mac.finalize().into_bytes();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}

/// Constant-time comparison of two MACs (or any two equal-length secrets).
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// HKDF-SHA256 with `ikm` as input key material and `salt` as the extract
/// salt, expanding `info` into a 32-byte output.
pub fn hkdf_sha256(ikm: &[u8], salt: &[u8], info: &[u8]) -> Result<SecretKey32, CryptoError> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = [0u8; KEY_LEN];
    hk.expand(info, &mut okm)
        .map_err(|_| CryptoError::KeyDerivation)?;
    Ok(SecretKey32(okm))
}

/// Seals `plaintext` under `key` and `nonce`, returning ciphertext with the
/// 16-byte Poly1305 tag appended.
pub fn xchacha20poly1305_seal(
    key: &[u8; KEY_LEN],
    nonce: &[u8; XNONCE_LEN],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .encrypt(XNonce::from_slice(nonce), plaintext)
        .map_err(|_| CryptoError::Encryption)
}

/// Opens `ciphertext` (tag included) under `key` and `nonce`. A tag
/// mismatch is a fatal, non-retryable `CryptoError::Decryption`.
pub fn xchacha20poly1305_open(
    key: &[u8; KEY_LEN],
    nonce: &[u8; XNONCE_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::Decryption)
}

/// Fills a fresh buffer of `n` bytes from the OS CSPRNG.
pub fn csprng_bytes(n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    OsRng.fill_bytes(&mut buf);
    buf
}

/// Generates a fresh 32-byte role-resolution nonce.
pub fn nonce32() -> [u8; NONCE32_LEN] {
    let mut buf = [0u8; NONCE32_LEN];
    OsRng.fill_bytes(&mut buf);
    buf
}

/// Generates a fresh 24-byte per-record AEAD nonce.
pub fn xnonce() -> [u8; XNONCE_LEN] {
    let mut buf = [0u8; XNONCE_LEN];
    OsRng.fill_bytes(&mut buf);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ecdh_agreement() {
        let a = x25519_keygen();
        let b = x25519_keygen();
        let a_pub = a.public;
        let b_pub = b.public;
        let shared_a = ecdh(a, &b_pub).unwrap();
        let shared_b = ecdh(b, &a_pub).unwrap();
        assert_eq!(shared_a.as_bytes(), shared_b.as_bytes());
        assert_eq!(shared_a.as_bytes().len(), 32);
    }

    #[test]
    fn ecdh_rejects_malformed_peer_key() {
        let a = x25519_keygen();
        assert!(matches!(ecdh(a, &[0u8; 31]), Err(CryptoError::KeyExchange)));
    }

    #[test]
    fn hkdf_deterministic_and_separates_by_info() {
        let ikm = [7u8; 32];
        let salt = [9u8; 32];
        let a = hkdf_sha256(&ikm, &salt, b"enc").unwrap();
        let a2 = hkdf_sha256(&ikm, &salt, b"enc").unwrap();
        let b = hkdf_sha256(&ikm, &salt, b"dec").unwrap();
        assert_eq!(a.as_bytes(), a2.as_bytes());
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn aead_round_trip_and_tamper_detection() {
        let key = [1u8; 32];
        let nonce = [2u8; 24];
        let pt = b"hello, world";
        let ct = xchacha20poly1305_seal(&key, &nonce, pt).unwrap();
        assert_eq!(ct.len(), pt.len() + TAG_LEN);
        let opened = xchacha20poly1305_open(&key, &nonce, &ct).unwrap();
        assert_eq!(opened, pt);

        let mut tampered = ct.clone();
        tampered[0] ^= 0x01;
        assert!(xchacha20poly1305_open(&key, &nonce, &tampered).is_err());

        let mut bad_nonce = nonce;
        bad_nonce[0] ^= 0x01;
        assert!(xchacha20poly1305_open(&key, &bad_nonce, &ct).is_err());
    }

    #[test]
    fn hmac_matches_for_same_inputs() {
        let mac1 = hmac_sha256(b"psk-key-material", b"transcript");
        let mac2 = hmac_sha256(b"psk-key-material", b"transcript");
        assert!(constant_time_eq(&mac1, &mac2));
    }
}
