//! The handshake state machine: a role-resolving, MAC-bound
//! Diffie-Hellman exchange driven identically by both peers.
//!
//! Neither side is configured as initiator or responder; the role falls
//! out of a nonce comparison in phase one. Authentication, when a
//! pre-shared secret is configured, comes from an HMAC-SHA256 transcript
//! MAC rather than a per-peer signing identity.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::channel;
use crate::config::Options;
use crate::crypto::{self, SecretKey32};
use crate::error::{CryptoError, Error};

/// The role a peer settles into once both nonces have been exchanged.
/// Never configured — always derived, and identically by both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

/// The two directed session keys a completed handshake yields.
pub struct HandshakeOutput {
    pub role: Role,
    /// Key for outgoing frames.
    pub enc_key: SecretKey32,
    /// Key for incoming frames.
    pub dec_key: SecretKey32,
}

const KEX_MESSAGE_LEN: usize = crypto::KEY_LEN + 1;

/// Drives the four-phase handshake to completion over `channel`, returning
/// the resolved role and the two session keys, or a fatal `Error`.
///
/// No retry happens inside this function: a handshake that fails must be
/// retried, if at all, over a fresh channel.
pub async fn handshake<T>(conn: &mut T, opts: &Options) -> Result<HandshakeOutput, Error>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    opts.validate()?;

    // Phase 1 — nonce exchange. Both sides send unconditionally, then read;
    // there is no role yet to order this by.
    let local_nonce = crypto::nonce32();
    channel::write_all(conn, &local_nonce).await?;
    let peer_nonce = channel::read_exact(conn, crypto::NONCE32_LEN).await?;

    let role = match local_nonce.as_slice().cmp(peer_nonce.as_slice()) {
        std::cmp::Ordering::Greater => Role::Initiator,
        _ => Role::Responder,
    };
    tracing::debug!(?role, "nonce exchange complete");

    // Phase 2 — key exchange. Ordering matters: the initiator must write
    // before it reads, or both peers block reading from each other.
    let keypair = crypto::x25519_keygen();
    let local_public = keypair.public;
    let local_psk_present = opts.psk.is_some();

    let mut local_kex = Vec::with_capacity(KEX_MESSAGE_LEN);
    local_kex.extend_from_slice(&local_public);
    local_kex.push(local_psk_present as u8);

    let peer_kex = match role {
        Role::Initiator => {
            channel::write_all(conn, &local_kex).await?;
            channel::read_exact(conn, KEX_MESSAGE_LEN).await?
        }
        Role::Responder => {
            let peer_kex = channel::read_exact(conn, KEX_MESSAGE_LEN).await?;
            channel::write_all(conn, &local_kex).await?;
            peer_kex
        }
    };
    let peer_public: [u8; crypto::KEY_LEN] = peer_kex[..crypto::KEY_LEN].try_into().unwrap();
    let peer_psk_present = peer_kex[crypto::KEY_LEN] != 0;
    tracing::debug!(?role, "key exchange complete");

    // Phase 3 — transcript, shared secret, and optional PSK MAC.
    let (initiator_public, responder_public) = match role {
        Role::Initiator => (local_public, peer_public),
        Role::Responder => (peer_public, local_public),
    };
    let mut transcript = Vec::with_capacity(64);
    transcript.extend_from_slice(&initiator_public);
    transcript.extend_from_slice(&responder_public);
    let transcript_hash = crypto::sha256(&transcript);

    let shared_secret = crypto::ecdh(keypair, &peer_public)?;

    // A PSK-presence mismatch fails closed, immediately, for both peers,
    // instead of silently desynchronizing the MAC phase.
    if local_psk_present != peer_psk_present {
        tracing::warn!("PSK configuration mismatch between peers");
        return Err(CryptoError::Authentication.into());
    }

    if local_psk_present {
        let psk = opts.psk.as_ref().expect("validated non-empty above");
        let local_mac = crypto::hmac_sha256(psk, &transcript);

        let peer_mac = match role {
            Role::Initiator => {
                channel::write_all(conn, &local_mac).await?;
                channel::read_exact(conn, 32).await?
            }
            Role::Responder => {
                let peer_mac = channel::read_exact(conn, 32).await?;
                channel::write_all(conn, &local_mac).await?;
                peer_mac
            }
        };

        if !crypto::constant_time_eq(&local_mac, &peer_mac) {
            tracing::warn!("transcript MAC mismatch");
            return Err(CryptoError::Authentication.into());
        }
        tracing::debug!(?role, "PSK transcript authenticated");
    } else {
        tracing::warn!("handshake completed without PSK authentication; peer is unauthenticated");
    }

    // Phase 4 — key derivation.
    let k_init = crypto::hkdf_sha256(shared_secret.as_bytes(), &transcript_hash, b"enc")?;
    let k_resp = crypto::hkdf_sha256(shared_secret.as_bytes(), &transcript_hash, b"dec")?;

    let (enc_key, dec_key) = match role {
        Role::Initiator => (k_init, k_resp),
        Role::Responder => (k_resp, k_init),
    };
    tracing::info!(?role, "handshake established");

    Ok(HandshakeOutput {
        role,
        enc_key,
        dec_key,
    })
}
