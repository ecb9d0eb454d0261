//! Encryption glue for sealed packet payloads.
//!
//! The packet codec never sees key internals: payloads are sealed and
//! opened through the opaque [`EncryptKey`] / [`DecryptKey`] handles.
//! The bundled implementation is ChaCha20-Poly1305 with a random
//! 12-byte nonce prepended to the AEAD output.

use std::fmt;

use chacha20poly1305::{
    ChaCha20Poly1305, Key, Nonce,
    aead::{Aead, KeyInit},
};
use rand::Rng;

use crate::error::{ProtocolError, Result};

/// Key size in bytes (32 for ChaCha20).
pub const KEY_SIZE: usize = 32;

/// Nonce size in bytes.
pub const NONCE_SIZE: usize = 12;

/// Authentication tag size (16 bytes for Poly1305).
pub const TAG_SIZE: usize = 16;

/// Bytes a sealed payload grows by: nonce prefix plus auth tag.
pub const SEAL_OVERHEAD: usize = NONCE_SIZE + TAG_SIZE;

/// Opaque handle for sealing payloads.
#[derive(Clone)]
pub struct EncryptKey([u8; KEY_SIZE]);

/// Opaque handle for opening sealed payloads.
#[derive(Clone)]
pub struct DecryptKey([u8; KEY_SIZE]);

impl EncryptKey {
    /// Hex form for storing in a deployment config.
    pub fn to_hex(&self) -> String {
        format_hex(&self.0)
    }
}

impl DecryptKey {
    pub fn to_hex(&self) -> String {
        format_hex(&self.0)
    }
}

impl fmt::Debug for EncryptKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptKey(..)")
    }
}

impl fmt::Debug for DecryptKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DecryptKey(..)")
    }
}

/// The encrypt/decrypt handle pair handed to the two peers.
///
/// With the symmetric suite both handles wrap the same secret; they are
/// split so the encode and decode paths each take only the capability
/// they need.
#[derive(Debug, Clone)]
pub struct Keypair {
    pub encrypt: EncryptKey,
    pub decrypt: DecryptKey,
}

impl Keypair {
    /// Generates a fresh key pair.
    pub fn generate() -> Self {
        let mut secret = [0u8; KEY_SIZE];
        rand::thread_rng().fill(&mut secret);
        Self::from_secret(secret)
    }

    /// Builds the pair from hex-encoded key material (64 characters).
    pub fn from_hex(hex: &str) -> Result<Self> {
        Ok(Self::from_secret(parse_hex(hex)?))
    }

    fn from_secret(secret: [u8; KEY_SIZE]) -> Self {
        Self {
            encrypt: EncryptKey(secret),
            decrypt: DecryptKey(secret),
        }
    }
}

/// Seals `plaintext` under `key`. Output layout: nonce || ciphertext+tag.
pub fn encrypt(plaintext: &[u8], key: &EncryptKey) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key.0));
    let mut nonce = [0u8; NONCE_SIZE];
    rand::thread_rng().fill(&mut nonce);
    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| ProtocolError::EncryptionFailed)?;
    let mut out = Vec::with_capacity(NONCE_SIZE + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Opens a sealed payload. Fails on truncation, a wrong key, or any
/// tampering with the ciphertext.
pub fn decrypt(ciphertext: &[u8], key: &DecryptKey) -> Result<Vec<u8>> {
    if ciphertext.len() < SEAL_OVERHEAD {
        return Err(ProtocolError::DecryptionFailed);
    }
    let (nonce, sealed) = ciphertext.split_at(NONCE_SIZE);
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key.0));
    cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| ProtocolError::DecryptionFailed)
}

fn parse_hex(hex: &str) -> Result<[u8; KEY_SIZE]> {
    let hex = hex.trim();
    if !hex.is_ascii() {
        return Err(ProtocolError::InvalidKey(
            "non-ASCII characters in key material".to_string(),
        ));
    }
    if hex.len() != KEY_SIZE * 2 {
        return Err(ProtocolError::InvalidKey(format!(
            "expected {} hex characters, got {}",
            KEY_SIZE * 2,
            hex.len()
        )));
    }
    let mut secret = [0u8; KEY_SIZE];
    for (i, byte) in secret.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|e| {
            ProtocolError::InvalidKey(format!("invalid hex at position {}: {e}", i * 2))
        })?;
    }
    Ok(secret)
}

fn format_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
