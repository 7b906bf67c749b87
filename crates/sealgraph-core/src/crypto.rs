//! Cryptographic primitives for SealGraph.
//!
//! Wraps Ed25519 feed identities and the symmetric ciphers used to seal
//! records with strong types.

use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use ed25519_dalek::SigningKey;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// A 32-byte Ed25519 public key identifying the author of a feed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ed25519PublicKey(pub [u8; 32]);

impl Ed25519PublicKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Pub({})", &self.to_hex()[..16])
    }
}

/// The author keypair of a graph instance.
///
/// Only the public half is used today: it namespaces the feeds this
/// instance writes to.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let signing_key = SigningKey::generate(&mut rng);
        Self { signing_key }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Get the public key.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.public_key())
    }
}

/// Cipher used to seal a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CipherKind {
    /// Unauthenticated ChaCha20 stream cipher. Decrypting with the wrong key
    /// yields garbage, never an error; the record checksum catches it.
    #[default]
    ChaCha20 = 1,
    /// ChaCha20-Poly1305 AEAD. The tag is verified before the checksum.
    ChaCha20Poly1305 = 2,
}

impl CipherKind {
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(CipherKind::ChaCha20),
            2 => Some(CipherKind::ChaCha20Poly1305),
            _ => None,
        }
    }
}

/// A 96-bit nonce derived from a record's position within its feed.
///
/// Positions are unique per feed and a key is bound to one object in one
/// feed, so a key never sees the same nonce twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordNonce([u8; 12]);

impl RecordNonce {
    /// Little-endian position in the first 8 bytes, zero padded.
    pub fn from_position(position: u64) -> Self {
        let mut bytes = [0u8; 12];
        bytes[..8].copy_from_slice(&position.to_le_bytes());
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }
}

/// A 256-bit symmetric key bound to one object of one feed.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey {
    kind: CipherKind,
    bytes: [u8; 32],
}

impl SymmetricKey {
    /// Generate a new random key.
    pub fn generate(kind: CipherKind) -> Self {
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        Self { kind, bytes }
    }

    /// Create from raw bytes.
    pub const fn from_bytes(kind: CipherKind, bytes: [u8; 32]) -> Self {
        Self { kind, bytes }
    }

    /// Create from a byte slice, checking its length.
    pub fn from_slice(kind: CipherKind, slice: &[u8]) -> Result<Self> {
        let bytes: [u8; 32] = slice
            .try_into()
            .map_err(|_| CoreError::InvalidKeyLength(slice.len()))?;
        Ok(Self { kind, bytes })
    }

    pub fn kind(&self) -> CipherKind {
        self.kind
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Encrypt `plaintext` for the record at `nonce`.
    pub fn encrypt(&self, plaintext: &[u8], nonce: &RecordNonce) -> Result<Vec<u8>> {
        match self.kind {
            CipherKind::ChaCha20 => Ok(self.apply_keystream(plaintext, nonce)),
            CipherKind::ChaCha20Poly1305 => {
                let cipher = ChaCha20Poly1305::new_from_slice(&self.bytes)
                    .map_err(|e| CoreError::Encryption(e.to_string()))?;
                cipher
                    .encrypt(Nonce::from_slice(nonce.as_bytes()), plaintext)
                    .map_err(|e| CoreError::Encryption(e.to_string()))
            }
        }
    }

    /// Decrypt `ciphertext` for the record at `nonce`.
    ///
    /// For [`CipherKind::ChaCha20`] this cannot fail, whatever the key.
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &RecordNonce) -> Result<Vec<u8>> {
        match self.kind {
            CipherKind::ChaCha20 => Ok(self.apply_keystream(ciphertext, nonce)),
            CipherKind::ChaCha20Poly1305 => {
                let cipher = ChaCha20Poly1305::new_from_slice(&self.bytes)
                    .map_err(|_| CoreError::Unauthenticated)?;
                cipher
                    .decrypt(Nonce::from_slice(nonce.as_bytes()), ciphertext)
                    .map_err(|_| CoreError::Unauthenticated)
            }
        }
    }

    fn apply_keystream(&self, data: &[u8], nonce: &RecordNonce) -> Vec<u8> {
        let mut buf = data.to_vec();
        let mut cipher = ChaCha20::new(&self.bytes.into(), &(*nonce.as_bytes()).into());
        cipher.apply_keystream(&mut buf);
        buf
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Fingerprint only; key bytes never reach logs.
        let fingerprint = blake3::hash(&self.bytes);
        write!(
            f,
            "SymmetricKey({:?}, {})",
            self.kind,
            hex::encode(&fingerprint.as_bytes()[..4])
        )
    }
}
