//! Sealed record layout.
//!
//! Every block written by SealGraph carries a CRC32 of its plaintext:
//!
//! ```text
//! encrypted:    cipher(plaintext || crc32_le(plaintext), key, nonce = position)
//! unencrypted:  plaintext || crc32_le(plaintext)
//! ```
//!
//! The checksum is what tells a right key from a wrong one. The stream cipher
//! happily "decrypts" under any key, so a mismatch after decryption means the
//! key was wrong (or the block was tampered with).

use crate::crypto::{RecordNonce, SymmetricKey};
use crate::error::{CoreError, Result};

/// Width of the trailing checksum in bytes.
pub const CHECKSUM_LEN: usize = 4;

/// CRC32 of `data`, little-endian.
pub fn checksum(data: &[u8]) -> [u8; CHECKSUM_LEN] {
    crc32fast::hash(data).to_le_bytes()
}

/// Append the checksum to `plaintext`.
pub fn frame(plaintext: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(plaintext.len() + CHECKSUM_LEN);
    buf.extend_from_slice(plaintext);
    buf.extend_from_slice(&checksum(plaintext));
    buf
}

/// Verify and strip the trailing checksum.
pub fn unframe(framed: &[u8]) -> Result<&[u8]> {
    if framed.len() < CHECKSUM_LEN {
        return Err(CoreError::TruncatedRecord { len: framed.len() });
    }
    let (plaintext, tail) = framed.split_at(framed.len() - CHECKSUM_LEN);

    let mut stored = [0u8; CHECKSUM_LEN];
    stored.copy_from_slice(tail);
    let stored = u32::from_le_bytes(stored);
    let computed = crc32fast::hash(plaintext);

    if stored != computed {
        return Err(CoreError::ChecksumMismatch { stored, computed });
    }
    Ok(plaintext)
}

/// Produce the on-disk bytes for `plaintext` at `position`.
pub fn seal_record(plaintext: &[u8], key: Option<&SymmetricKey>, position: u64) -> Result<Vec<u8>> {
    let framed = frame(plaintext);
    match key {
        Some(key) => key.encrypt(&framed, &RecordNonce::from_position(position)),
        None => Ok(framed),
    }
}

/// Recover the plaintext of a stored record at `position`.
///
/// Errors:
/// - [`CoreError::TruncatedRecord`] if the bytes cannot hold a checksum
/// - [`CoreError::Unauthenticated`] if an AEAD key rejects the record
/// - [`CoreError::ChecksumMismatch`] if the checksum does not match
pub fn open_record(record: &[u8], key: Option<&SymmetricKey>, position: u64) -> Result<Vec<u8>> {
    match key {
        Some(key) => {
            let framed = key.decrypt(record, &RecordNonce::from_position(position))?;
            unframe(&framed).map(<[u8]>::to_vec)
        }
        None => unframe(record).map(<[u8]>::to_vec),
    }
}
