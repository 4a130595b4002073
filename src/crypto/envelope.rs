//! Hybrid envelope encryption.
//!
//! An envelope is the Base64 encoding of
//!
//! ```text
//! [wrapped key (RSA modulus size)][12 bytes nonce][ciphertext][16 bytes GCM tag]
//! ```
//!
//! There are no length prefixes. A receiver must know the wrapped-key length
//! (the recipient's modulus size) to split the envelope; see
//! [`split_envelope`].
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use std::fmt;
use zeroize::Zeroize;

use super::codec::{decode_base64, encode_base64};
use crate::error::{CryptoError, Result};

/// Size of the AES-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the AES-GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Size of an AES-256 key in bytes.
pub const SYMMETRIC_KEY_LEN: usize = 32;

/// A caller-supplied AES-256 key. Zeroized on drop and never printed.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: [u8; SYMMETRIC_KEY_LEN],
}

impl SymmetricKey {
    /// Wraps existing key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] unless `bytes` is exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; SYMMETRIC_KEY_LEN] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: SYMMETRIC_KEY_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self { bytes })
    }

    /// Decodes a Base64 encoded key.
    pub fn from_base64(text: &str) -> Result<Self> {
        let mut raw = decode_base64(text)?;
        let key = Self::from_bytes(&raw);
        raw.zeroize();
        key
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.bytes))
    }
}

impl AsRef<[u8]> for SymmetricKey {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

/// The three segments of a decoded envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeParts {
    pub wrapped_key: Vec<u8>,
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext with the GCM tag appended.
    pub ciphertext: Vec<u8>,
}

impl EnvelopeParts {
    /// Base64 of `nonce ‖ ciphertext`, the form [`decrypt_envelope`] consumes.
    pub fn remainder_base64(&self) -> String {
        let mut remainder = Vec::with_capacity(NONCE_LEN + self.ciphertext.len());
        remainder.extend_from_slice(&self.nonce);
        remainder.extend_from_slice(&self.ciphertext);
        encode_base64(&remainder)
    }
}

/// Encrypts `plaintext` under `key` and frames it behind `wrapped_key`.
///
/// A fresh random nonce is drawn on every call, so two envelopes for the same
/// input never match. Compare decrypted plaintext, not envelope bytes.
///
/// # Errors
///
/// Returns [`CryptoError::Encryption`] if the AEAD operation fails.
pub fn encrypt_envelope(plaintext: &str, key: &SymmetricKey, wrapped_key: &[u8]) -> Result<String> {
    let nonce = Aes256Gcm::generate_nonce(&mut rand::rngs::OsRng);

    let ciphertext = key
        .cipher()
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let mut envelope = Vec::with_capacity(wrapped_key.len() + NONCE_LEN + ciphertext.len());
    envelope.extend_from_slice(wrapped_key);
    envelope.extend_from_slice(&nonce);
    envelope.extend_from_slice(&ciphertext);

    Ok(encode_base64(&envelope))
}

/// Decrypts an envelope whose wrapped-key segment has already been removed.
///
/// `remainder` is the Base64 of `nonce ‖ ciphertext ‖ tag`.
///
/// # Errors
///
/// Any failure, whether malformed Base64, a truncated input, a tag mismatch,
/// the wrong key, or non UTF-8 plaintext, is reported as
/// [`CryptoError::Decryption`].
pub fn decrypt_envelope(remainder: &str, key: &SymmetricKey) -> Result<String> {
    let bytes = decode_base64(remainder).map_err(|_| CryptoError::Decryption)?;
    if bytes.len() < NONCE_LEN + TAG_LEN {
        return Err(CryptoError::Decryption);
    }

    let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
    let plaintext = key
        .cipher()
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::Decryption)?;

    String::from_utf8(plaintext).map_err(|_| CryptoError::Decryption)
}

/// Splits a full envelope using the recipient's known wrapped-key length.
///
/// # Errors
///
/// Returns [`CryptoError::Decryption`] if the input is not Base64 or is too
/// short to hold the wrapped key, a nonce, and a tag.
pub fn split_envelope(envelope: &str, wrapped_key_len: usize) -> Result<EnvelopeParts> {
    let bytes = decode_base64(envelope).map_err(|_| CryptoError::Decryption)?;
    if bytes.len() < wrapped_key_len.saturating_add(NONCE_LEN + TAG_LEN) {
        return Err(CryptoError::Decryption);
    }

    let (wrapped_key, rest) = bytes.split_at(wrapped_key_len);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes.copy_from_slice(nonce);

    Ok(EnvelopeParts {
        wrapped_key: wrapped_key.to_vec(),
        nonce: nonce_bytes,
        ciphertext: ciphertext.to_vec(),
    })
}
