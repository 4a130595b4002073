//! Import of recipient RSA keys and wrapping of symmetric keys under them.
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPublicKey};
use sha2::Sha256;
use tracing::debug;

use super::codec::decode_base64;
use crate::error::{CryptoError, Result};

/// Size of a SHA-256 digest, which bounds the OAEP padding overhead.
const OAEP_HASH_LEN: usize = 32;

/// An RSA public key restricted to wrapping (RSA-OAEP with SHA-256).
///
/// Only wrapping is exposed; the client never unwraps. One handle can wrap any
/// number of keys.
#[derive(Clone, Debug)]
pub struct RecipientKey {
    inner: RsaPublicKey,
}

impl RecipientKey {
    /// Length in bytes of every wrapped key produced by this recipient.
    ///
    /// This equals the modulus size and is the boundary a receiver uses to
    /// split the wrapped key from the rest of an envelope.
    pub fn wrapped_key_len(&self) -> usize {
        self.inner.size()
    }

    /// Largest payload OAEP can wrap under this key.
    pub fn max_wrap_len(&self) -> usize {
        self.wrapped_key_len().saturating_sub(2 * OAEP_HASH_LEN + 2)
    }

    /// Encrypts `key_bytes` under this recipient with RSA-OAEP/SHA-256.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Encryption`] if `key_bytes` is longer than
    /// [`max_wrap_len`](Self::max_wrap_len) or the RSA operation fails.
    pub fn wrap(&self, key_bytes: &[u8]) -> Result<Vec<u8>> {
        let max = self.max_wrap_len();
        if key_bytes.len() > max {
            return Err(CryptoError::Encryption(format!(
                "key of {} bytes exceeds the {} byte OAEP limit for this recipient",
                key_bytes.len(),
                max
            )));
        }

        self.inner
            .encrypt(&mut rand::rngs::OsRng, Oaep::new::<Sha256>(), key_bytes)
            .map_err(|e| CryptoError::Encryption(e.to_string()))
    }
}

/// Imports a Base64 encoded SPKI (DER) RSA public key.
///
/// # Errors
///
/// Returns [`CryptoError::Decode`] for invalid Base64 and
/// [`CryptoError::KeyImport`] if the bytes are not an SPKI RSA key.
pub fn import_recipient_key(base64_spki: &str) -> Result<RecipientKey> {
    let der = decode_base64(base64_spki)?;
    let inner = RsaPublicKey::from_public_key_der(&der)
        .map_err(|e| CryptoError::KeyImport(e.to_string()))?;

    debug!("Imported RSA recipient key ({} bit)", inner.size() * 8);
    Ok(RecipientKey { inner })
}

/// Wraps a raw symmetric key for `recipient`.
///
/// # Errors
///
/// See [`RecipientKey::wrap`].
pub fn wrap_symmetric_key(symmetric_key: &[u8], recipient: &RecipientKey) -> Result<Vec<u8>> {
    recipient.wrap(symmetric_key)
}
