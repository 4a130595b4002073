//! Multi-recipient OpenPGP encryption.
//!
//! The produced message carries one session-key packet per recipient, so the
//! holder of any single matching private key can decrypt it.
use pgp::crypto::hash::HashAlgorithm;
use pgp::crypto::public_key::PublicKeyAlgorithm;
use pgp::crypto::sym::SymmetricKeyAlgorithm;
use pgp::types::{
    EskType, Fingerprint, KeyId, KeyVersion, PkeskBytes, PublicKeyTrait, PublicParams,
    SignatureBytes,
};
use pgp::{ArmorOptions, Deserializable, Message, SignedPublicKey, SignedPublicSubKey};
use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use std::{fmt, io};
use tracing::{debug, error, warn};

use crate::error::{CryptoError, Result};

/// An ASCII-armored OpenPGP public key as served by an enterprise node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArmoredPublicKey(String);

impl ArmoredPublicKey {
    pub fn new(armored: impl Into<String>) -> Self {
        Self(armored.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ArmoredPublicKey {
    fn from(armored: String) -> Self {
        Self(armored)
    }
}

impl fmt::Display for ArmoredPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What to do with a recipient key that fails to parse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyParsePolicy {
    /// Fail the whole encryption.
    #[default]
    Abort,
    /// Drop the key and encrypt for the rest; fails only if none remain.
    Skip,
}

/// The key a session-key packet is addressed to: an encryption subkey, or the
/// primary key itself when it can encrypt and carries no such subkey.
#[derive(Clone, Debug)]
enum EncryptionKey {
    Primary(SignedPublicKey),
    Subkey(SignedPublicSubKey),
}

macro_rules! delegate {
    ($self:ident, $key:ident => $call:expr) => {
        match $self {
            EncryptionKey::Primary($key) => $call,
            EncryptionKey::Subkey($key) => $call,
        }
    };
}

impl PublicKeyTrait for EncryptionKey {
    fn version(&self) -> KeyVersion {
        delegate!(self, key => key.version())
    }

    fn fingerprint(&self) -> Fingerprint {
        delegate!(self, key => key.fingerprint())
    }

    fn key_id(&self) -> KeyId {
        delegate!(self, key => key.key_id())
    }

    fn algorithm(&self) -> PublicKeyAlgorithm {
        delegate!(self, key => key.algorithm())
    }

    fn created_at(&self) -> &chrono::DateTime<chrono::Utc> {
        delegate!(self, key => key.created_at())
    }

    fn expiration(&self) -> Option<u16> {
        delegate!(self, key => key.expiration())
    }

    fn verify_signature(
        &self,
        hash: HashAlgorithm,
        data: &[u8],
        sig: &SignatureBytes,
    ) -> pgp::errors::Result<()> {
        delegate!(self, key => key.verify_signature(hash, data, sig))
    }

    fn encrypt<R: CryptoRng + Rng>(
        &self,
        rng: R,
        plain: &[u8],
        typ: EskType,
    ) -> pgp::errors::Result<PkeskBytes> {
        delegate!(self, key => key.encrypt(rng, plain, typ))
    }

    fn serialize_for_hashing(&self, writer: &mut impl io::Write) -> pgp::errors::Result<()> {
        delegate!(self, key => key.serialize_for_hashing(writer))
    }

    fn public_params(&self) -> &PublicParams {
        delegate!(self, key => key.public_params())
    }
}

/// Parses an armored key and returns the keys to encrypt to.
///
/// Encryption-capable subkeys are preferred. A key without any falls back to
/// its primary, provided the primary's algorithm can encrypt.
fn parse_encryption_keys(armored: &ArmoredPublicKey) -> Result<Vec<EncryptionKey>> {
    let (key, _headers) = SignedPublicKey::from_string(armored.as_str())
        .map_err(|e| CryptoError::KeyParse(e.to_string()))?;

    let subkeys: Vec<EncryptionKey> = key
        .public_subkeys
        .iter()
        .filter(|subkey| subkey.is_encryption_key())
        .cloned()
        .map(EncryptionKey::Subkey)
        .collect();

    if !subkeys.is_empty() {
        return Ok(subkeys);
    }

    if key.is_encryption_key() {
        debug!("No encryption subkey, using primary key {:?}", key.key_id());
        return Ok(vec![EncryptionKey::Primary(key)]);
    }

    Err(CryptoError::KeyParse(
        "key has neither an encryption-capable subkey nor an encryption-capable primary"
            .to_string(),
    ))
}

/// Encrypts `plaintext` so that any one of `recipients` can decrypt it.
///
/// Equivalent to [`encrypt_for_recipients_with`] using [`KeyParsePolicy::Abort`].
pub fn encrypt_for_recipients(plaintext: &str, recipients: &[ArmoredPublicKey]) -> Result<String> {
    encrypt_for_recipients_with(plaintext, recipients, KeyParsePolicy::Abort)
}

/// Encrypts `plaintext` for every usable key in `recipients` and returns the
/// armored message.
///
/// # Errors
///
/// Returns [`CryptoError::KeyParse`] if a key is malformed (under
/// [`KeyParsePolicy::Abort`]) or if no usable key remains, and
/// [`CryptoError::Encryption`] if the OpenPGP operation fails.
pub fn encrypt_for_recipients_with(
    plaintext: &str,
    recipients: &[ArmoredPublicKey],
    policy: KeyParsePolicy,
) -> Result<String> {
    let mut encryption_keys = Vec::new();

    for (index, armored) in recipients.iter().enumerate() {
        match parse_encryption_keys(armored) {
            Ok(keys) => encryption_keys.extend(keys),
            Err(e) if policy == KeyParsePolicy::Skip => {
                warn!("Skipping recipient key #{}: {}", index, e);
            }
            Err(e) => {
                error!("PGP encryption error: recipient key #{}: {}", index, e);
                return Err(e);
            }
        }
    }

    if encryption_keys.is_empty() {
        return Err(CryptoError::KeyParse(
            "no usable recipient keys".to_string(),
        ));
    }

    let key_refs: Vec<&EncryptionKey> = encryption_keys.iter().collect();
    let message = Message::new_literal("", plaintext);

    let encrypted = message
        .encrypt_to_keys_seipdv1(
            &mut rand::thread_rng(),
            SymmetricKeyAlgorithm::AES256,
            &key_refs[..],
        )
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let armored = encrypted
        .to_armored_string(ArmorOptions::default())
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    debug!(
        "Encrypted message for {} recipient key(s)",
        key_refs.len()
    );
    Ok(armored)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pgp::composed::{KeyType, SecretKeyParamsBuilder, SignedSecretKey, SubkeyParamsBuilder};
    use pgp::crypto::ecc_curve::ECCCurve;
    use pgp::types::{CompressionAlgorithm, SecretKeyTrait};
    use smallvec::smallvec;

    /// Generates a fresh node keypair: P-256 ECDSA primary with a Curve25519 ECDH
    /// encryption subkey.
    pub(crate) fn node_keypair(user_id: &str) -> (SignedSecretKey, ArmoredPublicKey) {
        let mut rng = rand::thread_rng();

        let params = SecretKeyParamsBuilder::default()
            .key_type(KeyType::ECDSA(ECCCurve::P256))
            .can_certify(true)
            .can_sign(true)
            .primary_user_id(user_id.into())
            .preferred_symmetric_algorithms(smallvec![SymmetricKeyAlgorithm::AES256])
            .preferred_hash_algorithms(smallvec![HashAlgorithm::SHA2_256])
            .preferred_compression_algorithms(smallvec![CompressionAlgorithm::ZLIB])
            .subkey(
                SubkeyParamsBuilder::default()
                    .key_type(KeyType::ECDH(ECCCurve::Curve25519))
                    .can_encrypt(true)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();

        let secret = params.generate(&mut rng).unwrap();
        let signed_secret = secret.sign(&mut rng, String::new).unwrap();
        let signed_public = signed_secret
            .public_key()
            .sign(&mut rng, &signed_secret, String::new)
            .unwrap();
        let armored = signed_public
            .to_armored_string(ArmorOptions::default())
            .unwrap();

        (signed_secret, ArmoredPublicKey::new(armored))
    }

    /// Generates an RSA keypair whose primary both signs and encrypts, with no
    /// subkeys at all.
    fn primary_only_keypair(user_id: &str) -> (SignedSecretKey, ArmoredPublicKey) {
        let mut rng = rand::thread_rng();

        let params = SecretKeyParamsBuilder::default()
            .key_type(KeyType::Rsa(2048))
            .can_certify(true)
            .can_sign(true)
            .can_encrypt(true)
            .primary_user_id(user_id.into())
            .preferred_symmetric_algorithms(smallvec![SymmetricKeyAlgorithm::AES256])
            .preferred_hash_algorithms(smallvec![HashAlgorithm::SHA2_256])
            .build()
            .unwrap();

        let signed_secret = params
            .generate(&mut rng)
            .unwrap()
            .sign(&mut rng, String::new)
            .unwrap();
        let signed_public = signed_secret
            .public_key()
            .sign(&mut rng, &signed_secret, String::new)
            .unwrap();
        assert!(signed_public.public_subkeys.is_empty());

        let armored = signed_public
            .to_armored_string(ArmorOptions::default())
            .unwrap();
        (signed_secret, ArmoredPublicKey::new(armored))
    }

    pub(crate) fn decrypt_with(armored_message: &str, key: &SignedSecretKey) -> Result<String, pgp::errors::Error> {
        let (message, _headers) = Message::from_string(armored_message)?;
        let (decrypted, _key_ids) = message.decrypt(String::new, &[key])?;
        let content = decrypted.get_content()?.unwrap_or_default();
        Ok(String::from_utf8(content).expect("utf-8 plaintext"))
    }

    #[test]
    fn each_recipient_decrypts_independently() {
        let (secret_a, public_a) = node_keypair("Node A <a@nodes.example>");
        let (secret_b, public_b) = node_keypair("Node B <b@nodes.example>");

        let ciphertext =
            encrypt_for_recipients("enterprise secret", &[public_a, public_b]).unwrap();
        assert!(ciphertext.starts_with("-----BEGIN PGP MESSAGE-----"));

        assert_eq!(decrypt_with(&ciphertext, &secret_a).unwrap(), "enterprise secret");
        assert_eq!(decrypt_with(&ciphertext, &secret_b).unwrap(), "enterprise secret");
    }

    #[test]
    fn outsider_cannot_decrypt() {
        let (_, public_a) = node_keypair("Node A <a@nodes.example>");
        let (outsider, _) = node_keypair("Outsider <x@nodes.example>");

        let ciphertext = encrypt_for_recipients("not for you", &[public_a]).unwrap();
        assert!(decrypt_with(&ciphertext, &outsider).is_err());
    }

    #[test]
    fn malformed_key_aborts_by_default() {
        let (_, public_a) = node_keypair("Node A <a@nodes.example>");
        let bogus = ArmoredPublicKey::new("-----BEGIN PGP PUBLIC KEY BLOCK-----\n\ngarbage\n");

        let err = encrypt_for_recipients("payload", &[public_a, bogus]).unwrap_err();
        assert!(matches!(err, CryptoError::KeyParse(_)));
    }

    #[test]
    fn skip_policy_drops_malformed_keys() {
        let (secret_a, public_a) = node_keypair("Node A <a@nodes.example>");
        let bogus = ArmoredPublicKey::new("not a key");

        let ciphertext = encrypt_for_recipients_with(
            "payload",
            &[bogus, public_a],
            KeyParsePolicy::Skip,
        )
        .unwrap();
        assert_eq!(decrypt_with(&ciphertext, &secret_a).unwrap(), "payload");
    }

    #[test]
    fn skip_policy_still_fails_without_any_usable_key() {
        let err = encrypt_for_recipients_with(
            "payload",
            &[ArmoredPublicKey::new("nope")],
            KeyParsePolicy::Skip,
        )
        .unwrap_err();
        assert!(matches!(err, CryptoError::KeyParse(_)));
    }

    #[test]
    fn primary_only_rsa_key_is_encrypted_to_directly() {
        let (legacy_secret, legacy_public) = primary_only_keypair("Legacy <legacy@nodes.example>");
        let (secret_a, public_a) = node_keypair("Node A <a@nodes.example>");

        let ciphertext =
            encrypt_for_recipients("to both kinds", &[legacy_public, public_a]).unwrap();

        assert_eq!(decrypt_with(&ciphertext, &legacy_secret).unwrap(), "to both kinds");
        assert_eq!(decrypt_with(&ciphertext, &secret_a).unwrap(), "to both kinds");
    }

    #[test]
    fn signing_only_key_is_a_parse_error() {
        let mut rng = rand::thread_rng();
        let signed_secret = SecretKeyParamsBuilder::default()
            .key_type(KeyType::ECDSA(ECCCurve::P256))
            .can_certify(true)
            .can_sign(true)
            .primary_user_id("Signer <s@nodes.example>".into())
            .build()
            .unwrap()
            .generate(&mut rng)
            .unwrap()
            .sign(&mut rng, String::new)
            .unwrap();
        let armored = signed_secret
            .public_key()
            .sign(&mut rng, &signed_secret, String::new)
            .unwrap()
            .to_armored_string(ArmorOptions::default())
            .unwrap();

        let err = encrypt_for_recipients("payload", &[ArmoredPublicKey::new(armored)]).unwrap_err();
        assert!(matches!(err, CryptoError::KeyParse(_)));
    }

    #[test]
    fn empty_recipient_list_is_rejected() {
        assert!(encrypt_for_recipients("payload", &[]).is_err());
    }
}
