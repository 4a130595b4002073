use serde::{Deserialize, Serialize};

use crate::crypto::{import_recipient_key, ArmoredPublicKey, RecipientKey};
use crate::error::Result;

/// A candidate recipient node. `ip` may carry an explicit port (`host:port`).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NodeDescriptor {
    pub ip: String,
}

impl NodeDescriptor {
    pub fn new(ip: impl Into<String>) -> Self {
        Self { ip: ip.into() }
    }
}

/// Body returned by a node's `/flux/pgp` endpoint.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct KeyEndpointResponse {
    pub status: String,
    /// The armored key on success, error detail otherwise.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl KeyEndpointResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Recipient-supplied key material, as held before import.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum PublicKeyMaterial {
    /// Base64 of a DER SPKI RSA key, used for envelope key wrapping.
    RsaOaepSpki(String),
    /// ASCII-armored OpenPGP key, used for multi-recipient encryption.
    PgpArmored(ArmoredPublicKey),
}

impl PublicKeyMaterial {
    /// Imports the RSA variant. PGP material is rejected as a key import error.
    pub fn import_rsa(&self) -> Result<RecipientKey> {
        match self {
            Self::RsaOaepSpki(spki) => import_recipient_key(spki),
            Self::PgpArmored(_) => Err(crate::error::CryptoError::KeyImport(
                "expected an RSA SPKI key, got an OpenPGP key".to_string(),
            )),
        }
    }
}
