//! Error types for the sealing subsystem.
//!
//! Per-node key-fetch failures are reported through [`KeyFetchError`] and never
//! abort an aggregate fetch on their own. Everything else surfaces as a
//! [`CryptoError`] to the immediate caller.
use thiserror::Error;

/// Failures raised by the codec, key import, envelope, and multi-recipient layers.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("malformed base64 input: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("failed to import recipient key: {0}")]
    KeyImport(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Authentication failure, wrong key, or a malformed envelope. Deliberately
    /// carries no detail.
    #[error("decryption failed")]
    Decryption,

    #[error("malformed recipient public key: {0}")]
    KeyParse(String),

    #[error("failed to fetch any enterprise node PGP keys ({attempted} nodes attempted)")]
    NoKeysAvailable { attempted: usize },

    #[error("symmetric key must be {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
}

/// Failure of the transport collaborator for a single request.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),
}

/// Why a single node did not contribute a key.
#[derive(Debug, Error)]
pub enum KeyFetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("node reported status '{status}': {detail}")]
    Status { status: String, detail: String },

    #[error("malformed key response: {0}")]
    Malformed(String),
}

pub type Result<T, E = CryptoError> = std::result::Result<T, E>;
