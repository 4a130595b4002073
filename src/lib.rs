//! Hybrid and multi-recipient encryption for payloads addressed to enterprise
//! nodes.
//!
//! - [`crypto`] holds the codec, RSA-OAEP key import, the AES-GCM envelope, and
//!   the OpenPGP multi-recipient primitive.
//! - [`recipients`] fetches node keys over a [`net::Transport`] and tolerates
//!   individual node failures.
pub mod crypto;
pub mod error;
pub mod net;
pub mod recipients;
pub mod types;

pub use error::{CryptoError, KeyFetchError, TransportError};
pub use recipients::EnterpriseSealer;
pub use types::{NodeDescriptor, PublicKeyMaterial};
