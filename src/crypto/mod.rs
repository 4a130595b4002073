pub mod codec;
pub mod envelope;
pub mod multi_recipient;
pub mod recipient;

pub use codec::{decode_base64, encode_base64};
pub use envelope::{
    decrypt_envelope, encrypt_envelope, split_envelope, EnvelopeParts, SymmetricKey,
};
pub use multi_recipient::{encrypt_for_recipients, encrypt_for_recipients_with, ArmoredPublicKey, KeyParsePolicy};
pub use recipient::{import_recipient_key, wrap_symmetric_key, RecipientKey};
