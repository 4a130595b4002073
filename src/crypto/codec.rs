//! Byte-exact conversions between Base64 text and raw bytes.
//!
//! Decoding is forgiving in the same places a browser's `atob` is: ASCII
//! whitespace is ignored and trailing padding is optional. Anything outside the
//! standard alphabet is rejected.
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::prelude::*;

use crate::error::Result;

const FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes Base64 text into the exact byte sequence it represents.
///
/// # Errors
///
/// Returns [`CryptoError::Decode`](crate::error::CryptoError::Decode) if the
/// input contains characters outside the standard alphabet or has an
/// impossible length.
pub fn decode_base64(text: &str) -> Result<Vec<u8>> {
    let compact: String = text
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    Ok(FORGIVING.decode(compact)?)
}

/// Encodes bytes as padded standard Base64. Output is pure ASCII.
pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64_STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CryptoError;

    #[test]
    fn arbitrary_binary_survives_encoding() {
        let bytes: Vec<u8> = (0..=255u8).rev().collect();
        let encoded = encode_base64(&bytes);

        assert!(encoded.is_ascii());
        assert_eq!(decode_base64(&encoded).unwrap(), bytes);
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert_eq!(encode_base64(&[]), "");
        assert!(decode_base64("").unwrap().is_empty());
    }

    #[test]
    fn tolerates_whitespace_and_missing_padding() {
        assert_eq!(decode_base64("aGVs\nbG8=").unwrap(), b"hello");
        assert_eq!(decode_base64("aGVsbG8").unwrap(), b"hello");
    }

    #[test]
    fn rejects_characters_outside_the_alphabet() {
        let err = decode_base64("not*base64!").unwrap_err();
        assert!(matches!(err, CryptoError::Decode(_)));
    }

    #[test]
    fn rejects_url_safe_alphabet() {
        assert!(decode_base64("-_-_").is_err());
    }
}
