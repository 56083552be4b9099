// src/codec.rs

//! Base64url helpers for JWT segments and JWK components.
//!
//! JWT encoders omit the trailing `=` padding, so input is re-padded to a
//! multiple of four before decoding with the URL-safe alphabet.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD};
use base64::engine::{DecodePaddingMode, Engine};
use base64::DecodeError;

const PADDED_URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::RequireCanonical)
        .with_decode_allow_trailing_bits(true),
);

/// Decodes a base64url string whose `=` padding may be missing.
pub fn decode(data: impl AsRef<[u8]>) -> Result<Vec<u8>, DecodeError> {
    PADDED_URL_SAFE.decode(pad(data.as_ref()))
}

/// Encodes bytes as unpadded base64url, the form used on the wire.
pub fn encode(data: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

fn pad(data: &[u8]) -> Vec<u8> {
    let mut padded = data.to_vec();
    let remainder = padded.len() % 4;
    if remainder > 0 {
        padded.resize(padded.len() + (4 - remainder), b'=');
    }
    padded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_with_any_amount_of_missing_padding() {
        for input in [&b""[..], b"f", b"fo", b"foo", b"foob", b"fooba", b"foobar"] {
            let unpadded = encode(input);
            assert_eq!(decode(&unpadded).unwrap(), input);

            let padded = base64::engine::general_purpose::URL_SAFE.encode(input);
            assert_eq!(decode(&padded).unwrap(), input);
        }
    }

    #[test]
    fn uses_url_safe_alphabet() {
        assert_eq!(decode("-_8").unwrap(), vec![0xfb, 0xff]);
        assert!(decode("+/8").is_err());
    }

    #[test]
    fn rejects_impossible_length() {
        assert!(decode("abcde").is_err());
    }

    #[test]
    fn rejects_characters_outside_alphabet() {
        assert!(decode("ab$d").is_err());
        assert!(decode("ab.d").is_err());
    }

    #[test]
    fn tolerates_trailing_bits() {
        // "QR" carries one byte plus four non-zero trailing bits.
        assert_eq!(decode("QR").unwrap(), vec![0x41]);
    }
}
