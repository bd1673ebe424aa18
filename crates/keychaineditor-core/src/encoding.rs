//! Decoding of user-supplied item data.

use base64::Engine;
use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};

/// Standard alphabet, padded, tolerant of non-zero trailing bits.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Interpret `input` as base64 when that yields UTF-8 text.
///
/// Characters outside the base64 alphabet are skipped before decoding, so
/// input made only of such characters decodes to the empty string. If the
/// remainder is not valid base64, or the result is not UTF-8, `input` is
/// returned as-is.
pub fn decode_if_base64(input: &str) -> String {
    let filtered: String = input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
        .collect();

    match LENIENT.decode(filtered.as_bytes()) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => {
                tracing::debug!("item data was base64 encoded");
                text
            }
            Err(_) => input.to_string(),
        },
        Err(_) => input.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_base64_text() {
        assert_eq!(decode_if_base64("aGVsbG8="), "hello");
        assert_eq!(decode_if_base64("c2VjcmV0IHZhbHVl"), "secret value");
    }

    #[test]
    fn ignores_unknown_characters() {
        assert_eq!(decode_if_base64("aGVs\nbG8="), "hello");
        assert_eq!(decode_if_base64("aGVs bG8="), "hello");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(decode_if_base64("secret"), "secret");
        assert_eq!(decode_if_base64("hello world!"), "hello world!");
        assert_eq!(decode_if_base64(""), "");
    }

    #[test]
    fn only_unknown_characters_decode_to_empty() {
        assert_eq!(decode_if_base64("!!!!"), "");
        assert_eq!(decode_if_base64(" \n\t"), "");
    }

    #[test]
    fn non_canonical_trailing_bits_are_accepted() {
        // "YR==" carries set padding bits; the canonical form is "YQ==".
        assert_eq!(decode_if_base64("YR=="), "a");
    }

    #[test]
    fn non_utf8_payload_passes_through() {
        // "/w==" decodes to the single byte 0xff.
        assert_eq!(decode_if_base64("/w=="), "/w==");
    }
}
