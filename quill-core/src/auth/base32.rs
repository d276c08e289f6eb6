//! Base32 encoding of derived secrets
//!
//! Derived secrets travel as padded RFC 4648 Base32 text and are decoded
//! back to raw bytes before keying HMAC.

use crate::error::OtpError;
use data_encoding::BASE32;

/// Encode bytes as padded, upper-case RFC 4648 Base32
pub fn encode_base32(input: &[u8]) -> String {
    BASE32.encode(input)
}

/// Decode Base32 produced by [`encode_base32`]
pub fn decode_base32(input: &str) -> Result<Vec<u8>, OtpError> {
    BASE32
        .decode(input.as_bytes())
        .map_err(|_| OtpError::InvalidBase32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_known_value() {
        assert_eq!(encode_base32(b"foobar"), "MZXW6YTBOI======");
        assert_eq!(encode_base32(b""), "");
    }

    #[test]
    fn test_decode_known_value() {
        assert_eq!(decode_base32("MZXW6YTBOI======").unwrap(), b"foobar");
    }

    #[test]
    fn test_decode_is_strict() {
        // Only canonical encoder output is accepted
        assert_eq!(decode_base32("MZXW6YTBOI").unwrap_err(), OtpError::InvalidBase32);
        assert_eq!(decode_base32("mzxw6ytboi======").unwrap_err(), OtpError::InvalidBase32);
        assert_eq!(decode_base32("INVALID@CHARS!").unwrap_err(), OtpError::InvalidBase32);
    }
}
