//! HOTP (HMAC-based One-Time Password) generation
//!
//! Implements RFC 4226 with HMAC-SHA1. The subject id is used as
//! the counter; freshness across issuances comes from re-deriving the key,
//! not from incrementing the counter.

use crate::auth::base32::decode_base32;
use crate::error::OtpError;
use crate::types::{DerivedSecret, OtpCode, SubjectId, CODE_DIGITS};
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Compute the raw HOTP value for `key` and `counter`
///
/// Dynamic truncation per RFC 4226 section 5.3, reduced modulo 10^digits
/// and zero padded.
pub fn hotp(key: &[u8], counter: u64, digits: u32) -> Result<String, OtpError> {
    let mut mac = HmacSha1::new_from_slice(key).map_err(|_| OtpError::InvalidKeyLength)?;
    mac.update(&counter.to_be_bytes());
    let tag = mac.finalize().into_bytes();

    let offset = (tag[tag.len() - 1] & 0x0f) as usize;
    let binary = u32::from_be_bytes([
        tag[offset] & 0x7f,
        tag[offset + 1],
        tag[offset + 2],
        tag[offset + 3],
    ]);

    let modulus = 10u64.pow(digits);
    Ok(format!(
        "{:0width$}",
        u64::from(binary) % modulus,
        width = digits as usize
    ))
}

/// Generate the verification code for `subject` from a derived secret
pub fn generate_code(secret: &DerivedSecret, subject: SubjectId) -> Result<OtpCode, OtpError> {
    let key = decode_base32(secret.expose())?;
    Ok(OtpCode::new(hotp(&key, subject.get(), CODE_DIGITS)?))
}
