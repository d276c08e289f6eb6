//! Type definitions and wrappers for secure data handling
//!
//! This module provides type-safe wrappers for sensitive data using the
//! secrecy crate to prevent accidental exposure in logs or debug output.

use crate::error::ConfigError;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of digits in an issued verification code
pub const CODE_DIGITS: u32 = 6;

/// Store key prefix for pending credentials
pub const CREDENTIAL_KEY_PREFIX: &str = "otp";

/// Store key prefix for failed-attempt counters
pub const ATTEMPTS_KEY_PREFIX: &str = "otp-attempts";

/// Identifier of the principal a code is issued for (a user id)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(u64);

impl SubjectId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw value, also used as the HOTP counter
    pub fn get(&self) -> u64 {
        self.0
    }

    /// Key under which the pending credential is stored
    pub fn credential_key(&self) -> String {
        format!("{}:{}", CREDENTIAL_KEY_PREFIX, self.0)
    }

    /// Key under which failed verification attempts are counted
    pub fn attempts_key(&self) -> String {
        format!("{}:{}", ATTEMPTS_KEY_PREFIX, self.0)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SubjectId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

/// Process-wide signing key, the root secret of code issuance
///
/// Never logged and never derivable from issued codes. An empty or
/// whitespace-only key is rejected so the service cannot start with a
/// predictable secret.
#[derive(Clone, Debug)]
pub struct SigningKey(Secret<String>);

impl SigningKey {
    pub fn new(key: String) -> Result<Self, ConfigError> {
        if key.trim().is_empty() {
            return Err(ConfigError::MisconfiguredSigningKey);
        }
        Ok(Self(Secret::new(key)))
    }

    /// Expose the key value (use with caution!)
    ///
    /// Only secret derivation should ever need this.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl TryFrom<String> for SigningKey {
    type Error = ConfigError;

    fn try_from(key: String) -> Result<Self, Self::Error> {
        Self::new(key)
    }
}

/// Per-issuance secret, Base32 encoded
///
/// Exists only for the duration of one `issue` call.
#[derive(Clone, Debug)]
pub struct DerivedSecret(Secret<String>);

impl DerivedSecret {
    pub fn new(secret: String) -> Self {
        Self(Secret::new(secret))
    }

    /// Expose the secret value (use with caution!)
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

/// Wrapper for a plaintext verification code
///
/// Codes are delivered out of band and must never be logged, even though
/// they have a short lifetime.
#[derive(Clone, Debug)]
pub struct OtpCode(Secret<String>);

impl OtpCode {
    pub fn new(code: String) -> Self {
        Self(Secret::new(code))
    }

    /// Expose the code value (use with caution!)
    ///
    /// This should only be called when hashing the code or handing it to
    /// the mailer.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// True when the code is exactly [`CODE_DIGITS`] ASCII digits
    pub fn is_well_formed(&self) -> bool {
        let code = self.expose();
        code.len() == CODE_DIGITS as usize && code.chars().all(|c| c.is_ascii_digit())
    }
}

impl From<String> for OtpCode {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl From<&str> for OtpCode {
    fn from(code: &str) -> Self {
        Self::new(code.to_string())
    }
}
