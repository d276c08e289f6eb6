//! Per-issuance secret derivation
//!
//! Every issued code is keyed by a fresh secret built from the subject id,
//! the current time with nanosecond precision and the process signing key.

use crate::auth::base32::encode_base32;
use crate::types::{DerivedSecret, SigningKey, SubjectId};
use chrono::{DateTime, SecondsFormat, Utc};

/// Derives HOTP keys from the configured signing key
#[derive(Clone, Debug)]
pub struct SecretDeriver {
    signing_key: SigningKey,
}

impl SecretDeriver {
    pub fn new(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    /// Derive a secret for `subject` at the current instant
    pub fn derive_secret(&self, subject: SubjectId) -> DerivedSecret {
        self.derive_secret_at(subject, Utc::now())
    }

    /// Derive a secret for `subject` at a fixed instant
    ///
    /// Identical inputs yield identical secrets under the same signing key.
    pub fn derive_secret_at(&self, subject: SubjectId, at: DateTime<Utc>) -> DerivedSecret {
        let raw = format!(
            "{}{}{}",
            subject,
            at.to_rfc3339_opts(SecondsFormat::Nanos, true),
            self.signing_key.expose()
        );
        DerivedSecret::new(encode_base32(raw.as_bytes()))
    }
}
