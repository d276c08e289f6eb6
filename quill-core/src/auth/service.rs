//! OTP credential service
//!
//! Issues single-use verification codes and checks them. Only the SHA-256
//! of a code is ever written to the store. A successful verification
//! consumes the credential; a failed one leaves it in place until it
//! expires, the attempt cap is hit, or a new code is issued.

use crate::auth::hotp::generate_code;
use crate::auth::secret::SecretDeriver;
use crate::config::OtpSettings;
use crate::error::{ConfigError, Result};
use crate::store::CredentialStore;
use crate::types::{OtpCode, SigningKey, SubjectId};
use constant_time_eq::constant_time_eq;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lowercase hex SHA-256 of a code
pub fn hash_code(code: &OtpCode) -> String {
    hex::encode(Sha256::digest(code.expose().as_bytes()))
}

/// Issues and verifies one-time passcodes against a [`CredentialStore`]
#[derive(Clone)]
pub struct OtpService {
    deriver: SecretDeriver,
    store: Arc<dyn CredentialStore>,
    ttl: Duration,
    max_attempts: Option<u32>,
}

impl OtpService {
    pub fn new(signing_key: SigningKey, store: Arc<dyn CredentialStore>, ttl: Duration) -> Self {
        Self {
            deriver: SecretDeriver::new(signing_key),
            store,
            ttl,
            max_attempts: None,
        }
    }

    /// Build the service from configuration
    pub fn from_settings(
        settings: &OtpSettings,
        store: Arc<dyn CredentialStore>,
    ) -> std::result::Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self::new(settings.signing_key()?, store, settings.ttl())
            .with_max_attempts(settings.attempt_limit()))
    }

    /// Cap failed attempts per issued code, `None` for unlimited retries
    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a fresh code for `subject`, replacing any pending one
    ///
    /// The returned code is meant for out-of-band delivery only.
    #[tracing::instrument(skip(self), fields(subject = %subject))]
    pub fn issue(&self, subject: SubjectId) -> Result<OtpCode> {
        let secret = self.deriver.derive_secret(subject);
        let code = generate_code(&secret, subject)?;

        self.store
            .set(&subject.credential_key(), &hash_code(&code), self.ttl)?;
        if self.max_attempts.is_some() {
            self.store.delete(&subject.attempts_key())?;
        }

        info!(ttl_secs = self.ttl.as_secs(), "Issued verification code");
        Ok(code)
    }

    /// Check `candidate` against the pending code for `subject`
    ///
    /// `Ok(false)` covers missing, expired, consumed and mismatched codes.
    /// Store outages are returned as errors, never as `false`.
    #[tracing::instrument(skip(self, candidate), fields(subject = %subject))]
    pub fn verify(&self, subject: SubjectId, candidate: &OtpCode) -> Result<bool> {
        let key = subject.credential_key();
        let hashed = hash_code(candidate);

        let Some(stored) = self.store.get(&key)? else {
            debug!("No pending credential");
            return Ok(false);
        };

        if !constant_time_eq(stored.as_bytes(), hashed.as_bytes()) {
            self.record_failure(subject, &stored)?;
            return Ok(false);
        }

        // A concurrent verify or issue may have replaced the entry since the read
        if !self.store.delete_if_eq(&key, &stored)? {
            debug!("Credential consumed or replaced concurrently");
            return Ok(false);
        }

        if self.max_attempts.is_some() {
            self.store.delete(&subject.attempts_key())?;
        }
        info!("Verification code accepted");
        Ok(true)
    }

    /// Issue a code for a raw user id
    pub fn issue_code(&self, subject_id: u64) -> Result<OtpCode> {
        self.issue(SubjectId::new(subject_id))
    }

    /// Verify a raw candidate string for a raw user id
    pub fn verify_code(&self, subject_id: u64, candidate: &str) -> Result<bool> {
        self.verify(SubjectId::new(subject_id), &OtpCode::from(candidate))
    }

    /// Count a mismatch against the code whose hash is `stored`
    fn record_failure(&self, subject: SubjectId, stored: &str) -> Result<()> {
        let Some(max_attempts) = self.max_attempts else {
            debug!("Verification code mismatch");
            return Ok(());
        };

        let attempts = self.store.increment(&subject.attempts_key(), self.ttl)?;
        debug!(attempts, max_attempts, "Verification code mismatch");

        // A code issued since the read keeps its own attempt budget
        if attempts >= u64::from(max_attempts)
            && self.store.delete_if_eq(&subject.credential_key(), stored)?
        {
            warn!(attempts, "Attempt limit reached, discarding pending code");
            self.store.delete(&subject.attempts_key())?;
        }
        Ok(())
    }
}
