//! Configuration module
//!
//! Handles OTP and mail settings loaded from TOML files. The signing key may
//! also come from the environment so it can stay out of the file.

use crate::error::ConfigError;
use crate::types::SigningKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub mod toml_config;

/// Environment variable that overrides the configured signing key
pub const SIGNING_KEY_ENV: &str = "QUILL_SIGNING_KEY";

/// Longest accepted code lifetime
pub const MAX_TTL_SECS: u64 = 3600;

/// Complete quill configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuillConfig {
    /// One-time passcode settings
    #[serde(default)]
    pub otp: OtpSettings,

    /// Outbound mail settings
    #[serde(default)]
    pub mail: MailSettings,
}

impl QuillConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.otp.validate()?;
        self.mail.validate()
    }
}

/// One-time passcode settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpSettings {
    /// Root secret for code derivation
    #[serde(default)]
    pub signing_key: String,

    /// Seconds an issued code stays valid
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Failed attempts allowed per issued code, 0 for unlimited
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_max_attempts() -> u32 {
    5
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self {
            signing_key: String::new(),
            ttl_secs: default_ttl_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl fmt::Debug for OtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtpSettings")
            .field("signing_key", &"[REDACTED]")
            .field("ttl_secs", &self.ttl_secs)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

impl OtpSettings {
    pub fn new(signing_key: String) -> Self {
        Self {
            signing_key,
            ..Self::default()
        }
    }

    /// Resolve the signing key, preferring the environment over the file
    pub fn signing_key(&self) -> Result<SigningKey, ConfigError> {
        match std::env::var(SIGNING_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => SigningKey::new(key),
            _ => SigningKey::new(self.signing_key.clone()),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Attempt cap, `None` when unlimited
    pub fn attempt_limit(&self) -> Option<u32> {
        (self.max_attempts > 0).then_some(self.max_attempts)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.signing_key()?;

        if self.ttl_secs == 0 {
            return Err(ConfigError::ValidationError {
                message: "OTP TTL cannot be zero".to_string(),
            });
        }

        if self.ttl_secs > MAX_TTL_SECS {
            return Err(ConfigError::ValidationError {
                message: format!("OTP TTL cannot exceed {} seconds", MAX_TTL_SECS),
            });
        }

        Ok(())
    }
}

/// Outbound mail settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailSettings {
    /// Sender address of verification mails
    #[serde(default = "default_from")]
    pub from: String,

    /// Subject line of verification mails
    #[serde(default = "default_subject")]
    pub subject: String,
}

fn default_from() -> String {
    "noreply@quill.local".to_string()
}

fn default_subject() -> String {
    "Email-address verification".to_string()
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            from: default_from(),
            subject: default_subject(),
        }
    }
}

impl MailSettings {
    /// Validate the settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.from.contains('@') {
            return Err(ConfigError::ValidationError {
                message: format!("Invalid sender address: {}", self.from),
            });
        }
        Ok(())
    }
}
