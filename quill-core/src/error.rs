//! Error types for the quill authentication core
//!
//! This module defines all error types used throughout the crate. Store
//! failures are kept apart from verification failures so callers can tell
//! "your code is wrong" from "try again later".

use thiserror::Error;

/// Main error type for quill
#[derive(Error, Debug)]
pub enum QuillError {
    /// Errors related to configuration loading/parsing
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors related to OTP issuance and verification
    #[error("OTP error: {0}")]
    Otp(#[from] OtpError),

    /// Errors raised by the credential store backend
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Errors raised by the user directory
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Errors raised while delivering a code
    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl QuillError {
    /// Whether the caller may retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(self, QuillError::Store(StoreError::Unavailable { .. }))
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Signing key is missing or empty")]
    MisconfiguredSigningKey,

    #[error("Failed to load configuration file: {path}")]
    LoadFailed { path: String },

    #[error("Failed to save configuration file: {path}")]
    SaveFailed { path: String },

    #[error("Configuration validation error: {message}")]
    ValidationError { message: String },

    #[error("I/O error: {message}")]
    IoError { message: String },
}

/// OTP issuance and verification errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    /// Deliberately vague so callers cannot probe for existing accounts
    #[error("Unable to authenticate with provided credentials")]
    InvalidSubject,

    #[error("The verification code is incorrect or has expired")]
    VerificationFailed,

    #[error("The verification code is invalid")]
    InvalidCodeFormat,

    #[error("User account is disabled")]
    AccountDisabled,

    #[error("A user with that email address already exists")]
    EmailTaken,

    #[error("Please enter your username or email address")]
    MissingIdentifier,

    #[error("The session does not have required data")]
    MissingSessionData,

    #[error("Invalid Base32 secret")]
    InvalidBase32,

    #[error("Invalid HMAC key length")]
    InvalidKeyLength,
}

/// Credential store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Credential store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Credential store lock poisoned")]
    Poisoned,
}

/// User directory errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Can't find username of {email}")]
    InvalidEmail { email: String },

    #[error("A user with that email address already exists: {email}")]
    DuplicateEmail { email: String },

    #[error("A user with that username already exists: {username}")]
    DuplicateUsername { username: String },

    #[error("User {id} not found")]
    NotFound { id: u64 },

    #[error("User directory lock poisoned")]
    Poisoned,
}

/// Outbound notification errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MailError {
    #[error("Failed to deliver mail to {to}: {reason}")]
    DeliveryFailed { to: String, reason: String },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, QuillError>;
