//! Authentication module
//!
//! Handles secret derivation, HOTP code generation and the credential
//! service that issues and verifies one-time passcodes.

pub mod base32;
pub mod hotp;
pub mod secret;
pub mod service;

pub use service::{hash_code, OtpService};
