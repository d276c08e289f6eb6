//! CLI command implementations
//!
//! This module contains the implementation of all CLI subcommands.

#[cfg(feature = "redis")]
pub mod code;
pub mod config;
pub mod prompt;
pub mod session;
