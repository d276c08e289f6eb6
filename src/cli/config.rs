//! Configuration commands
//!
//! `init` writes a configuration file with a fresh signing key and
//! `check-config` validates the one in place.

use crate::cli::prompt::prompt_yes_no;
use anyhow::Result;
use colored::Colorize;
use quill_core::config::{toml_config, OtpSettings, QuillConfig, SIGNING_KEY_ENV};

/// Bytes of entropy in a generated signing key
const SIGNING_KEY_BYTES: usize = 32;

/// Run the init command
pub fn run_init(
    signing_key: Option<String>,
    ttl_secs: u64,
    max_attempts: u32,
    force: bool,
) -> Result<()> {
    let config_path = toml_config::get_config_path()?;

    if toml_config::config_exists()? && !force {
        println!("⚠️  Existing configuration detected at {}", config_path.display());
        if !prompt_yes_no("Overwrite existing configuration?", false)? {
            println!("Init cancelled.");
            return Ok(());
        }
    }

    let signing_key = match signing_key {
        Some(key) => key,
        None => generate_signing_key(),
    };

    let mut otp = OtpSettings::new(signing_key);
    otp.ttl_secs = ttl_secs;
    otp.max_attempts = max_attempts;

    let config = QuillConfig {
        otp,
        ..QuillConfig::default()
    };
    toml_config::save_config(&config)?;

    println!("{} Configuration written to {}", "✓".green(), config_path.display());
    println!("Keep this file private: it holds the signing key.");
    Ok(())
}

/// Run the check-config command
pub fn run_check_config() -> Result<()> {
    let config = toml_config::load_config()?;

    let key_source = if std::env::var(SIGNING_KEY_ENV).is_ok_and(|k| !k.trim().is_empty()) {
        SIGNING_KEY_ENV
    } else {
        "config file"
    };
    let attempts = config
        .otp
        .attempt_limit()
        .map_or_else(|| "unlimited".to_string(), |n| n.to_string());

    println!("{} Configuration is valid", "✓".green());
    println!("  Signing key:   [REDACTED] (from {})", key_source);
    println!("  Code TTL:      {}s", config.otp.ttl_secs);
    println!("  Max attempts:  {}", attempts);
    println!("  Mail sender:   {}", config.mail.from);
    Ok(())
}

/// Hex-encoded random signing key
fn generate_signing_key() -> String {
    hex::encode(rand::random::<[u8; SIGNING_KEY_BYTES]>())
}
