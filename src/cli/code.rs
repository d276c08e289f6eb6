//! Issue and verify codes against a shared Redis store
//!
//! Unlike `login`/`signup`, these commands keep no state in-process, so a
//! code issued by one invocation can be verified by another.

use anyhow::Result;
use colored::Colorize;
use quill_core::auth::OtpService;
use quill_core::config::toml_config::load_config;
use quill_core::error::OtpError;
use quill_core::store::redis::RedisStore;
use std::sync::Arc;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

fn build_service(redis_url: &str) -> Result<OtpService> {
    let config = load_config()?;
    let store = RedisStore::open(redis_url, CONNECT_TIMEOUT)?;
    Ok(OtpService::from_settings(&config.otp, Arc::new(store))?)
}

/// Run the issue command, printing the code to stdout
pub fn run_issue(subject_id: u64, redis_url: &str) -> Result<()> {
    let otp = build_service(redis_url)?;
    let code = otp.issue_code(subject_id)?;

    // Machine-parsable: only the code on stdout
    println!("{}", code.expose());
    Ok(())
}

/// Run the verify command
pub fn run_verify(subject_id: u64, code: &str, redis_url: &str) -> Result<()> {
    let otp = build_service(redis_url)?;

    if otp.verify_code(subject_id, code)? {
        println!("{} Code accepted", "✓".green());
        Ok(())
    } else {
        Err(quill_core::error::QuillError::from(OtpError::VerificationFailed).into())
    }
}
