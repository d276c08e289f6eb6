//! quill - passwordless authentication for the quill blogging backend
//!
//! Command-line front end for issuing and verifying one-time passcodes
//! and for exercising the login and signup flows.

use clap::{Parser, Subcommand};
use quill_core::error::{ConfigError, QuillError, StoreError};
use quill_core::init_logging;

mod cli;

#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "One-time-passcode authentication with hashed, expiring credentials")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a configuration file with a signing key
    Init {
        /// Signing key to use instead of a generated one
        #[arg(long)]
        signing_key: Option<String>,
        /// Seconds an issued code stays valid
        #[arg(long, default_value_t = 300)]
        ttl_secs: u64,
        /// Failed attempts allowed per code, 0 for unlimited
        #[arg(long, default_value_t = 5)]
        max_attempts: u32,
        /// Overwrite an existing configuration without asking
        #[arg(long)]
        force: bool,
    },
    /// Validate the configuration file
    CheckConfig,
    /// Log in by username or e-mail with a mailed code
    Login {
        /// Username or e-mail address
        identifier: String,
        /// Seed an active user with this e-mail (repeatable)
        #[arg(long = "user")]
        users: Vec<String>,
    },
    /// Sign up with an e-mail address and a mailed code
    Signup {
        /// E-mail address of the new account
        email: String,
        /// Seed an active user with this e-mail (repeatable)
        #[arg(long = "user")]
        users: Vec<String>,
    },
    /// Issue a code for a user id and print it
    #[cfg(feature = "redis")]
    Issue {
        subject_id: u64,
        #[arg(long, env = "QUILL_REDIS_URL", default_value = "redis://127.0.0.1/")]
        redis_url: String,
    },
    /// Verify a code for a user id
    #[cfg(feature = "redis")]
    Verify {
        subject_id: u64,
        code: String,
        #[arg(long, env = "QUILL_REDIS_URL", default_value = "redis://127.0.0.1/")]
        redis_url: String,
    },
}

/// Map an error to the process exit code
///
/// 1: authentication rejected, 2: configuration problem, 3: store
/// unavailable (retry later).
fn exit_code(error: &anyhow::Error) -> i32 {
    if let Some(e) = error.downcast_ref::<QuillError>() {
        return match e {
            QuillError::Config(_) | QuillError::Toml(_) | QuillError::TomlSerialize(_) => 2,
            QuillError::Store(StoreError::Unavailable { .. }) => 3,
            QuillError::Store(StoreError::Poisoned) => 1,
            QuillError::Otp(_) | QuillError::Directory(_) | QuillError::Mail(_) => 1,
            QuillError::Io(_) => 1,
        };
    }
    if error.downcast_ref::<ConfigError>().is_some() {
        return 2;
    }
    if let Some(StoreError::Unavailable { .. }) = error.downcast_ref::<StoreError>() {
        return 3;
    }
    1
}

fn main() {
    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(2);
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init {
            signing_key,
            ttl_secs,
            max_attempts,
            force,
        } => cli::config::run_init(signing_key, ttl_secs, max_attempts, force),
        Commands::CheckConfig => cli::config::run_check_config(),
        Commands::Login { identifier, users } => cli::session::run_login(&identifier, &users),
        Commands::Signup { email, users } => cli::session::run_signup(&email, &users),
        #[cfg(feature = "redis")]
        Commands::Issue {
            subject_id,
            redis_url,
        } => cli::code::run_issue(subject_id, &redis_url),
        #[cfg(feature = "redis")]
        Commands::Verify {
            subject_id,
            code,
            redis_url,
        } => cli::code::run_verify(subject_id, &code, &redis_url),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(exit_code(&e));
        }
    }
}
