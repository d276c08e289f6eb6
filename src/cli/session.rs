//! Login and signup commands
//!
//! Runs the two-step flow in-process: the code is "mailed" to the terminal
//! and then read back from stdin. Users passed with `--user` are seeded
//! into an in-memory directory as active accounts.

use crate::cli::prompt::prompt_required;
use anyhow::Result;
use colored::Colorize;
use quill_core::auth::OtpService;
use quill_core::config::toml_config::load_config;
use quill_core::directory::mailer::{Mailer, Message};
use quill_core::directory::{MemoryDirectory, User};
use quill_core::error::MailError;
use quill_core::flow::{AuthFlow, Session};
use quill_core::store::MemoryStore;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Mailer that shows messages on the terminal
struct TerminalMailer;

impl Mailer for TerminalMailer {
    fn send(&self, message: Message) -> Result<(), MailError> {
        println!();
        println!("{}", "📧 New message".bold());
        println!("  From:    {}", message.from);
        println!("  To:      {}", message.to);
        println!("  Subject: {}", message.subject);
        println!();
        println!("  {}", message.body);
        println!();
        Ok(())
    }
}

fn build_flow(users: &[String]) -> Result<AuthFlow> {
    let config = load_config()?;
    let otp = OtpService::from_settings(&config.otp, Arc::new(MemoryStore::new()))?;

    let directory = MemoryDirectory::new();
    for email in users {
        directory.create_user(email, true)?;
    }
    info!(seeded = users.len(), "Directory ready");

    Ok(AuthFlow::new(
        otp,
        Arc::new(directory),
        Arc::new(TerminalMailer),
        config.mail,
    ))
}

fn print_session(user: &User, session: &Session) -> Result<()> {
    let summary = json!({
        "success": true,
        "user": user,
        "session": session,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Run the login command
pub fn run_login(identifier: &str, users: &[String]) -> Result<()> {
    let flow = build_flow(users)?;
    let mut session = Session::new();

    let (username, email) = if identifier.contains('@') {
        (None, Some(identifier))
    } else {
        (Some(identifier), None)
    };

    let user = flow.login(&mut session, username, email)?;
    println!("Verification code for email {} submitted.", user.email);

    let code = prompt_required("Verification code")?;
    let user = flow.verify_login(&mut session, &code)?;

    println!("{} Logged in as {}", "✓".green(), user.username);
    print_session(&user, &session)
}

/// Run the signup command
pub fn run_signup(email: &str, users: &[String]) -> Result<()> {
    let flow = build_flow(users)?;
    let mut session = Session::new();

    let user = flow.signup(&mut session, email)?;
    println!("Verification code for email {} submitted.", user.email);

    let code = prompt_required("Verification code")?;
    let user = flow.verify_signup(&mut session, &code)?;

    println!("{} Account {} activated", "✓".green(), user.username);
    print_session(&user, &session)
}
