//! Login and signup flows
//!
//! Ties the OTP service to the user directory, the mailer and the caller's
//! session. Both flows run in two steps: the first mails a code and records
//! the user's e-mail in the session, the second checks the code and logs
//! the user in.

use crate::auth::OtpService;
use crate::config::MailSettings;
use crate::directory::mailer::{Mailer, Message};
use crate::directory::{User, UserDirectory};
use crate::error::{OtpError, Result};
use crate::types::{OtpCode, SubjectId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Per-client session state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// E-mail awaiting code verification
    pub pending_email: Option<String>,
    /// Logged-in user
    pub user_id: Option<SubjectId>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    fn log_in(&mut self, user: &User) {
        self.pending_email = None;
        self.user_id = Some(user.id);
    }
}

/// Two-step passwordless authentication
#[derive(Clone)]
pub struct AuthFlow {
    otp: OtpService,
    directory: Arc<dyn UserDirectory>,
    mailer: Arc<dyn Mailer>,
    mail: MailSettings,
}

impl AuthFlow {
    pub fn new(
        otp: OtpService,
        directory: Arc<dyn UserDirectory>,
        mailer: Arc<dyn Mailer>,
        mail: MailSettings,
    ) -> Self {
        Self {
            otp,
            directory,
            mailer,
            mail,
        }
    }

    pub fn otp(&self) -> &OtpService {
        &self.otp
    }

    /// Start a login by username or e-mail
    ///
    /// Unknown identifiers get the same error as any other unresolvable
    /// subject.
    pub fn login(
        &self,
        session: &mut Session,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<User> {
        let username = username.map(str::trim).filter(|s| !s.is_empty());
        let email = email.map(str::trim).filter(|s| !s.is_empty());

        if username.is_none() && email.is_none() {
            return Err(OtpError::MissingIdentifier.into());
        }

        let user = self
            .resolve_user(username, email)?
            .ok_or(OtpError::InvalidSubject)?;

        if !user.is_active {
            warn!(user_id = %user.id, "Login attempt for disabled account");
            return Err(OtpError::AccountDisabled.into());
        }

        self.send_code(&user)?;
        session.pending_email = Some(user.email.clone());
        Ok(user)
    }

    /// Start a signup for `email`
    ///
    /// An inactive account is created on first use; an already active
    /// account cannot sign up again.
    pub fn signup(&self, session: &mut Session, email: &str) -> Result<User> {
        let user = self.directory.get_or_create_inactive(email.trim())?;
        if user.is_active {
            return Err(OtpError::EmailTaken.into());
        }

        self.send_code(&user)?;
        session.pending_email = Some(user.email.clone());
        Ok(user)
    }

    /// Finish a login with the mailed code
    pub fn verify_login(&self, session: &mut Session, code: &str) -> Result<User> {
        let user = self.check_code(session, code)?;
        session.log_in(&user);
        info!(user_id = %user.id, "User logged in");
        Ok(user)
    }

    /// Finish a signup with the mailed code, activating the account
    pub fn verify_signup(&self, session: &mut Session, code: &str) -> Result<User> {
        let user = self.check_code(session, code)?;
        let user = self.directory.set_active(user.id)?;
        session.log_in(&user);
        info!(user_id = %user.id, "User signed up");
        Ok(user)
    }

    /// Resolve a user from credentials in one step
    ///
    /// Returns `Ok(None)` for unknown users and wrong codes alike.
    pub fn authenticate(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        code: &str,
    ) -> Result<Option<User>> {
        let username = username.map(str::trim).filter(|s| !s.is_empty());
        let email = email.map(str::trim).filter(|s| !s.is_empty());
        let Some(user) = self.resolve_user(username, email)? else {
            return Ok(None);
        };

        if self.otp.verify(user.id, &OtpCode::from(code))? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    pub fn logout(&self, session: &mut Session) {
        if let Some(user_id) = session.user_id.take() {
            info!(user_id = %user_id, "User logged out");
        }
        session.pending_email = None;
    }

    /// Username (or id) first, then the e-mail address
    fn resolve_user(&self, username: Option<&str>, email: Option<&str>) -> Result<Option<User>> {
        if let Some(username) = username {
            if let Some(user) = self.directory.get_user_by_identifier(username)? {
                return Ok(Some(user));
            }
        }
        match email {
            Some(email) => Ok(self.directory.get_user_by_email(email)?),
            None => Ok(None),
        }
    }

    fn send_code(&self, user: &User) -> Result<()> {
        let code = self.otp.issue(user.id)?;
        self.mailer.send(Message {
            from: self.mail.from.clone(),
            to: user.email.clone(),
            subject: self.mail.subject.clone(),
            body: format!("Your login verification code is {}", code.expose()),
        })?;
        Ok(())
    }

    fn check_code(&self, session: &Session, code: &str) -> Result<User> {
        let code = OtpCode::from(code);
        if !code.is_well_formed() {
            return Err(OtpError::InvalidCodeFormat.into());
        }

        let email = session
            .pending_email
            .as_deref()
            .ok_or(OtpError::MissingSessionData)?;

        let user = self
            .directory
            .get_user_by_email(email)?
            .ok_or(OtpError::VerificationFailed)?;

        if !self.otp.verify(user.id, &code)? {
            return Err(OtpError::VerificationFailed.into());
        }
        Ok(user)
    }
}
