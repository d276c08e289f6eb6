//! Outbound notification channel
//!
//! Verification codes leave the service only through a [`Mailer`].

use crate::error::MailError;
use std::sync::Mutex;
use tracing::debug;

/// A single outbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivers messages to users
pub trait Mailer: Send + Sync {
    fn send(&self, message: Message) -> Result<(), MailError>;
}

/// Mailer that keeps every message in memory
#[derive(Debug, Default)]
pub struct OutboxMailer {
    outbox: Mutex<Vec<Message>>,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, oldest first
    pub fn messages(&self) -> Vec<Message> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }

    /// Most recent message addressed to `to`
    pub fn last_to(&self, to: &str) -> Option<Message> {
        self.messages()
            .into_iter()
            .rev()
            .find(|m| m.to.eq_ignore_ascii_case(to))
    }
}

impl Mailer for OutboxMailer {
    fn send(&self, message: Message) -> Result<(), MailError> {
        let mut outbox = self.outbox.lock().map_err(|_| MailError::DeliveryFailed {
            to: message.to.clone(),
            reason: "outbox lock poisoned".to_string(),
        })?;
        debug!(to = %message.to, subject = %message.subject, "Queued message");
        outbox.push(message);
        Ok(())
    }
}
