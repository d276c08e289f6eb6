//! User directory
//!
//! The authentication flow resolves subjects through [`UserDirectory`].
//! Persistence of users belongs to the wider backend; [`MemoryDirectory`]
//! is the in-process implementation used by the CLI and tests.

use crate::error::DirectoryError;
use crate::types::SubjectId;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

pub mod mailer;

/// Account record as seen by the authentication flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: SubjectId,
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub is_active: bool,
}

/// Lookup and activation of accounts
pub trait UserDirectory: Send + Sync {
    /// Find a user by numeric id, username or e-mail address
    fn get_user_by_identifier(&self, identifier: &str) -> Result<Option<User>, DirectoryError>;

    /// Find a user by e-mail address
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError>;

    /// Return the user with `email`, creating an inactive one if needed
    fn get_or_create_inactive(&self, email: &str) -> Result<User, DirectoryError>;

    /// Mark the user active
    fn set_active(&self, id: SubjectId) -> Result<User, DirectoryError>;
}

/// Username part of an e-mail address
pub fn get_email_username(email: &str) -> Result<String, DirectoryError> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

    PATTERN
        .get_or_init(|| Regex::new(r"^([^@\s]+)@[^@\s]+$").ok())
        .as_ref()
        .and_then(|re| re.captures(email))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| DirectoryError::InvalidEmail {
            email: email.to_string(),
        })
}

/// In-memory [`UserDirectory`]
///
/// E-mail and username lookups are case-insensitive, and both are unique
/// ignoring case.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    users: RwLock<BTreeMap<SubjectId, User>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a user; username and full name default to the e-mail's local part
    pub fn create_user(&self, email: &str, is_active: bool) -> Result<User, DirectoryError> {
        let mut users = self.write()?;
        Self::insert_user(&mut users, email, is_active)
    }

    fn insert_user(
        users: &mut BTreeMap<SubjectId, User>,
        email: &str,
        is_active: bool,
    ) -> Result<User, DirectoryError> {
        let username = get_email_username(email)?;

        if users.values().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Err(DirectoryError::DuplicateEmail {
                email: email.to_string(),
            });
        }
        if users.values().any(|u| u.username.eq_ignore_ascii_case(&username)) {
            return Err(DirectoryError::DuplicateUsername { username });
        }

        let id = SubjectId::new(users.keys().next_back().map_or(1, |id| id.get() + 1));
        let user = User {
            id,
            email: email.to_string(),
            username: username.clone(),
            full_name: username,
            is_active,
        };
        users.insert(id, user.clone());

        info!(user_id = %id, "Created user");
        Ok(user)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<SubjectId, User>>, DirectoryError> {
        self.users.read().map_err(|_| DirectoryError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<SubjectId, User>>, DirectoryError> {
        self.users.write().map_err(|_| DirectoryError::Poisoned)
    }
}

impl UserDirectory for MemoryDirectory {
    fn get_user_by_identifier(&self, identifier: &str) -> Result<Option<User>, DirectoryError> {
        let users = self.read()?;

        if let Ok(id) = identifier.parse::<u64>() {
            if let Some(user) = users.get(&SubjectId::new(id)) {
                return Ok(Some(user.clone()));
            }
        }

        Ok(users
            .values()
            .find(|u| {
                u.email.eq_ignore_ascii_case(identifier)
                    || u.username.eq_ignore_ascii_case(identifier)
            })
            .cloned())
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError> {
        let users = self.read()?;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn get_or_create_inactive(&self, email: &str) -> Result<User, DirectoryError> {
        let mut users = self.write()?;
        if let Some(user) = users.values().find(|u| u.email.eq_ignore_ascii_case(email)) {
            return Ok(user.clone());
        }
        Self::insert_user(&mut users, email, false)
    }

    fn set_active(&self, id: SubjectId) -> Result<User, DirectoryError> {
        let mut users = self.write()?;
        let user = users
            .get_mut(&id)
            .ok_or(DirectoryError::NotFound { id: id.get() })?;
        user.is_active = true;
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_email_username() {
        assert_eq!(get_email_username("jane.doe@example.com").unwrap(), "jane.doe");
        assert!(matches!(
            get_email_username("not-an-email"),
            Err(DirectoryError::InvalidEmail { .. })
        ));
        assert!(get_email_username("a@b@c").is_err());
    }

    #[test]
    fn test_create_and_lookup() {
        let directory = MemoryDirectory::new();
        let alice = directory.create_user("alice@example.com", true).unwrap();
        let bob = directory.create_user("bob@example.com", true).unwrap();

        assert_eq!(alice.id, SubjectId::new(1));
        assert_eq!(bob.id, SubjectId::new(2));
        assert_eq!(alice.username, "alice");

        let by_name = directory.get_user_by_identifier("ALICE").unwrap();
        let by_email = directory.get_user_by_identifier("Bob@Example.com").unwrap();
        let by_id = directory.get_user_by_identifier("2").unwrap();

        assert_eq!(by_name, Some(alice));
        assert_eq!(by_email, Some(bob.clone()));
        assert_eq!(by_id, Some(bob));
        assert_eq!(directory.get_user_by_identifier("carol").unwrap(), None);
    }

    #[test]
    fn test_duplicates_rejected() {
        let directory = MemoryDirectory::new();
        directory.create_user("alice@a.com", true).unwrap();

        assert!(matches!(
            directory.create_user("ALICE@a.com", true),
            Err(DirectoryError::DuplicateEmail { .. })
        ));
        assert!(matches!(
            directory.create_user("alice@b.com", true),
            Err(DirectoryError::DuplicateUsername { ref username }) if username == "alice"
        ));
        assert!(matches!(
            directory.get_or_create_inactive("Alice@b.com"),
            Err(DirectoryError::DuplicateUsername { .. })
        ));

        let found = directory.get_user_by_identifier("alice").unwrap().unwrap();
        assert_eq!(found.email, "alice@a.com");
    }

    #[test]
    fn test_concurrent_get_or_create_yields_one_user() {
        let directory = std::sync::Arc::new(MemoryDirectory::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let directory = directory.clone();
                std::thread::spawn(move || directory.get_or_create_inactive("race@example.com"))
            })
            .collect();
        let ids: Vec<SubjectId> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap().id)
            .collect();

        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(directory.read().unwrap().len(), 1);
    }

    #[test]
    fn test_get_or_create_inactive_then_activate() {
        let directory = MemoryDirectory::new();
        let created = directory.get_or_create_inactive("new@example.com").unwrap();
        assert!(!created.is_active);

        let again = directory.get_or_create_inactive("NEW@example.com").unwrap();
        assert_eq!(again.id, created.id);

        let active = directory.set_active(created.id).unwrap();
        assert!(active.is_active);
        assert!(matches!(
            directory.set_active(SubjectId::new(99)),
            Err(DirectoryError::NotFound { id: 99 })
        ));
    }
}
