//! Redis-backed credential store
//!
//! Lets several quill processes share pending credentials. Expiry is
//! delegated to Redis (`SET .. PX`); compare-and-delete and the attempt
//! counter run as Lua scripts so each stays a single atomic round trip.

use crate::error::StoreError;
use crate::store::CredentialStore;
use redis::{Client, Connection, RedisError, Script};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, warn};

const DELETE_IF_EQ: &str = r"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
end
return 0
";

const INCREMENT_WITH_TTL: &str = r"
local n = redis.call('INCR', KEYS[1])
if n == 1 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
return n
";

/// [`CredentialStore`] on a single Redis connection
///
/// The connection is opened lazily and dropped after any error so the
/// next call reconnects.
pub struct RedisStore {
    client: Client,
    connection: Mutex<Option<Connection>>,
    timeout: Duration,
}

impl RedisStore {
    pub fn open(url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(unavailable)?;
        Ok(Self {
            client,
            connection: Mutex::new(None),
            timeout,
        })
    }

    fn with_connection<T>(
        &self,
        op: impl FnOnce(&mut Connection) -> Result<T, RedisError>,
    ) -> Result<T, StoreError> {
        let mut guard: MutexGuard<'_, Option<Connection>> =
            self.connection.lock().map_err(|_| StoreError::Poisoned)?;

        if guard.is_none() {
            debug!("Opening Redis connection");
            let connection = self
                .client
                .get_connection_with_timeout(self.timeout)
                .map_err(unavailable)?;
            *guard = Some(connection);
        }

        let Some(connection) = guard.as_mut() else {
            return Err(StoreError::Poisoned);
        };

        op(connection).map_err(|e| {
            warn!("Redis command failed, dropping connection: {}", e);
            *guard = None;
            unavailable(e)
        })
    }
}

fn unavailable(e: RedisError) -> StoreError {
    StoreError::Unavailable {
        reason: e.to_string(),
    }
}

fn millis(ttl: Duration) -> u64 {
    (ttl.as_millis() as u64).max(1)
}

impl CredentialStore for RedisStore {
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.with_connection(|con| {
            redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("PX")
                .arg(millis(ttl))
                .query::<()>(con)
        })
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.with_connection(|con| redis::cmd("GET").arg(key).query::<Option<String>>(con))
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.with_connection(|con| redis::cmd("DEL").arg(key).query::<i64>(con))
            .map(|removed| removed > 0)
    }

    fn delete_if_eq(&self, key: &str, expected: &str) -> Result<bool, StoreError> {
        self.with_connection(|con| {
            Script::new(DELETE_IF_EQ)
                .key(key)
                .arg(expected)
                .invoke::<i64>(con)
        })
        .map(|removed| removed > 0)
    }

    fn increment(&self, key: &str, ttl: Duration) -> Result<u64, StoreError> {
        self.with_connection(|con| {
            Script::new(INCREMENT_WITH_TTL)
                .key(key)
                .arg(millis(ttl))
                .invoke::<u64>(con)
        })
    }
}
