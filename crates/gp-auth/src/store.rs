use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{GpAuthError, Result};
use crate::session::SessionCredentials;

/// Persisted session: what `restore` needs plus the device it was negotiated for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredSession {
    pub credentials: SessionCredentials,
    /// Device profile name the session is bound to
    pub device: String,
    pub locale: String,
    pub saved_at: DateTime<Utc>,
}

impl StoredSession {
    pub fn new(credentials: SessionCredentials, device: &str, locale: &str) -> Self {
        Self {
            credentials,
            device: device.to_string(),
            locale: locale.to_string(),
            saved_at: Utc::now(),
        }
    }
}

/// Trait for storing and retrieving negotiated sessions
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load a session by account (usually the email)
    async fn load(&self, account: &str) -> Option<StoredSession>;

    async fn save(&self, account: &str, session: &StoredSession) -> Result<()>;

    async fn remove(&self, account: &str) -> Result<()>;

    /// List all stored accounts
    async fn list_accounts(&self) -> Vec<String>;
}

/// In-memory credential store for testing and one-shot tools
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    sessions: Arc<RwLock<HashMap<String, StoredSession>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> GpAuthError {
    GpAuthError::Io(std::io::Error::other("credential store lock poisoned"))
}

#[async_trait::async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self, account: &str) -> Option<StoredSession> {
        self.sessions.read().ok()?.get(account).cloned()
    }

    async fn save(&self, account: &str, session: &StoredSession) -> Result<()> {
        self.sessions
            .write()
            .map_err(|_| poisoned())?
            .insert(account.to_string(), session.clone());
        Ok(())
    }

    async fn remove(&self, account: &str) -> Result<()> {
        self.sessions
            .write()
            .map_err(|_| poisoned())?
            .remove(account);
        Ok(())
    }

    async fn list_accounts(&self) -> Vec<String> {
        self.sessions
            .read()
            .ok()
            .map(|s| s.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(token: &str) -> StoredSession {
        StoredSession::new(
            SessionCredentials {
                device_id: 0x3a5f,
                auth_sub_token: token.to_string(),
            },
            "walleye",
            "en_US",
        )
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryCredentialStore::new();
        assert!(store.load("user@example.com").await.is_none());

        store.save("user@example.com", &stored("one")).await.unwrap();
        store.save("user@example.com", &stored("two")).await.unwrap();

        let loaded = store.load("user@example.com").await.unwrap();
        assert_eq!(loaded.credentials.auth_sub_token, "two");
        assert_eq!(store.list_accounts().await, vec!["user@example.com"]);

        store.remove("user@example.com").await.unwrap();
        assert!(store.list_accounts().await.is_empty());
    }

    #[test]
    fn test_stored_session_json_shape() {
        let json = serde_json::to_value(stored("token")).unwrap();
        assert_eq!(json["credentials"]["device_id"], 0x3a5f);
        assert_eq!(json["device"], "walleye");
        assert!(json["saved_at"].is_string());
    }
}
