use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use tokio::fs;
use tokio::sync::RwLock;

use crate::errors::{GpAuthError, Result};
use crate::store::{CredentialStore, StoredSession};

/// File-based credential store
///
/// Sessions are kept as one JSON file per account. The sub-token is a bearer
/// credential, so files and directories are owner-only on Unix.
///
/// # Directory Structure
/// ```text
/// ~/.config/gplay/sessions/
/// ├── lock                       # Advisory lock file
/// └── accounts/
///     ├── user@example.com.json
///     └── other@example.com.json
/// ```
#[derive(Debug)]
pub struct FileCredentialStore {
    accounts_dir: PathBuf,
    lock_file: PathBuf,
    cache: Arc<RwLock<HashMap<String, StoredSession>>>,
}

impl FileCredentialStore {
    pub async fn new(storage_dir: impl AsRef<Path>) -> Result<Self> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        let accounts_dir = storage_dir.join("accounts");
        let lock_file = storage_dir.join("lock");

        fs::create_dir_all(&accounts_dir).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            std::fs::set_permissions(&storage_dir, perms.clone())?;
            std::fs::set_permissions(&accounts_dir, perms)?;
        }

        Ok(Self {
            accounts_dir,
            lock_file,
            cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Get default storage directory for the current platform
    pub fn default_storage_dir() -> Result<PathBuf> {
        let project_dirs = directories::ProjectDirs::from("", "", "gplay").ok_or_else(|| {
            GpAuthError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;

        Ok(project_dirs.config_dir().join("sessions"))
    }

    fn account_path(&self, account: &str) -> PathBuf {
        self.accounts_dir
            .join(format!("{}.json", sanitize_account(account)))
    }

    async fn acquire_lock(&self) -> Result<std::fs::File> {
        let lock_file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_file)?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| GpAuthError::LockTimeout)?;

        Ok(lock_file)
    }

    async fn load_from_disk(&self, account: &str) -> Result<Option<StoredSession>> {
        let path = self.account_path(account);

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn save_to_disk(&self, account: &str, session: &StoredSession) -> Result<()> {
        let path = self.account_path(account);
        let json = serde_json::to_string_pretty(session)?;

        // Atomic write: write to temp file, then rename
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, json).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let file = std::fs::File::open(&temp_path)?;
        file.sync_all()?;

        fs::rename(&temp_path, &path).await?;

        Ok(())
    }
}

/// Keep account names usable as file names
fn sanitize_account(account: &str) -> String {
    account
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '@' | '.' | '-' | '_' | '+' => c,
            _ => '_',
        })
        .collect()
}

#[async_trait::async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self, account: &str) -> Option<StoredSession> {
        {
            let cache = self.cache.read().await;
            if let Some(session) = cache.get(account) {
                return Some(session.clone());
            }
        }

        match self.load_from_disk(account).await {
            Ok(Some(session)) => {
                self.cache
                    .write()
                    .await
                    .insert(account.to_string(), session.clone());
                Some(session)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::error!("Failed to load session for {}: {}", account, e);
                None
            }
        }
    }

    async fn save(&self, account: &str, session: &StoredSession) -> Result<()> {
        let _lock = self.acquire_lock().await?;

        self.save_to_disk(account, session).await?;

        self.cache
            .write()
            .await
            .insert(account.to_string(), session.clone());

        Ok(())
    }

    async fn remove(&self, account: &str) -> Result<()> {
        let _lock = self.acquire_lock().await?;

        let path = self.account_path(account);
        if path.exists() {
            fs::remove_file(&path).await?;
        }

        self.cache.write().await.remove(account);

        Ok(())
    }

    async fn list_accounts(&self) -> Vec<String> {
        let mut accounts = Vec::new();

        let mut entries = match fs::read_dir(&self.accounts_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("Failed to read accounts directory: {}", e);
                return accounts;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                accounts.push(stem.to_string());
            }
        }

        accounts.sort();
        accounts
    }
}
