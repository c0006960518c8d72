use async_trait::async_trait;
use parking_lot::Mutex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use crate::error::SessionError;

// 1. IdentityStorage Contract
/// IdentityStorage
///
/// The durable client-side storage behind the `SessionStore`. It stores ONE opaque record
/// (the serialized token + user pair), so a save or a removal is all-or-nothing.
/// The file implementation backs the CLI; the mock backs the tests.
#[async_trait]
pub trait IdentityStorage: Send + Sync {
    /// Returns the raw persisted record, or `None` if nothing was ever saved.
    async fn load(&self) -> Result<Option<String>, SessionError>;

    /// Atomically replaces the persisted record.
    async fn save(&self, record: &str) -> Result<(), SessionError>;

    /// Removes the persisted record. Removing an absent record is not an error.
    async fn remove(&self) -> Result<(), SessionError>;
}

// 2. The Real Implementation (file on disk)
/// FileIdentityStorage
///
/// Keeps the record in a single JSON file. Writes go to a uniquely named sibling file
/// which is then renamed over the target, so readers only ever see the old or the new
/// record.
#[derive(Clone, Debug)]
pub struct FileIdentityStorage {
    path: PathBuf,
}

impl FileIdentityStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("identity");
        self.path
            .with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()))
    }
}

#[async_trait]
impl IdentityStorage for FileIdentityStorage {
    async fn load(&self) -> Result<Option<String>, SessionError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(None),
            Ok(contents) => Ok(Some(contents)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(SessionError::Storage(format!(
                "read {}: {error}",
                self.path.display()
            ))),
        }
    }

    async fn save(&self, record: &str) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                SessionError::Storage(format!("mkdir {}: {e}", parent.display()))
            })?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, record)
            .await
            .map_err(|e| SessionError::Storage(format!("write {}: {e}", temp.display())))?;

        // The token is a credential: owner read/write only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) =
                tokio::fs::set_permissions(&temp, std::fs::Permissions::from_mode(0o600)).await
            {
                tracing::warn!("failed to chmod 0600 {}: {e}", temp.display());
            }
        }

        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(SessionError::Storage(format!(
                "rename {} -> {}: {e}",
                temp.display(),
                self.path.display()
            )));
        }
        Ok(())
    }

    async fn remove(&self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(SessionError::Storage(format!(
                "delete {}: {error}",
                self.path.display()
            ))),
        }
    }
}

// 3. The Mock Implementation (For Tests)
/// MockIdentityStorage
///
/// In-memory storage used by tests. Counts writes so tests can assert that reads never
/// persist anything, and can be told to fail every operation.
#[derive(Default)]
pub struct MockIdentityStorage {
    record: Mutex<Option<String>>,
    writes: AtomicUsize,
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
}

impl MockIdentityStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: impl Into<String>) -> Self {
        Self {
            record: Mutex::new(Some(record.into())),
            ..Self::default()
        }
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// The record as currently persisted.
    pub fn snapshot(&self) -> Option<String> {
        self.record.lock().clone()
    }

    /// Number of saves and removals performed so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), SessionError> {
        if self.should_fail {
            return Err(SessionError::Storage(
                "Mock Storage Error: Simulation requested".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityStorage for MockIdentityStorage {
    async fn load(&self) -> Result<Option<String>, SessionError> {
        self.check()?;
        Ok(self.record.lock().clone())
    }

    async fn save(&self, record: &str) -> Result<(), SessionError> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.record.lock() = Some(record.to_string());
        Ok(())
    }

    async fn remove(&self) -> Result<(), SessionError> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.record.lock() = None;
        Ok(())
    }
}

/// IdentityStorageState
///
/// The shared handle the `SessionStore` holds on to.
pub type IdentityStorageState = Arc<dyn IdentityStorage>;
