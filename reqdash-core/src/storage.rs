use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// A document that has been uploaded but not yet analyzed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUpload {
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
}

impl PendingUpload {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            uploaded_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockMode {
    Shared,
    Exclusive,
}

impl LockMode {
    fn try_lock(self, file: &File) -> io::Result<()> {
        match self {
            LockMode::Shared => FileExt::try_lock_shared(file),
            LockMode::Exclusive => FileExt::try_lock_exclusive(file),
        }
    }
}

/// Persists the pending upload between runs. Readers share the lock file;
/// writers hold it exclusively.
pub struct SessionStorage {
    file_path: PathBuf,
    lock_file_path: PathBuf,
    lock_timeout: Duration,
}

impl SessionStorage {
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        let file_path = file_path.as_ref().to_path_buf();
        let lock_file_path = file_path.with_extension("yaml.lock");
        Self {
            file_path,
            lock_file_path,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// How long to wait for another process to release the session
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Returns the path to the session file
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Waits for the session lock without blocking the runtime.
    /// The returned handle holds the lock until dropped.
    async fn lock(&self, mode: LockMode) -> Result<File> {
        if let Some(parent) = self.lock_file_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create session directory: {:?}", parent))?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to open lock file: {:?}", self.lock_file_path))?;

        let deadline = Instant::now() + self.lock_timeout;
        loop {
            match mode.try_lock(&lock_file) {
                Ok(()) => return Ok(lock_file),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        anyhow::bail!(
                            "Timed out after {:?} waiting for session lock ({:?}); is another reqdash running?",
                            self.lock_timeout,
                            self.file_path
                        );
                    }
                    tokio::time::sleep(LOCK_RETRY_INTERVAL).await;
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to lock {:?}", self.lock_file_path)
                    })
                }
            }
        }
    }

    /// Loads the pending upload, if one was saved
    pub async fn load_pending(&self) -> Result<Option<PendingUpload>> {
        if !self.file_path.exists() {
            return Ok(None);
        }

        let _lock = self.lock(LockMode::Shared).await?;

        let content = match tokio::fs::read_to_string(&self.file_path).await {
            Ok(content) => content,
            // Cleared while we waited for the lock
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read session file: {:?}", self.file_path))
            }
        };
        if content.trim().is_empty() {
            return Ok(None);
        }

        let pending = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse session file: {:?}", self.file_path))?;
        Ok(Some(pending))
    }

    /// Saves the pending upload, replacing any previous one
    pub async fn save_pending(&self, pending: &PendingUpload) -> Result<()> {
        let mut lock_file = self.lock(LockMode::Exclusive).await?;

        // Lock holder note, for debugging
        lock_file.set_len(0)?;
        let _ = writeln!(
            lock_file,
            "Locked by PID {} at {}",
            std::process::id(),
            Utc::now().to_rfc3339()
        );

        let yaml = serde_yaml::to_string(pending)?;
        tokio::fs::write(&self.file_path, yaml)
            .await
            .with_context(|| format!("Failed to write session file: {:?}", self.file_path))?;
        debug!("Saved pending upload {} to {:?}", pending.filename, self.file_path);

        Ok(())
    }

    /// Forgets the pending upload
    pub async fn clear_pending(&self) -> Result<()> {
        if !self.file_path.exists() {
            return Ok(());
        }

        let _lock = self.lock(LockMode::Exclusive).await?;
        match tokio::fs::remove_file(&self.file_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to remove session file: {:?}", self.file_path))
            }
        }
        debug!("Cleared pending upload at {:?}", self.file_path);
        Ok(())
    }

    /// Makes the session file match the in-memory pending slot
    pub async fn sync_pending(&self, filename: Option<&str>) -> Result<()> {
        match filename {
            Some(filename) => {
                let current = self.load_pending().await?;
                if current.as_ref().is_some_and(|p| p.filename == filename) {
                    return Ok(());
                }
                self.save_pending(&PendingUpload::new(filename)).await
            }
            None => self.clear_pending().await,
        }
    }
}
