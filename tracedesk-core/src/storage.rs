use anyhow::{bail, Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use crate::theme::Theme;

/// How long a writer waits for another process to release the state file
pub const LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const LOCK_RETRY: Duration = Duration::from_millis(100);

/// Client-side state kept between runs: the session token, the role the
/// server granted at login, and the display theme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
}

/// Handles saving and loading the local state file, with a lock file so two
/// terminals logging in at once do not interleave writes
#[derive(Debug, Clone)]
pub struct StateStorage {
    file_path: PathBuf,
    lock_file_path: PathBuf,
    lock_timeout: Duration,
}

impl StateStorage {
    /// Creates a new StateStorage instance
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        let file_path = file_path.as_ref().to_path_buf();
        let lock_file_path = file_path.with_extension("yaml.lock");
        Self {
            file_path,
            lock_file_path,
            lock_timeout: LOCK_TIMEOUT,
        }
    }

    /// Wait at most `timeout` for the write lock
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Returns the path to the state file
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Loads the state file. A missing file is an empty state.
    pub fn load(&self) -> Result<LocalState> {
        if !self.file_path.exists() {
            return Ok(LocalState::default());
        }

        let content = fs::read_to_string(&self.file_path)
            .with_context(|| format!("Failed to read file: {:?}", self.file_path))?;
        if content.trim().is_empty() {
            return Ok(LocalState::default());
        }

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML from {:?}", self.file_path))
    }

    /// Saves the state file under the write lock
    pub fn save(&self, state: &LocalState) -> Result<()> {
        let _lock = self.lock_for_write()?;
        self.write_state(state)
    }

    /// Reload, apply `update_fn`, and save while holding the write lock
    pub fn update<F>(&self, update_fn: F) -> Result<LocalState>
    where
        F: FnOnce(&mut LocalState),
    {
        let _lock = self.lock_for_write()?;
        let mut state = self.load()?;
        update_fn(&mut state);
        self.write_state(&state)?;
        Ok(state)
    }

    /// Take the exclusive lock file, creating the state directory first.
    /// Writers hold the returned handle until their write is done.
    fn lock_for_write(&self) -> Result<File> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let mut lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to open lock file {:?}", self.lock_file_path))?;

        let deadline = Instant::now() + self.lock_timeout;
        while let Err(e) = lock_file.try_lock_exclusive() {
            if e.kind() != ErrorKind::WouldBlock {
                return Err(e)
                    .with_context(|| format!("Failed to lock {:?}", self.lock_file_path));
            }
            if Instant::now() >= deadline {
                bail!("Timed out waiting for the local state lock {:?}", self.lock_file_path);
            }
            thread::sleep(LOCK_RETRY);
        }

        let _ = writeln!(
            lock_file,
            "Locked by PID {} at {}",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        );
        Ok(lock_file)
    }

    fn write_state(&self, state: &LocalState) -> Result<()> {
        let yaml = serde_yaml::to_string(state)?;
        fs::write(&self.file_path, yaml)
            .with_context(|| format!("Failed to write local state to {:?}", self.file_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let storage = StateStorage::new(dir.path().join("state.yaml"));

        let state = storage.load().unwrap();
        assert_eq!(state, LocalState::default());
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let storage = StateStorage::new(dir.path().join("nested").join("state.yaml"));

        let state = LocalState {
            auth_token: Some("abc".into()),
            user_role: Some("user".into()),
            theme: Some(Theme::Dark),
        };
        storage.save(&state).unwrap();

        let loaded = storage.load().unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_update_keeps_other_fields() {
        let dir = TempDir::new().unwrap();
        let storage = StateStorage::new(dir.path().join("state.yaml"));
        storage
            .save(&LocalState {
                auth_token: Some("abc".into()),
                user_role: Some("user".into()),
                theme: None,
            })
            .unwrap();

        let updated = storage.update(|s| s.theme = Some(Theme::Light)).unwrap();
        assert_eq!(updated.auth_token.as_deref(), Some("abc"));
        assert_eq!(storage.load().unwrap().theme, Some(Theme::Light));
    }

    #[test]
    fn test_empty_file_loads_as_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.yaml");
        fs::write(&path, "").unwrap();

        let storage = StateStorage::new(&path);
        assert_eq!(storage.load().unwrap(), LocalState::default());
    }

    #[test]
    fn test_save_creates_directory_and_stamps_lock() {
        let dir = TempDir::new().unwrap();
        let storage = StateStorage::new(dir.path().join("a").join("b").join("state.yaml"));

        storage.save(&LocalState::default()).unwrap();
        assert!(storage.path().exists());
        let stamp = fs::read_to_string(storage.path().with_extension("yaml.lock")).unwrap();
        assert!(stamp.starts_with(&format!("Locked by PID {}", std::process::id())));
    }

    #[test]
    fn test_save_times_out_while_another_writer_holds_the_lock() {
        let dir = TempDir::new().unwrap();
        let storage = StateStorage::new(dir.path().join("state.yaml"))
            .with_lock_timeout(Duration::from_millis(250));

        let held = storage.lock_for_write().unwrap();
        let err = storage.save(&LocalState::default()).unwrap_err();
        assert!(err.to_string().contains("Timed out"));
        assert!(!storage.path().exists());

        drop(held);
        storage.save(&LocalState::default()).unwrap();
        assert!(storage.path().exists());
    }
}
