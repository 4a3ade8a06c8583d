//! Settings store backed by a TOML file on disk.
//!
//! Writes overwrite the file in place. Writers are serialized through an
//! advisory lock on a sidecar `<file>.lock`, so read-merge-write cycles from
//! several threads or processes do not lose each other's updates.

use fs2::FileExt;
use search_settings_config::CONFIG_FILE_NAME;
use search_settings_ports::ConfigStorePort;
use search_settings_shared::{ErrorCode, ErrorEnvelope, Result};
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File-backed settings store.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    /// Store at an explicit path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `config.toml` in the current working directory.
    #[must_use]
    pub fn in_working_dir() -> Self {
        Self::new(CONFIG_FILE_NAME)
    }

    /// Path of the settings file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the sidecar lock file.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_else(|| CONFIG_FILE_NAME.into());
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|error| self.write_error(error))
            },
            _ => Ok(()),
        }
    }

    fn open_lock_file(&self) -> Result<File> {
        self.ensure_parent_dir()?;
        let lock_path = self.lock_path();
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|error| {
                ErrorEnvelope::from(error)
                    .with_metadata("store", self.location())
                    .with_metadata("lock", lock_path.display().to_string())
            })
    }

    fn write_error(&self, error: std::io::Error) -> ErrorEnvelope {
        let message = format!("failed to write settings store: {error}");
        let cause = ErrorEnvelope::from(error);
        ErrorEnvelope::unexpected(ErrorCode::new("config", "write_failed"), message, cause.class)
            .with_metadata("store", self.location())
            .with_metadata("cause", cause.code.to_string())
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::in_working_dir()
    }
}

impl ConfigStorePort for FileConfigStore {
    fn describe(&self) -> String {
        self.location()
    }

    fn read_text(&self) -> Result<Option<Box<str>>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text.into_boxed_str())),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => {
                Err(ErrorEnvelope::from(error).with_metadata("store", self.location()))
            },
        }
    }

    fn write_text(&self, contents: &str) -> Result<()> {
        self.ensure_parent_dir()?;
        fs::write(&self.path, contents).map_err(|error| self.write_error(error))
    }

    fn with_exclusive_lock(&self, critical: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        let lock_file = self.open_lock_file()?;
        lock_file.lock_exclusive().map_err(|error| {
            ErrorEnvelope::from(error).with_metadata("store", self.location())
        })?;
        let result = critical();
        let unlocked = FileExt::unlock(&lock_file).map_err(|error| {
            ErrorEnvelope::from(error).with_metadata("store", self.location())
        });
        result.and(unlocked)
    }
}
