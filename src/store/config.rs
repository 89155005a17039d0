//! Store configuration and per-session settings

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::SessionId;

use super::error::{StoreError, StoreResult};

/// Environment variable holding the store directory
pub const ENV_PATH: &str = "SEQSTORE_PATH";
/// Environment variable toggling fsync after every durable write
pub const ENV_SYNC: &str = "SEQSTORE_SYNC";
/// Environment variable enabling strict replay
pub const ENV_STRICT_REPLAY: &str = "SEQSTORE_STRICT_REPLAY";

fn default_sync() -> bool {
    true
}

/// Configuration for a file-backed store
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileStoreConfig {
    /// Directory holding the store files
    pub path: PathBuf,
    /// Whether to fsync after every durable write
    #[serde(default = "default_sync")]
    pub sync: bool,
    /// Report malformed index lines in the middle of the log as errors
    /// instead of treating them as the end of the log
    #[serde(default)]
    pub strict_replay: bool,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("store"),
            sync: true,
            strict_replay: false,
        }
    }
}

impl FileStoreConfig {
    /// Create config with custom store directory
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.path = path.as_ref().to_path_buf();
        self
    }

    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    pub fn with_strict_replay(mut self, strict_replay: bool) -> Self {
        self.strict_replay = strict_replay;
        self
    }

    /// Get the store directory path
    pub fn dir(&self) -> &Path {
        &self.path
    }

    /// Build a config from `SEQSTORE_*` environment variables.
    ///
    /// A relative `SEQSTORE_PATH` is resolved against the current directory.
    pub fn from_env() -> StoreResult<Self> {
        let mut config = Self::default();

        if let Ok(path) = env::var(ENV_PATH) {
            let path = PathBuf::from(path);
            config.path = if path.is_absolute() {
                path
            } else {
                env::current_dir()
                    .unwrap_or_else(|_| PathBuf::from("."))
                    .join(path)
            };
        }
        if let Ok(value) = env::var(ENV_SYNC) {
            config.sync = parse_bool(ENV_SYNC, &value)?;
        }
        if let Ok(value) = env::var(ENV_STRICT_REPLAY) {
            config.strict_replay = parse_bool(ENV_STRICT_REPLAY, &value)?;
        }

        Ok(config)
    }
}

/// Accepts the usual spellings of a boolean setting
pub fn parse_bool(name: &str, value: &str) -> StoreResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "y" | "yes" | "true" | "on" => Ok(true),
        "0" | "n" | "no" | "false" | "off" => Ok(false),
        other => Err(StoreError::Config(format!(
            "{} must be a boolean, got {:?}",
            name, other
        ))),
    }
}

/// Per-session override inside [`StoreSettings`]
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    pub session: SessionId,
    #[serde(flatten)]
    pub store: FileStoreConfig,
}

/// Settings for a [`FileStoreFactory`](super::FileStoreFactory)
///
/// ```json
/// {
///   "default": { "path": "/var/lib/fix", "sync": true },
///   "dynamic_sessions": false,
///   "sessions": [
///     { "session": { "begin_string": "FIX.4.4", "sender_comp_id": "A", "target_comp_id": "B" },
///       "path": "/var/lib/fix/a-b" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSettings {
    /// Used for dynamic sessions
    #[serde(default)]
    pub default: FileStoreConfig,
    /// Accept sessions that have no explicit entry
    #[serde(default)]
    pub dynamic_sessions: bool,
    #[serde(default)]
    pub sessions: Vec<SessionSettings>,
}

impl StoreSettings {
    pub fn from_json_str(json: &str) -> StoreResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|source| StoreError::io("reading settings", path, source))?;
        Self::from_json_str(&content)
    }

    /// Reject settings naming the same session twice
    fn validate(&self) -> StoreResult<()> {
        let mut seen = HashSet::new();
        for entry in &self.sessions {
            if !seen.insert(&entry.session) {
                return Err(StoreError::Config(format!(
                    "session {} is configured more than once",
                    entry.session
                )));
            }
        }
        Ok(())
    }
}
