// ABOUTME: Mutex-guarded JSON file stores for session continuity and per-channel model preferences
// ABOUTME: Each store is a whole-file read-modify-write map; corrupt files read as an empty map

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

/// Persistent string-to-string map backed by a single pretty-printed JSON file.
///
/// Every operation holds the store's mutex around the full read-file,
/// mutate, write-file cycle, so interleaved get/set calls from concurrent
/// tasks cannot lose updates to distinct keys. Racing writers to the same
/// key resolve last-committed-wins. Atomicity holds within one process
/// only; concurrent external writers to the same file are unsupported.
pub struct JsonMapStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonMapStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the persisted value for key, or None if never set or the
    /// backing file does not yet exist
    pub fn get(&self, key: &str) -> Option<String> {
        let _guard = self.guard();
        self.read_map().remove(key)
    }

    /// Persists value under key, creating the backing file and parent
    /// directories if absent. Visible to any subsequent get as soon as
    /// this returns.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.guard();
        let mut map = self.read_map();
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // A panic mid-cycle must not wedge the store for later callers
        match self.lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn read_map(&self) -> HashMap<String, String> {
        match std::fs::read_to_string(&self.path) {
            // A file that is not the expected JSON object reads as empty
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => HashMap::new(),
        }
    }

    fn write_map(&self, map: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create data directory {}", parent.display())
            })?;
        }
        let json = serde_json::to_string_pretty(map).context("Failed to serialize store")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

/// Maps a Slack thread ts to the Claude session id that continues it
pub struct SessionStore {
    inner: JsonMapStore,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: JsonMapStore::new(path),
        }
    }

    pub fn get(&self, thread_ts: &str) -> Option<String> {
        self.inner.get(thread_ts)
    }

    pub fn set(&self, thread_ts: &str, session_id: &str) -> Result<()> {
        self.inner.set(thread_ts, session_id)
    }
}

/// Maps a Slack channel id to its pinned model alias
pub struct ModelStore {
    inner: JsonMapStore,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: JsonMapStore::new(path),
        }
    }

    /// Unknown or stale persisted values read as no preference
    pub fn get(&self, channel: &str) -> Option<ModelAlias> {
        self.inner.get(channel).and_then(|v| v.parse().ok())
    }

    pub fn set(&self, channel: &str, model: ModelAlias) -> Result<()> {
        self.inner.set(channel, model.as_str())
    }
}

/// The closed set of model aliases a channel can be pinned to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelAlias {
    Haiku,
    Opus,
    Sonnet,
}

impl ModelAlias {
    pub const ALL: [ModelAlias; 3] = [ModelAlias::Haiku, ModelAlias::Opus, ModelAlias::Sonnet];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelAlias::Haiku => "haiku",
            ModelAlias::Opus => "opus",
            ModelAlias::Sonnet => "sonnet",
        }
    }

    /// Comma-separated alias list for user-facing messages
    pub fn valid_list() -> String {
        Self::ALL
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ModelAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelAlias {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "haiku" => Ok(ModelAlias::Haiku),
            "opus" => Ok(ModelAlias::Opus),
            "sonnet" => Ok(ModelAlias::Sonnet),
            other => Err(format!("unknown model alias: {}", other)),
        }
    }
}
