//! Persisted reconciliation state.
//!
//! The state file lives next to the diagram (`arch.yaml` →
//! `arch.state.json`) and maps each document id to the remote element that
//! represents it. It is only rewritten after a push has fully succeeded, and
//! the write goes through a temporary file so a crash never leaves a
//! half-written state behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::StateError;

/// Current state file format version.
pub const STATE_VERSION: u32 = 1;

/// Remote counterpart of one document entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    /// Identifier assigned by the canvas server.
    pub remote_id: String,
    /// Fingerprint of the entry when it was pushed.
    pub fingerprint: String,
}

/// Reconciliation state: what this tool created on the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// Format version.
    pub version: u32,
    /// Unix time in milliseconds of the last successful push.
    #[serde(default)]
    pub pushed_at: Option<u64>,
    /// Document id → remote mapping.
    #[serde(default)]
    pub mappings: BTreeMap<String, Mapping>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            pushed_at: None,
            mappings: BTreeMap::new(),
        }
    }
}

impl SyncState {
    /// Mapping for a document id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Mapping> {
        self.mappings.get(id)
    }

    /// Record a mapping, replacing any previous one.
    pub fn insert(&mut self, id: impl Into<String>, remote_id: impl Into<String>, fingerprint: impl Into<String>) {
        self.mappings.insert(
            id.into(),
            Mapping {
                remote_id: remote_id.into(),
                fingerprint: fingerprint.into(),
            },
        );
    }

    /// Number of mapped entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Whether nothing is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Location of a diagram's state file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    /// Use an explicit state file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// State file for a diagram: `{stem}.state.json` in the same directory.
    #[must_use]
    pub fn for_document(document: &Path) -> Self {
        let stem = document
            .file_stem()
            .map_or_else(|| "diagram".into(), |s| s.to_string_lossy());
        let path = document.with_file_name(format!("{stem}.state.json"));
        Self { path }
    }

    /// Path of the state file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the state, or an empty state if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Io`] if the file cannot be read,
    /// [`StateError::Corrupt`] if it cannot be parsed and
    /// [`StateError::UnsupportedVersion`] for unknown versions.
    pub fn load(&self) -> Result<SyncState, StateError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no state at {}, starting fresh", self.path.display());
                return Ok(SyncState::default());
            }
            Err(source) => {
                return Err(StateError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let state: SyncState =
            serde_json::from_str(&contents).map_err(|source| StateError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        if state.version != STATE_VERSION {
            return Err(StateError::UnsupportedVersion {
                path: self.path.clone(),
                version: state.version,
            });
        }

        Ok(state)
    }

    /// Stamp and write the state, replacing the previous file atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Io`] if the file cannot be written.
    pub fn save(&self, state: &mut SyncState) -> Result<(), StateError> {
        state.version = STATE_VERSION;
        state.pushed_at = Some(current_timestamp_ms());
        let json = serde_json::to_string_pretty(state)?;

        let tmp = self.path.with_extension("json.tmp");
        let io_err = |source| StateError::Io {
            path: self.path.clone(),
            source,
        };
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;

        tracing::debug!(
            "saved {} mappings to {}",
            state.mappings.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Get the current Unix timestamp in milliseconds.
fn current_timestamp_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| {
        #[allow(clippy::cast_possible_truncation)]
        {
            d.as_millis() as u64
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_path_next_to_document() {
        let file = StateFile::for_document(Path::new("/tmp/diagrams/arch.yaml"));
        assert_eq!(file.path(), Path::new("/tmp/diagrams/arch.state.json"));
    }

    #[test]
    fn test_missing_file_is_empty_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = StateFile::new(dir.path().join("none.state.json"));
        let state = file.load().expect("load");
        assert!(state.is_empty());
        assert_eq!(state.version, STATE_VERSION);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = StateFile::for_document(&dir.path().join("arch.yaml"));

        let mut state = SyncState::default();
        state.insert("api", "remote-1", "0123456789abcdef");
        state.insert("db", "remote-2", "fedcba9876543210");
        file.save(&mut state).expect("save");
        assert!(state.pushed_at.is_some());

        let loaded = file.load().expect("load");
        assert_eq!(loaded, state);
        assert_eq!(loaded.get("api").map(|m| m.remote_id.as_str()), Some("remote-1"));
        assert!(!dir.path().join("arch.state.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_state_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.state.json");
        std::fs::write(&path, "{ not json").expect("write");
        let err = StateFile::new(&path).load().unwrap_err();
        assert!(matches!(err, StateError::Corrupt { .. }));
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("v9.state.json");
        std::fs::write(&path, r#"{"version": 9, "mappings": {}}"#).expect("write");
        let err = StateFile::new(&path).load().unwrap_err();
        assert!(matches!(err, StateError::UnsupportedVersion { version: 9, .. }));
    }
}
