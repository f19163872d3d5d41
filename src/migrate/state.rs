//! Persisted migration state.
//!
//! A single JSON document at `<root>/<stateDir>/state.json`, written
//! atomically via `state.tmp.json`. Corrupted state is surfaced to the
//! caller, who warns and re-initializes; it is never silently discarded.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{HamletError, Result};

pub const STATE_FILE: &str = "state.json";
pub const STATE_TMP_FILE: &str = "state.tmp.json";
pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Converted,
    Failed,
    Skipped,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Converted => "converted",
            FileStatus::Failed => "failed",
            FileStatus::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl FileEntry {
    pub fn converted(confidence: u8) -> Self {
        Self {
            status: FileStatus::Converted,
            converted_at: Some(now_iso()),
            confidence: Some(confidence),
            error: None,
            reason: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: FileStatus::Failed,
            converted_at: None,
            confidence: None,
            error: Some(error.into()),
            reason: None,
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: FileStatus::Skipped,
            converted_at: None,
            confidence: None,
            error: None,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationState {
    pub version: u32,
    pub started_at: String,
    pub source: String,
    pub target: String,
    /// Keyed by project-relative path (forward slashes).
    pub files: std::collections::BTreeMap<String, FileEntry>,
}

impl MigrationState {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            version: STATE_VERSION,
            started_at: now_iso(),
            source: source.into(),
            target: target.into(),
            files: Default::default(),
        }
    }

    pub fn counts(&self) -> (usize, usize, usize) {
        let mut converted = 0;
        let mut skipped = 0;
        let mut failed = 0;
        for entry in self.files.values() {
            match entry.status {
                FileStatus::Converted => converted += 1,
                FileStatus::Skipped => skipped += 1,
                FileStatus::Failed => failed += 1,
            }
        }
        (converted, skipped, failed)
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// What loading found on disk.
pub enum LoadedState {
    Missing,
    Corrupted(String),
    Loaded(MigrationState),
}

/// Owns the state directory for one migration run.
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: state_dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.dir.join("backups")
    }

    pub fn load(&self) -> LoadedState {
        let path = self.dir.join(STATE_FILE);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => return LoadedState::Missing,
        };
        match serde_json::from_str::<MigrationState>(&content) {
            Ok(state) if state.version == STATE_VERSION => LoadedState::Loaded(state),
            Ok(state) => LoadedState::Corrupted(format!(
                "unsupported state version {}",
                state.version
            )),
            Err(err) => LoadedState::Corrupted(err.to_string()),
        }
    }

    /// Atomic save: write `state.tmp.json`, then rename over `state.json`.
    pub fn save(&self, state: &MigrationState) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| HamletError::io(format!("creating {}", self.dir.display()), e))?;
        let tmp = self.dir.join(STATE_TMP_FILE);
        let target = self.dir.join(STATE_FILE);
        let json = serde_json::to_string_pretty(state).expect("state serializes");
        fs::write(&tmp, format!("{json}\n"))
            .map_err(|e| HamletError::io(format!("writing {}", tmp.display()), e))?;
        fs::rename(&tmp, &target)
            .map_err(|e| HamletError::io(format!("renaming {}", tmp.display()), e))?;
        Ok(())
    }
}
