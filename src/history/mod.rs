//! Persistent log of accepted evaluations.
//!
//! Entries are appended in evaluation order, trimmed to a fixed capacity and
//! written to a JSON file after every change.

mod entry;

pub use entry::{HistoryEntry, Mode};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Timestamp format used for `created_at`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to write history file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Aggregate numbers about the log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryStats {
    pub total: usize,
    /// `created_at` of the newest entry.
    pub last: Option<String>,
}

/// On-disk layout.
#[derive(Debug, Serialize, Deserialize)]
struct HistoryFile {
    next_id: u64,
    /// Oldest first.
    entries: Vec<HistoryEntry>,
}

impl Default for HistoryFile {
    fn default() -> Self {
        Self {
            next_id: 1,
            entries: Vec::new(),
        }
    }
}

/// Bounded, append-only evaluation log.
pub struct HistoryStore {
    /// `None` keeps the log in memory only.
    path: Option<PathBuf>,
    max_entries: usize,
    data: HistoryFile,
}

impl HistoryStore {
    /// Open the log stored at `path`.
    ///
    /// A missing file starts an empty log. An unreadable or corrupt file is
    /// reported and replaced by an empty log on the next write.
    pub fn open(path: impl Into<PathBuf>, max_entries: usize) -> Self {
        let path = path.into();
        let data = load(&path);
        debug!(
            path = %path.display(),
            entries = data.entries.len(),
            "loaded history"
        );

        let mut store = Self {
            path: Some(path),
            max_entries: max_entries.max(1),
            data,
        };
        store.trim();
        store
    }

    /// A log that is never written to disk.
    pub fn in_memory(max_entries: usize) -> Self {
        Self {
            path: None,
            max_entries: max_entries.max(1),
            data: HistoryFile::default(),
        }
    }

    /// Append an evaluation stamped with the current local time.
    pub fn record(
        &mut self,
        mode: Mode,
        expression: &str,
        result: &str,
    ) -> Result<HistoryEntry, HistoryError> {
        let created_at = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.record_at(mode, expression, result, created_at)
    }

    fn record_at(
        &mut self,
        mode: Mode,
        expression: &str,
        result: &str,
        created_at: String,
    ) -> Result<HistoryEntry, HistoryError> {
        let entry = HistoryEntry {
            id: self.data.next_id,
            mode,
            expression: expression.to_string(),
            result: result.to_string(),
            created_at,
        };
        self.data.next_id += 1;
        self.data.entries.push(entry.clone());
        self.trim();
        self.save()?;
        Ok(entry)
    }

    /// Up to `limit` entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<HistoryEntry> {
        self.data.entries.iter().rev().take(limit).cloned().collect()
    }

    /// Drop every entry. Ids keep counting from where they were.
    pub fn clear(&mut self) -> Result<(), HistoryError> {
        self.data.entries.clear();
        self.save()
    }

    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            total: self.data.entries.len(),
            last: self.data.entries.last().map(|e| e.created_at.clone()),
        }
    }

    fn trim(&mut self) {
        let excess = self.data.entries.len().saturating_sub(self.max_entries);
        if excess > 0 {
            self.data.entries.drain(..excess);
        }
    }

    /// Write to a sibling temp file, then rename over the real one.
    fn save(&self) -> Result<(), HistoryError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let io_err = |source| HistoryError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(&self.data)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }
}

fn load(path: &Path) -> HistoryFile {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return HistoryFile::default(),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read history, starting empty");
            return HistoryFile::default();
        }
    };

    let mut data: HistoryFile = match serde_json::from_str(&contents) {
        Ok(data) => data,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "corrupt history file, starting empty");
            return HistoryFile::default();
        }
    };

    // Never hand out an id that is already on disk.
    let max_id = data.entries.iter().map(|e| e.id).max().unwrap_or(0);
    data.next_id = data.next_id.max(max_id + 1);
    data
}
