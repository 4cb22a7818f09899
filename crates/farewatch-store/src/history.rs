use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use farewatch_core::PriceHistoryEntry;
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Every recorded check, keyed by [`history_key`].
///
/// Serializes as a flat JSON object. Keys sort by date label, then by time of
/// check, so the file reads chronologically per date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceHistory(BTreeMap<String, PriceHistoryEntry>);

impl PriceHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `entry` under `key`, replacing any entry already there.
    pub fn record(&mut self, key: String, entry: PriceHistoryEntry) {
        if self.0.insert(key.clone(), entry).is_some() {
            tracing::debug!(%key, "history entry overwritten");
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PriceHistoryEntry> {
        self.0.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, String, PriceHistoryEntry> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a PriceHistory {
    type Item = (&'a String, &'a PriceHistoryEntry);
    type IntoIter = std::collections::btree_map::Iter<'a, String, PriceHistoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// `{date_label}_{YYYYMMDD_HHMM}`. Two checks of one date within the same
/// minute share a key.
#[must_use]
pub fn history_key(date_label: &str, checked_at: &DateTime<Local>) -> String {
    format!("{date_label}_{}", checked_at.format("%Y%m%d_%H%M"))
}

/// Loads and saves a [`PriceHistory`] at a fixed path.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the history file. A missing file is an empty history.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read, or
    /// [`StoreError::Json`] if it does not parse.
    pub async fn load(&self) -> Result<PriceHistory, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no history file yet; starting empty");
                return Ok(PriceHistory::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let history: PriceHistory =
            serde_json::from_str(&content).map_err(|e| StoreError::Json {
                path: self.path.display().to_string(),
                source: e,
            })?;
        tracing::debug!(path = %self.path.display(), entries = history.len(), "history loaded");
        Ok(history)
    }

    /// Writes the whole history as pretty-printed JSON.
    ///
    /// The content goes to a sibling `.tmp` file first, which is then renamed
    /// over the target, so a crash mid-write leaves the previous file intact.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be written or renamed.
    pub async fn persist(&self, history: &PriceHistory) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(history).map_err(|e| StoreError::Json {
            path: self.path.display().to_string(),
            source: e,
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        tracing::debug!(path = %self.path.display(), entries = history.len(), "history saved");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
