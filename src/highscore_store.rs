use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{HIGH_SCORE_DEFAULT_NAME, HIGH_SCORE_SLOTS};
use crate::server_utils::sanitize_name;
use crate::types::{HighScoreEntry, HighScoreResponse};

const STORE_VERSION: u8 = 1;

#[derive(Debug, thiserror::Error)]
pub enum HighScoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed high-score file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported high-score file version {0}")]
    UnsupportedVersion(u8),

    #[error("invalid name {0:?}")]
    InvalidName(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct HighScoreFile {
    version: u8,
    #[serde(rename = "updatedAtIso", alias = "updated_at_iso", default)]
    updated_at_iso: String,
    entries: Vec<HighScoreEntry>,
}

/// Exactly ten entries, highest score first. Equal scores keep arrival order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighScoreTable {
    entries: Vec<HighScoreEntry>,
}

impl Default for HighScoreTable {
    fn default() -> Self {
        Self {
            entries: vec![default_entry(); HIGH_SCORE_SLOTS],
        }
    }
}

impl HighScoreTable {
    /// Builds a table from loaded rows, padding or truncating to ten.
    pub fn from_entries(entries: Vec<HighScoreEntry>) -> Self {
        let mut table = Self {
            entries: Vec::with_capacity(HIGH_SCORE_SLOTS + 1),
        };
        for entry in entries {
            let name = sanitize_name(&entry.name)
                .unwrap_or_else(|_| HIGH_SCORE_DEFAULT_NAME.to_string());
            table.entries.push(HighScoreEntry {
                name,
                score: entry.score,
            });
        }
        table.entries.sort_by(|a, b| b.score.cmp(&a.score));
        table.entries.truncate(HIGH_SCORE_SLOTS);
        table.entries.resize(HIGH_SCORE_SLOTS, default_entry());
        table
    }

    pub fn entries(&self) -> &[HighScoreEntry] {
        &self.entries
    }

    pub fn qualifies(&self, score: u32) -> bool {
        self.entries
            .last()
            .map(|lowest| score > lowest.score)
            .unwrap_or(true)
    }

    /// Returns the rank the entry landed on, or `None` when it fell off the table.
    pub fn insert(&mut self, name: String, score: u32) -> Option<usize> {
        let rank = self
            .entries
            .iter()
            .position(|entry| entry.score < score)
            .unwrap_or(self.entries.len());
        if rank >= HIGH_SCORE_SLOTS {
            return None;
        }
        self.entries.insert(rank, HighScoreEntry { name, score });
        self.entries.truncate(HIGH_SCORE_SLOTS);
        Some(rank)
    }
}

fn default_entry() -> HighScoreEntry {
    HighScoreEntry {
        name: HIGH_SCORE_DEFAULT_NAME.to_string(),
        score: 0,
    }
}

pub struct HighScoreStore {
    file_path: PathBuf,
    table: HighScoreTable,
}

impl HighScoreStore {
    /// Loads the table at `file_path`. Any failure falls back to the default table.
    pub fn new(file_path: PathBuf) -> Self {
        let table = match load_table(&file_path) {
            Ok(table) => table,
            Err(error) => {
                tracing::warn!(path = %file_path.display(), %error, "using default high scores");
                HighScoreTable::default()
            }
        };
        Self { file_path, table }
    }

    pub fn table(&self) -> &HighScoreTable {
        &self.table
    }

    pub fn qualifies(&self, score: u32) -> bool {
        self.table.qualifies(score)
    }

    /// Sanitizes `name`, inserts the entry and persists the table.
    pub fn submit(&mut self, name: &str, score: u32) -> Result<Option<usize>, HighScoreError> {
        let name = sanitize_name(name)?;
        let rank = self.table.insert(name, score);
        if rank.is_some() {
            self.save()?;
        }
        Ok(rank)
    }

    pub fn build_response(&self, requested_limit: Option<usize>) -> HighScoreResponse {
        let limit = requested_limit
            .unwrap_or(HIGH_SCORE_SLOTS)
            .clamp(1, HIGH_SCORE_SLOTS);
        HighScoreResponse {
            generated_at_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            entries: self.table.entries().iter().take(limit).cloned().collect(),
        }
    }

    pub fn save(&self) -> Result<(), HighScoreError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = HighScoreFile {
            version: STORE_VERSION,
            updated_at_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            entries: self.table.entries().to_vec(),
        };
        let text = serde_json::to_string_pretty(&payload)?;
        fs::write(&self.file_path, text)?;
        Ok(())
    }
}

fn load_table(path: &Path) -> Result<HighScoreTable, HighScoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Ok(HighScoreTable::default());
        }
        Err(error) => return Err(error.into()),
    };
    let parsed: HighScoreFile = serde_json::from_str(&text)?;
    if parsed.version != STORE_VERSION {
        return Err(HighScoreError::UnsupportedVersion(parsed.version));
    }
    Ok(HighScoreTable::from_entries(parsed.entries))
}
