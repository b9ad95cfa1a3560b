//! Append-only JSONL record logs.
//!
//! Every load re-reads the file from the start. Lines that do not decode to a
//! JSON object are dropped, so a torn write at the tail of a file that is
//! still being appended to never fails the read.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::models::Record;

pub const METRICS_LOG: &str = "metrics";
pub const SIGNALS_LOG: &str = "signals";
pub const TRADES_LOG: &str = "trades";

/// Errors surfaced by [`RecordStore::load`].
///
/// A missing file is not an error; it loads as an empty log.
#[derive(Debug)]
pub enum RecordStoreError {
    InvalidName(String),
    Io { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for RecordStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(name) => write!(f, "invalid log name: {:?}", name),
            Self::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for RecordStoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidName(_) => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Read-only access to the record logs under one base directory.
#[derive(Debug, Clone)]
pub struct RecordStore {
    base_dir: PathBuf,
}

impl RecordStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Map a logical log name to its file under the base directory.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, RecordStoreError> {
        if name.is_empty()
            || name == "."
            || name.contains("..")
            || name.contains(|c: char| c == '/' || c == '\\')
        {
            return Err(RecordStoreError::InvalidName(name.to_string()));
        }

        let file_name = match name {
            // The upstream writer names its shadow-trade log after the paper executor.
            TRADES_LOG => "paper_trades.jsonl".to_string(),
            other => format!("{}.jsonl", other),
        };

        Ok(self.base_dir.join(file_name))
    }

    /// Load every decodable record of a log, oldest first.
    pub fn load(&self, name: &str) -> Result<Vec<Record>, RecordStoreError> {
        let path = self.path_for(name)?;

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(log_name = name, path = %path.display(), "Record log absent, treating as empty");
                return Ok(Vec::new());
            }
            Err(source) => return Err(RecordStoreError::Io { path, source }),
        };

        let records: Vec<Record> = decode_lines(&bytes).collect();

        let candidates = non_blank_lines(&bytes).count();
        if candidates > records.len() {
            debug!(
                log_name = name,
                decoded = records.len(),
                skipped = candidates - records.len(),
                "Skipped undecodable record lines"
            );
        }

        Ok(records)
    }
}

fn non_blank_lines(bytes: &[u8]) -> impl Iterator<Item = &[u8]> {
    bytes
        .split(|b| *b == b'\n')
        .map(|line| line.trim_ascii())
        .filter(|line| !line.is_empty())
}

/// Lazily decode newline-delimited JSON objects, dropping anything that does
/// not decode.
pub fn decode_lines(bytes: &[u8]) -> impl Iterator<Item = Record> + '_ {
    non_blank_lines(bytes).filter_map(|line| serde_json::from_slice::<Record>(line).ok())
}
