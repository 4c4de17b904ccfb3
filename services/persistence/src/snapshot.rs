//! Book snapshot store
//!
//! One pretty-printed JSON file per symbol in a snapshot directory.
//! Loading skips corrupt files with a warning instead of failing the
//! whole startup; the skipped paths are reported so an operator can
//! inspect them.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use matching_engine::SymbolSnapshot;
use thiserror::Error;
use tracing::{info, warn};

/// Snapshot store failures.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result of loading a snapshot directory.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub snapshots: Vec<SymbolSnapshot>,
    /// Files that could not be parsed and were skipped.
    pub skipped: Vec<PathBuf>,
}

/// Directory-backed snapshot store, one JSON file per symbol.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one file per symbol, replacing existing files.
    pub fn save(&self, snapshots: &[SymbolSnapshot]) -> Result<(), SnapshotError> {
        fs::create_dir_all(&self.dir)?;
        for snapshot in snapshots {
            let path = self.file_path(snapshot.symbol.as_str());
            let json = serde_json::to_string_pretty(snapshot)?;
            fs::write(&path, json)?;
            info!(
                symbol = %snapshot.symbol,
                orders = snapshot.resting.len(),
                stops = snapshot.armed.len(),
                path = %path.display(),
                "snapshot written"
            );
        }
        Ok(())
    }

    /// Load every parseable snapshot in the directory.
    ///
    /// A missing directory yields an empty report. Corrupt files are
    /// skipped with a warning.
    pub fn load(&self) -> Result<LoadReport, SnapshotError> {
        let mut report = LoadReport::default();
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(report),
            Err(err) => return Err(err.into()),
        };

        for entry in entries {
            let path = entry?.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            match fs::read_to_string(&path) {
                Ok(contents) => match serde_json::from_str::<SymbolSnapshot>(&contents) {
                    Ok(snapshot) => report.snapshots.push(snapshot),
                    Err(err) => {
                        warn!(path = %path.display(), %err, "skipping corrupt snapshot file");
                        report.skipped.push(path);
                    }
                },
                Err(err) => {
                    warn!(path = %path.display(), %err, "skipping unreadable snapshot file");
                    report.skipped.push(path);
                }
            }
        }

        // Deterministic order regardless of directory listing order
        report.snapshots.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(report)
    }

    fn file_path(&self, symbol: &str) -> PathBuf {
        // Symbols may carry path separators; flatten them
        let safe: String = symbol
            .chars()
            .map(|c| if c == '/' || c == '\\' { '-' } else { c })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}
