//! Best score persisted as a small JSON file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::core::ScoreStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
struct ScoreFile {
    best_score: u32,
}

/// Best-score store backed by an optional JSON file
///
/// Without a path it behaves like an in-memory store.
#[derive(Debug, Clone, Default)]
pub struct JsonScoreStore {
    path: Option<PathBuf>,
    best: u32,
}

impl JsonScoreStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the best score from `path`; a missing file starts at zero
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let best = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let file: ScoreFile = serde_json::from_str(&text)
                .with_context(|| format!("invalid score file {}", path.display()))?;
            file.best_score
        } else {
            0
        };
        Ok(Self {
            path: Some(path),
            best,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn save(&self) -> Result<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        let text = serde_json::to_string_pretty(&ScoreFile {
            best_score: self.best,
        })?;
        std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
    }
}

impl ScoreStore for JsonScoreStore {
    fn best_score(&self) -> u32 {
        self.best
    }

    fn submit(&mut self, score: u32) -> bool {
        if score <= self.best {
            return false;
        }
        self.best = score;
        info!("new best score {}", score);
        if let Err(e) = self.save() {
            warn!("best score not saved: {:#}", e);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tui-boulder-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_in_memory_keeps_maximum() {
        let mut store = JsonScoreStore::in_memory();
        assert!(store.submit(300));
        assert!(!store.submit(200));
        assert!(!store.submit(300));
        assert_eq!(store.best_score(), 300);
        assert_eq!(store.path(), None);
    }

    #[test]
    fn test_best_score_survives_reopen() {
        let path = temp_path("scores.json");
        let _ = std::fs::remove_file(&path);

        let mut store = JsonScoreStore::open(&path).unwrap();
        assert_eq!(store.best_score(), 0);
        assert!(store.submit(1250));

        let reopened = JsonScoreStore::open(&path).unwrap();
        assert_eq!(reopened.best_score(), 1250);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let path = temp_path("corrupt-scores.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(JsonScoreStore::open(&path).is_err());
        let _ = std::fs::remove_file(&path);
    }
}
