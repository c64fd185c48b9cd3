use std::{
    fmt, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::BestScoreError;

/// Highest score recorded so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestScore {
    pub score: u64,
    pub achieved_at: DateTime<Utc>,
}

impl BestScore {
    #[must_use]
    pub fn now(score: u64) -> Self {
        Self {
            score,
            achieved_at: Utc::now(),
        }
    }
}

/// Persistence of the best score.
///
/// The board reads once at construction and writes when a game ends above the stored score.
/// Failures never stop a game; the board logs them and carries on.
pub trait BestScoreStore: fmt::Debug {
    fn load(&self) -> Result<Option<BestScore>, BestScoreError>;
    fn save(&mut self, best: &BestScore) -> Result<(), BestScoreError>;
}

/// Keeps the best score for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryBestScoreStore {
    best: Option<BestScore>,
}

impl MemoryBestScoreStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_best(best: BestScore) -> Self {
        Self { best: Some(best) }
    }
}

impl BestScoreStore for MemoryBestScoreStore {
    fn load(&self) -> Result<Option<BestScore>, BestScoreError> {
        Ok(self.best)
    }

    fn save(&mut self, best: &BestScore) -> Result<(), BestScoreError> {
        self.best = Some(*best);
        Ok(())
    }
}

/// Stores the best score as a small JSON document.
///
/// ```json
/// { "score": 1234, "achieved_at": "2024-05-01T12:00:00Z" }
/// ```
///
/// A missing file reads as "no best score yet".
#[derive(Debug, Clone)]
pub struct JsonFileBestScoreStore {
    path: PathBuf,
}

impl JsonFileBestScoreStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> BestScoreError {
        BestScoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl BestScoreStore for JsonFileBestScoreStore {
    fn load(&self) -> Result<Option<BestScore>, BestScoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        let best = serde_json::from_str(&text).map_err(|source| BestScoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(best))
    }

    fn save(&mut self, best: &BestScore) -> Result<(), BestScoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let text = serde_json::to_string_pretty(best).map_err(BestScoreError::Encode)?;
        fs::write(&self.path, text).map_err(|e| self.io_error(e))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("hexblox-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryBestScoreStore::new();
        assert_eq!(store.load().unwrap(), None);
        let best = BestScore::now(10);
        store.save(&best).unwrap();
        assert_eq!(store.load().unwrap(), Some(best));
    }

    #[test]
    fn test_json_file_round_trip() {
        let path = temp_path("best-round-trip.json");
        let mut store = JsonFileBestScoreStore::new(&path);
        assert_eq!(store.load().unwrap(), None);

        let best = BestScore {
            score: 1234,
            achieved_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        };
        store.save(&best).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"score\": 1234"));
        assert!(text.contains("2024-05-01T12:00:00Z"));
        assert_eq!(store.load().unwrap(), Some(best));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_json_file_parse_error() {
        let path = temp_path("best-corrupt.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();
        let err = JsonFileBestScoreStore::new(&path).load().unwrap_err();
        assert!(matches!(err, BestScoreError::Parse { .. }));
        fs::remove_file(&path).unwrap();
    }
}
