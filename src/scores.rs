use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// On-disk shape: one integer per game, keyed by the game's storage key.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ScoreFile {
    #[serde(flatten)]
    best: BTreeMap<String, u32>,
}

/// Best score per game, persisted as JSON.
pub struct BestScores {
    best: BTreeMap<String, u32>,
    path: PathBuf,
    /// Games whose finished run has already been recorded this session
    submitted: HashSet<&'static str>,
}

impl BestScores {
    /// Load scores from `path`. A missing or unreadable file starts empty.
    pub fn load(path: &Path) -> Self {
        let mut scores = BestScores {
            best: BTreeMap::new(),
            path: path.to_path_buf(),
            submitted: HashSet::new(),
        };
        match scores.read_file() {
            Ok(n) => debug!(entries = n, path = %path.display(), "loaded best scores"),
            Err(e) => warn!(error = %e, path = %path.display(), "ignoring best score file"),
        }
        scores
    }

    fn read_file(&mut self) -> Result<usize> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let file: ScoreFile = serde_json::from_str(&data)?;
        self.best = file.best;
        Ok(self.best.len())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = ScoreFile { best: self.best.clone() };
        fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> u32 {
        self.best.get(key).copied().unwrap_or(0)
    }

    /// Store `score` if it beats the current best. Returns true on a new best.
    pub fn record(&mut self, key: &str, score: u32) -> bool {
        if score == 0 || score <= self.get(key) {
            return false;
        }
        self.best.insert(key.to_string(), score);
        true
    }

    pub fn was_submitted(&self, key: &str) -> bool {
        self.submitted.contains(key)
    }

    pub fn mark_submitted(&mut self, key: &'static str) {
        self.submitted.insert(key);
    }

    /// Called once the game is running again
    pub fn clear_submitted(&mut self, key: &str) {
        self.submitted.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_only_keeps_improvements() {
        let dir = tempfile::tempdir().unwrap();
        let mut scores = BestScores::load(&dir.path().join("best.json"));
        assert!(scores.record("snakeBest", 120));
        assert!(!scores.record("snakeBest", 80));
        assert!(!scores.record("snakeBest", 120));
        assert!(scores.record("snakeBest", 130));
        assert_eq!(scores.get("snakeBest"), 130);
        assert_eq!(scores.get("tetrisBest"), 0);
    }

    #[test]
    fn test_zero_never_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut scores = BestScores::load(&dir.path().join("best.json"));
        assert!(!scores.record("flappyBest", 0));
        assert_eq!(scores.get("flappyBest"), 0);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("best.json");
        let mut scores = BestScores::load(&path);
        scores.record("breakoutBest", 450);
        scores.record("bestScoreFib", 89);
        scores.save().unwrap();

        let reloaded = BestScores::load(&path);
        assert_eq!(reloaded.get("breakoutBest"), 450);
        assert_eq!(reloaded.get("bestScoreFib"), 89);
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.json");
        fs::write(&path, "{ not json").unwrap();
        let scores = BestScores::load(&path);
        assert_eq!(scores.get("snakeBest"), 0);
    }

    #[test]
    fn test_submitted_flags() {
        let dir = tempfile::tempdir().unwrap();
        let mut scores = BestScores::load(&dir.path().join("best.json"));
        assert!(!scores.was_submitted("runnerBest"));
        scores.mark_submitted("runnerBest");
        assert!(scores.was_submitted("runnerBest"));
        scores.clear_submitted("runnerBest");
        assert!(!scores.was_submitted("runnerBest"));
    }
}
