//! User configuration, read from `config.toml` in the platform config dir.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const APP_DIR: &str = "retro-arcade";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Milliseconds between game frames
    pub tick_ms: u64,
    /// Where best scores and the log file live
    pub data_dir: PathBuf,
    /// Game key to open on launch instead of the home screen
    pub start_game: Option<String>,
    /// Default tracing filter when RUST_LOG is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            data_dir: default_data_dir(),
            start_game: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        let mut config: Config = toml::from_str(&text).map_err(|source| Error::TomlDe {
            path: path.to_path_buf(),
            source,
        })?;
        // 0 would spin the event thread
        config.tick_ms = config.tick_ms.clamp(1, 1000);
        Ok(config)
    }

    pub fn scores_path(&self) -> PathBuf {
        self.data_dir.join("best_scores.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("retro-arcade.log")
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.tick_ms, 16);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "tick_ms = 33\nstart_game = \"tetris\"\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.tick_ms, 33);
        assert_eq!(config.start_game.as_deref(), Some("tetris"));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_zero_tick_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "tick_ms = 0\n").unwrap();
        assert_eq!(Config::load(&path).unwrap().tick_ms, 1);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "tick_ms = \"fast\"").unwrap();
        assert!(matches!(Config::load(&path), Err(Error::TomlDe { .. })));
    }
}
