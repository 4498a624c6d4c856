use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid score file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config {path}: {source}")]
    TomlDe {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown game '{0}' (try --list)")]
    UnknownGame(String),
}

pub type Result<T> = std::result::Result<T, Error>;
