use std::path::PathBuf;
use thiserror::Error;

/// Anything that went wrong while pulling a collection out of the store.
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("cannot open store {path:?}: {source}")]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },
    #[error("store query failed: {0}")]
    Store(#[from] rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error("setting '{0}' must not be empty")]
    EmptyMarker(&'static str),
}
