use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("Snapshot parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Preset not found: {0}")]
    PresetNotFound(String),
}

pub type Result<T> = std::result::Result<T, ForgeError>;
