use std::io;
use std::path::PathBuf;

use datasmith_schema::SchemaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("io error at {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("validation failed with {0} error(s)")]
    Validation(usize),
}

impl CliError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CliError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
