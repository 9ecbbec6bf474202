use rusqlite;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StockpileError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("{0}")]
    UserInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Permission denied")]
    PermissionDenied,
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Configuration error: {0}")]
    Config(String),
}
