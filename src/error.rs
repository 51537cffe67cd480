use rootcause::prelude::Report;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccessLogError {
    #[error("Log file not found: {0}")]
    FileNotFound(String),

    #[error("Log file contains no lines: {0}")]
    EmptyInput(String),

    #[error("Failed to read log file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

pub type Result<T> = std::result::Result<T, Report<AccessLogError>>;
