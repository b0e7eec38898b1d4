use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search query is empty")]
    EmptyQuery,

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Invalid regex pattern: {0}")]
    InvalidRegex(String),

    #[error("Read failed: {0}")]
    Io(#[from] std::io::Error),
}
