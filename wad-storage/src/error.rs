//! Error types for WAD container operations

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WadError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid container format: {0}")]
    Format(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("No entry at {0}")]
    NotFound(String),

    #[error("{0} is not a directory")]
    NotADirectory(String),

    #[error("{0} is not a file")]
    NotAFile(String),
}

pub type Result<T> = std::result::Result<T, WadError>;
