use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverlapError {
    #[error("Failed to extract text from PDF: {0}")]
    Extraction(String),

    #[error("Target file '{}' not found. Please make sure it exists.", .0.display())]
    MissingTargetFile(PathBuf),

    #[error("Failed to highlight PDF: {0}")]
    Highlight(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
