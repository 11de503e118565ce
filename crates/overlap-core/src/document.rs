//! Immutable PDF byte buffers

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::OverlapError;

/// Readers accept the `%PDF` header anywhere in the first kilobyte
const HEADER_WINDOW: usize = 1024;

/// An uploaded or on-disk PDF. Cloning shares the underlying bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    bytes: Arc<[u8]>,
}

impl Document {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Arc::from(bytes.into()),
        }
    }

    /// Read a document from disk.
    ///
    /// A missing file maps to [`OverlapError::MissingTargetFile`] so callers
    /// can report the path back to the user.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, OverlapError> {
        let path = path.as_ref();
        match std::fs::read(path) {
            Ok(bytes) => Ok(Self::from_bytes(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(OverlapError::MissingTargetFile(path.to_path_buf()))
            }
            Err(e) => Err(OverlapError::Io(e)),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Offset of the `%PDF` header, if it starts within the first 1024 bytes
    pub fn header_offset(&self) -> Option<usize> {
        let window = &self.bytes[..self.bytes.len().min(HEADER_WINDOW + 3)];
        window.windows(4).position(|w| w == b"%PDF")
    }

    /// Cheap magic-number check, used to reject non-PDF uploads early
    pub fn looks_like_pdf(&self) -> bool {
        self.header_offset()
            .is_some_and(|at| self.bytes.len() > at + 4)
    }

    /// The bytes from the header on, skipping any leading junk
    pub fn pdf_bytes(&self) -> &[u8] {
        &self.bytes[self.header_offset().unwrap_or(0)..]
    }
}

/// Where the comparison target comes from.
#[derive(Debug, Clone)]
pub enum TargetSource {
    Uploaded(Document),
    DefaultPath(PathBuf),
}

impl TargetSource {
    /// Load the target, failing before any other processing if the default
    /// file is absent.
    pub fn resolve(self) -> Result<Document, OverlapError> {
        match self {
            TargetSource::Uploaded(doc) => Ok(doc),
            TargetSource::DefaultPath(path) => Document::from_path(path),
        }
    }
}
