use std::path::Path;

use crate::error::ProcessError;

/// A document as received from the user: its original name and raw bytes.
///
/// Only the extension of `filename` decides how the bytes are read.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Reads a local file, keeping only its file name.
    pub fn from_path(path: &Path) -> Result<Self, ProcessError> {
        let bytes = std::fs::read(path).map_err(|e| ProcessError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self { filename, bytes })
    }
}
