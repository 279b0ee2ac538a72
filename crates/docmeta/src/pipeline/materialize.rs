use std::io::Write;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::ProcessError;
use crate::sanitize;

/// An uploaded document written to a uniquely named file on local storage.
///
/// The file is removed when the value is dropped, whatever way the
/// extraction ended. A failed removal is logged and otherwise ignored.
#[derive(Debug)]
pub struct MaterializedFile {
    path: PathBuf,
}

impl MaterializedFile {
    /// Writes `bytes` to `docmeta-<uuid><suffix>` inside `directory`.
    ///
    /// The name is created exclusively, so concurrent calls never share a file.
    pub fn create(directory: &Path, suffix: &str, bytes: &[u8]) -> Result<Self, ProcessError> {
        let path = directory.join(format!("docmeta-{}{}", Uuid::new_v4(), suffix));

        let file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| ProcessError::TempStorage {
                path: path.clone(),
                source: e,
            })?;
        let written = write_and_close(file, bytes);

        // The handle is closed, so the guard can remove the file on failure.
        let materialized = Self { path };
        written.map_err(|e| ProcessError::TempStorage {
            path: materialized.path.clone(),
            source: e,
        })?;

        tracing::debug!(
            file = %sanitize::redact_path(&materialized.path),
            bytes = bytes.len(),
            "Materialized upload"
        );

        Ok(materialized)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Writes and flushes `bytes`, closing `file` before returning.
fn write_and_close(mut file: std::fs::File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes)?;
    file.flush()
}

impl Drop for MaterializedFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(
                "Failed to remove temporary file {}: {}",
                sanitize::redact_path(&self.path),
                e
            );
        }
    }
}
