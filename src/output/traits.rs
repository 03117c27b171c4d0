//! Output printer trait and error types
//!
//! A printer turns the pages of a finished run into text and can write that
//! text to a file with a fixed name.

use crate::state::Page;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Unknown printer '{0}', expected 'raw' or 'json'")]
    UnknownPrinter(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Renders and persists the pages of one run
pub trait PagePrinter {
    /// Renders `pages` as text
    fn render(&self, pages: &[Page]) -> OutputResult<String>;

    /// Name of the file `persist` writes
    fn file_name(&self) -> &'static str;

    /// Writes rendered output to `file_name()` inside `directory`
    ///
    /// # Arguments
    ///
    /// * `rendered` - Text previously returned by `render`
    /// * `directory` - Output directory, created if missing
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Path of the written file
    /// * `Err(OutputError)` - Failed to create the directory or the file
    fn persist(&self, rendered: &str, directory: &Path) -> OutputResult<PathBuf> {
        let path = directory.join(self.file_name());
        let write_error = |source: std::io::Error| OutputError::Write {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(directory).map_err(write_error)?;
        std::fs::write(&path, rendered).map_err(write_error)?;

        tracing::info!("Wrote {} bytes to {}", rendered.len(), path.display());
        Ok(path)
    }
}
