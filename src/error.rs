// src/error.rs

use std::path::{Path, PathBuf};
use thiserror::Error;

/// A document that could not be turned into records. Every variant names
/// the document so a batch can report it and move on.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The file could not be read at all.
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Strict decoding was requested and the bytes are not UTF-8.
    #[error("'{path}' is not valid UTF-8: {source}")]
    Encoding {
        path: PathBuf,
        source: std::str::Utf8Error,
    },

    /// Binary content where an HTML page was expected.
    #[error("'{path}' does not look like an HTML document")]
    NotHtml { path: PathBuf },
}

impl ExtractionError {
    pub fn path(&self) -> &Path {
        match self {
            ExtractionError::Read { path, .. }
            | ExtractionError::Encoding { path, .. }
            | ExtractionError::NotHtml { path } => path,
        }
    }

    /// Just the file name, for short user-facing reports.
    pub fn file_name(&self) -> String {
        self.path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path().display().to_string())
    }
}

/// Problems loading a settings file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read settings '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid settings in '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}
