//! Error types for the moji translation pipeline.
//!
//! This module defines one error type per layer:
//!
//! - [`MappingError`] - Loading the CSV mapping table (always fatal)
//! - [`DocumentError`] - Reading or writing a single HTML document (recoverable per file)
//! - [`ConfigError`] - Malformed environment overrides
//! - [`PipelineError`] - Top-level batch orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries. The structural
//! transformer itself has no error type: it never fails.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Mapping Errors
// =============================================================================

/// Errors while loading the mapping table.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The mapping resource does not exist.
    #[error("Mapping table not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// Any other I/O or parse failure while reading the table.
    #[error("Failed to read mapping table {}: {message}", path.display())]
    ConfigReadError { path: PathBuf, message: String },
}

impl MappingError {
    /// Build a read error for an in-memory table (no backing file).
    pub fn read(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigReadError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Re-home an error raised on in-memory content onto the file it came from.
    pub(crate) fn at_path(self, path: &std::path::Path) -> Self {
        match self {
            Self::ConfigReadError { message, .. } => Self::ConfigReadError {
                path: PathBuf::from(path),
                message,
            },
            other => other,
        }
    }

    /// Classify an I/O error raised while opening the table.
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::ConfigNotFound { path }
        } else {
            Self::ConfigReadError {
                path,
                message: err.to_string(),
            }
        }
    }
}

// =============================================================================
// Document Errors
// =============================================================================

/// Errors for a single document. The batch driver records these and moves on.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Input document does not exist.
    #[error("Document not found: {}", path.display())]
    DocumentNotFound { path: PathBuf },

    /// Input document exists but could not be read or decoded.
    #[error("Failed to read {}: {source}", path.display())]
    DocumentReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output could not be persisted.
    #[error("Failed to write {}: {source}", path.display())]
    DocumentWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DocumentError {
    /// Classify an I/O error raised while reading `path`.
    pub fn reading(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::DocumentNotFound { path }
        } else {
            Self::DocumentReadError { path, source }
        }
    }

    /// Wrap an I/O error raised while writing `path`.
    pub fn writing(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DocumentWriteError {
            path: path.into(),
            source,
        }
    }

    /// The document this error is about.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::DocumentNotFound { path }
            | Self::DocumentReadError { path, .. }
            | Self::DocumentWriteError { path, .. } => path,
        }
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors from environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An override was present but could not be used.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level batch orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline::translate_directory`].
/// Per-document failures are not errors at this level; they end up in the
/// [`crate::transform::pipeline::BatchReport`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Mapping table could not be loaded.
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// Single-document failure outside of a batch.
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Input directory does not exist.
    #[error("Input directory not found: {}", .0.display())]
    InputDirNotFound(PathBuf),

    /// Input directory has no matching documents.
    #[error("No .{extension} files found in {}", dir.display())]
    NoDocuments { dir: PathBuf, extension: String },

    /// Directory-level I/O failure (listing input, creating output).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Report serialization failure.
    #[error("Report error: {0}")]
    Report(#[from] serde_json::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for mapping operations.
pub type MappingResult<T> = Result<T, MappingError>;

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
