//! Unified error types for chordline
//!
//! Error strategy:
//! - The analysis core has no failure modes: missing evidence yields no
//!   event, never an error. Errors exist only at the I/O boundary.
//! - Decode errors are recoverable (skip input, report), output and
//!   configuration errors are fatal.
//!
//! All errors include actionable suggestions where possible.

use std::path::PathBuf;
use thiserror::Error;

/// Supported audio formats for helpful error messages
pub const SUPPORTED_FORMATS: &str = "MP3, WAV, FLAC, AAC";

/// Top-level error type for chordline operations
#[derive(Debug, Error)]
pub enum ChordlineError {
    // =========================================================================
    // Recoverable errors - input could not be analyzed
    // =========================================================================
    #[error("Failed to decode audio file '{path}': {reason}\n  Supported formats: {SUPPORTED_FORMATS}\n  Tip: If the file plays in other apps, it may be corrupted or use an unsupported codec")]
    DecodeError { path: PathBuf, reason: String },

    #[error("Unsupported audio format for '{path}': {format}\n  Supported formats: {SUPPORTED_FORMATS}")]
    UnsupportedFormat { path: PathBuf, format: String },

    #[error("File not found: '{0}'\n  Tip: Check the path exists and is accessible")]
    FileNotFound(PathBuf),

    // =========================================================================
    // Fatal errors - abort the run
    // =========================================================================
    #[error("Cannot write output to '{path}': {reason}\n  Tip: Check write permissions for the output directory")]
    OutputError { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for chordline operations
pub type Result<T> = std::result::Result<T, ChordlineError>;

impl ChordlineError {
    /// Returns true if this error is recoverable (input-level, not systemic)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ChordlineError::DecodeError { .. }
                | ChordlineError::UnsupportedFormat { .. }
                | ChordlineError::FileNotFound(_)
        )
    }

    /// Create a decode error with context about the issue
    pub fn decode_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ChordlineError::DecodeError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an output error, checking for common issues
    pub fn output_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ChordlineError::OutputError {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
