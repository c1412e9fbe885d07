//! # Decode Error Types
//!
//! Error types for decoder resolution and the decoder lifecycle.
//!
//! Misuse of a closed decoder is deliberately *not* an error: those
//! operations return sentinel values (0 frames, -1 positions, `false`,
//! `None`) and emit a log event instead. `DecodeError` covers the
//! distinguishable failure causes: resolution failures, source I/O,
//! and codec open/decode failures.

use thiserror::Error;

/// Errors that can occur during decoder resolution and decoding.
#[derive(Error, Debug)]
pub enum DecodeError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    /// Failed to open or read the byte source.
    #[error("failed to open audio source: {0}")]
    Source(String),

    // ========================================================================
    // Resolution Errors
    // ========================================================================
    /// No registered plugin claims the source's MIME type or extension.
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// The source has no locator or no usable path extension.
    #[error(
        "the type of \"{locator}\" could not be determined: \
         the file's extension may be missing or may not match the file's type"
    )]
    UnknownFileType {
        /// Locator of the offending source, or a placeholder if absent.
        locator: String,
    },

    // ========================================================================
    // Decoder Errors
    // ========================================================================
    /// A plugin claimed the source but its open hook failed.
    #[error("failed to open decoder: {0}")]
    OpenFailed(String),

    /// Error while decoding the stream.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// The stream contains data the codec cannot recover from.
    #[error("corrupted audio stream: {0}")]
    CorruptedStream(String),

    /// Seeking is not supported by this decoder or source.
    #[error("seeking not supported")]
    SeekNotSupported,

    // ========================================================================
    // Region Errors
    // ========================================================================
    /// Region parameters are out of bounds for the inner stream.
    #[error("invalid region: {0}")]
    InvalidRegion(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// I/O error from the underlying source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error (logging setup, invalid filter, ...).
    #[error("configuration error: {0}")]
    Config(String),
}

impl DecodeError {
    /// Returns `true` if no registered plugin claims the format.
    ///
    /// Callers should report an unsupported format; retrying with the
    /// same registry will not succeed.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            DecodeError::UnsupportedFormat(_) | DecodeError::UnknownFileType { .. }
        )
    }

    /// Returns `true` if a plugin claimed the source but opening failed.
    ///
    /// Callers may retry, inspect the detail, or fall back to treating
    /// the source as unsupported.
    pub fn is_open_failure(&self) -> bool {
        matches!(
            self,
            DecodeError::OpenFailed(_) | DecodeError::Source(_) | DecodeError::Io(_)
        )
    }
}

/// Result type for decode operations.
pub type Result<T> = std::result::Result<T, DecodeError>;
