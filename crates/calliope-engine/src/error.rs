//! Error types for control-surface and patch operations.

use std::path::PathBuf;
use thiserror::Error;

use calliope_core::NoteParseError;

/// Errors surfaced by the engine's control surface.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A note spelling could not be parsed; the engine state is unchanged.
    #[error("invalid note name: {0}")]
    InvalidNoteName(#[from] NoteParseError),

    /// No parameter with this symbolic name exists.
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),
}

/// Errors during patch load/save.
#[derive(Debug, Error)]
pub enum PatchError {
    /// Failed to read a patch file.
    #[error("failed to read patch '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a patch file.
    #[error("failed to write patch '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed patch JSON.
    #[error("failed to parse patch: {0}")]
    Json(#[from] serde_json::Error),

    /// The patch names a parameter the engine does not have.
    #[error("patch references unknown parameter '{0}'")]
    UnknownParameter(String),

    /// A modulation entry's enums do not decode.
    #[error("patch contains invalid modulation route ({source_id} -> {target})")]
    InvalidRoute {
        /// Serialized source discriminant.
        source_id: u8,
        /// Serialized target discriminant.
        target: u8,
    },
}
