//! Error types for exrtiler-core.
//!
//! Per-job and per-record failures are not errors at this level: they are
//! carried inside reports. [`Error`] is reserved for preconditions the caller
//! violated and for failures of the collaborators (external tool, scene store).

use std::path::PathBuf;

use crate::asset::{AssetId, AssetState};

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting or switching assets.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input provided by the caller (zero concurrency, empty
    /// executable, unknown option names, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The external converter failed to launch, timed out or exited non-zero.
    #[error("tool error [{tool}]: {message}")]
    Tool { tool: String, message: String },

    /// The file resolved for conversion does not exist on disk.
    #[error("source file not found: {}", path.display())]
    MissingSourceFile { path: PathBuf },

    /// An operation was requested on a record in the wrong lifecycle state.
    #[error("cannot {operation} asset {id}: asset is {state}")]
    StateInconsistency {
        id: AssetId,
        state: AssetState,
        operation: &'static str,
    },

    /// The scene store rejected a read or write, or holds malformed data.
    #[error("scene error: {0}")]
    Scene(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a tool execution failed error.
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a missing source file error.
    pub fn missing_source(path: impl Into<PathBuf>) -> Self {
        Self::MissingSourceFile { path: path.into() }
    }

    /// Create a scene store error.
    pub fn scene(msg: impl Into<String>) -> Self {
        Self::Scene(msg.into())
    }
}
