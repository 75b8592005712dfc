//! Error types for the aider-mcp crate.

use std::path::PathBuf;
use std::time::Duration;

/// Typed failures surfaced by the server components.
///
/// Tool handlers translate these into failure envelopes; they never escape
/// the dispatcher as protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum AiderError {
    /// The `directory` argument does not point at an existing directory.
    #[error("directory does not exist: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// The target directory is not inside a git working tree.
    #[error("not a git repository: {path}")]
    NotAGitRepo { path: PathBuf },

    /// The executable could not be found when spawning a subprocess.
    ///
    /// Kept distinct from [`AiderError::ProcessFailed`]: a missing binary is
    /// an installation problem, a nonzero exit is a runtime one.
    #[error("executable not found: {program}")]
    ExecutableNotFound { program: String },

    /// A subprocess exited with a nonzero status.
    #[error("{program} exited with status {code}: {stderr}")]
    ProcessFailed {
        program: String,
        code: i32,
        stderr: String,
    },

    /// A subprocess exceeded its allotted run time and was killed.
    #[error("{program} timed out after {}s", timeout.as_secs())]
    ProcessTimeout { program: String, timeout: Duration },

    /// An empty command vector was passed to the process runner.
    #[error("empty command vector")]
    EmptyCommand,

    /// I/O error with the path it occurred on.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type for aider-mcp operations.
pub type AiderResult<T> = Result<T, AiderError>;
