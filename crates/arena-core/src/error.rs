//! Error type for a whole match.

use crate::collate::CollationError;
use crate::record::RecordError;
use crate::staging::StagingError;
use crate::workspace::WorkspaceError;
use std::time::Duration;

/// Why a match did not complete.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error("Could not find {command}. Check that you have it installed and on your PATH")]
    EngineNotFound { command: String },

    /// The engine exited non-zero. Carries the supervisor log when the
    /// engine got far enough to write one.
    #[error("Simulation errored (exit code {code})")]
    EngineFailed {
        code: i32,
        supervisor_log: Option<String>,
    },

    #[error("Simulation timed out after {}s and was stopped", .0.as_secs())]
    EngineTimedOut(Duration),

    #[error("Simulation was cancelled")]
    Cancelled,

    #[error("failed to run {command}")]
    EngineIo {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Collation(#[from] CollationError),
}

impl MatchError {
    /// Whether running the same match again could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            MatchError::Workspace(_) | MatchError::EngineIo { .. } => true,
            MatchError::Record(e) => e.is_retryable(),
            MatchError::Staging(e) => e.is_retryable(),
            MatchError::Collation(e) => e.is_retryable(),
            MatchError::EngineNotFound { .. }
            | MatchError::EngineFailed { .. }
            | MatchError::EngineTimedOut(_)
            | MatchError::Cancelled => false,
        }
    }

    /// Process exit code for this failure.
    ///
    /// - 2: the engine was stopped by the timeout
    /// - 130: interrupted (SIGINT = 128 + 2)
    /// - 1: everything else
    pub fn exit_code(&self) -> i32 {
        match self {
            MatchError::EngineTimedOut(_) => 2,
            MatchError::Cancelled => 130,
            _ => 1,
        }
    }
}
