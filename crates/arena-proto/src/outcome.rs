//! Outcome of a simulation engine run.

use std::fmt;

/// How a run of the simulation engine ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineOutcome {
    /// The engine ran to completion and exited with status 0.
    Success,
    /// The engine executable could not be found or executed.
    NotFound,
    /// The engine exited with a non-zero status.
    ///
    /// On unix, termination by a signal is reported as `128 + signal`.
    ExitedNonZero(i32),
    /// The engine exceeded the configured timeout and was terminated.
    TimedOut,
    /// The run was cancelled by the caller and the engine was terminated.
    Cancelled,
}

impl EngineOutcome {
    /// Returns true only for a clean exit.
    pub fn is_success(self) -> bool {
        matches!(self, EngineOutcome::Success)
    }

    /// Short machine-friendly name of the outcome.
    pub fn as_str(self) -> &'static str {
        match self {
            EngineOutcome::Success => "success",
            EngineOutcome::NotFound => "not_found",
            EngineOutcome::ExitedNonZero(_) => "exited_non_zero",
            EngineOutcome::TimedOut => "timed_out",
            EngineOutcome::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EngineOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineOutcome::ExitedNonZero(code) => write!(f, "exited with code {code}"),
            other => f.write_str(other.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_success_is_success() {
        assert!(EngineOutcome::Success.is_success());
        assert!(!EngineOutcome::NotFound.is_success());
        assert!(!EngineOutcome::ExitedNonZero(7).is_success());
        assert!(!EngineOutcome::TimedOut.is_success());
        assert!(!EngineOutcome::Cancelled.is_success());
    }

    #[test]
    fn test_display_includes_exit_code() {
        assert_eq!(EngineOutcome::ExitedNonZero(7).to_string(), "exited with code 7");
        assert_eq!(EngineOutcome::TimedOut.to_string(), "timed_out");
    }
}
