//! Operator-facing failure messages.
//!
//! Engine output can be long, and the operator's eye starts at the bottom of
//! the scrollback, so the line saying what went wrong is always printed last
//! and in bold.

use arena_core::MatchError;
use colored::Colorize;
use std::error::Error;

/// How loudly a line is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Normal,
    Strong,
}

/// One block of diagnostic output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub text: String,
    pub emphasis: Emphasis,
}

impl Diagnostic {
    fn normal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasis: Emphasis::Normal,
        }
    }

    fn strong(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasis: Emphasis::Strong,
        }
    }

    /// Renders the block in red, bold when strong.
    pub fn render(&self) -> String {
        match self.emphasis {
            Emphasis::Normal => self.text.red().to_string(),
            Emphasis::Strong => self.text.red().bold().to_string(),
        }
    }
}

/// Builds the diagnostics for a failed match, most actionable last.
pub fn failure_diagnostics(err: &MatchError) -> Vec<Diagnostic> {
    match err {
        MatchError::EngineFailed {
            code,
            supervisor_log: Some(log),
        } => vec![
            Diagnostic::normal(log.trim_end()),
            Diagnostic::strong(format!(
                "Simulation errored (exit code {code}). Competition supervisor logs are above."
            )),
        ],
        MatchError::EngineFailed {
            code,
            supervisor_log: None,
        } => vec![Diagnostic::strong(format!(
            "Simulation errored (exit code {code}). No supervisor logs were found - the simulator may have crashed."
        ))],
        MatchError::EngineNotFound { .. }
        | MatchError::EngineTimedOut(_)
        | MatchError::Cancelled => vec![Diagnostic::strong(err.to_string())],
        other => {
            let mut lines = Vec::new();
            if other.is_retryable() {
                lines.push(Diagnostic::normal(
                    "This failure may be transient; running the match again may succeed.",
                ));
            }
            lines.push(Diagnostic::strong(format!(
                "Match failed: {}",
                with_causes(other)
            )));
            lines
        }
    }
}

/// Formats `err` followed by each of its sources, `: `-separated.
fn with_causes(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Prints the diagnostics for `err` to stderr.
pub fn print_failure(err: &MatchError) {
    for diagnostic in failure_diagnostics(err) {
        eprintln!("{}", diagnostic.render());
    }
}
