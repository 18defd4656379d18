//! Seam between the orchestrator and the simulation engine.

use crate::cancel::CancelSignal;
use crate::workspace::WorkspaceContext;
use arena_proto::EngineOutcome;
use async_trait::async_trait;
use std::time::Duration;

/// Something that can run one match inside an arena workspace.
///
/// Implementations block (asynchronously) until the engine has finished,
/// timed out, or been cancelled, and never leave an engine process behind.
#[async_trait]
pub trait SimulationEngine: Send + Sync {
    /// Name of the engine executable, for diagnostics.
    fn command(&self) -> &str;

    /// Time after which the engine is stopped, if any.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Runs the engine against `workspace`.
    ///
    /// Failure to locate the executable is reported as
    /// `EngineOutcome::NotFound`, not as an error.
    async fn run(
        &self,
        workspace: &WorkspaceContext,
        cancel: CancelSignal,
    ) -> std::io::Result<EngineOutcome>;
}
