//! Match lifecycle orchestration.
//!
//! One call to [`MatchOrchestrator::run`] takes a match from team archives to
//! collated results:
//!
//! 1. enter a fresh arena workspace
//! 2. write the mode marker and match record
//! 3. stage every team's code into its zone
//! 4. run the simulation engine and wait for it
//! 5. on success, collate logs, the match file and recordings
//! 6. remove the workspace, whatever happened
//!
//! Nothing is retried. The first failure ends the match.

use crate::cancel::CancelSignal;
use crate::collate::{self, CollatedResult};
use crate::engine::SimulationEngine;
use crate::error::MatchError;
use crate::record;
use crate::staging;
use crate::workspace::WorkspaceContext;
use arena_proto::{EngineOutcome, MatchSpec};
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Runs single matches against an archives directory.
#[derive(Debug)]
pub struct MatchOrchestrator<E> {
    engine: E,
    archives_dir: PathBuf,
    workspace_parent: PathBuf,
}

impl<E: SimulationEngine> MatchOrchestrator<E> {
    /// Creates an orchestrator reading archives from and writing results to `archives_dir`.
    pub fn new(engine: E, archives_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            archives_dir: archives_dir.into(),
            workspace_parent: std::env::temp_dir(),
        }
    }

    /// Creates arena workspaces under `parent` instead of the system temp directory.
    pub fn with_workspace_parent(mut self, parent: impl Into<PathBuf>) -> Self {
        self.workspace_parent = parent.into();
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Runs one match end to end.
    ///
    /// The arena workspace is removed on every path. If removal fails after
    /// the match itself failed, the match error is returned and the cleanup
    /// failure is only logged.
    pub async fn run(
        &self,
        spec: &MatchSpec,
        cancel: CancelSignal,
    ) -> Result<CollatedResult, MatchError> {
        for team in spec.duplicate_teams() {
            warn!(team = %team, "Team is assigned to more than one zone");
        }

        let workspace = WorkspaceContext::enter_in(&self.workspace_parent, &spec.label())?;
        let result = self.run_in(&workspace, spec, cancel).await;
        let cleanup = workspace.close();

        match (result, cleanup) {
            (Ok(collated), Ok(())) => Ok(collated),
            (Ok(_), Err(cleanup_err)) => Err(cleanup_err.into()),
            (Err(match_err), Ok(())) => Err(match_err),
            (Err(match_err), Err(cleanup_err)) => {
                warn!(error = ?cleanup_err, "Arena cleanup also failed");
                Err(match_err)
            }
        }
    }

    async fn run_in(
        &self,
        workspace: &WorkspaceContext,
        spec: &MatchSpec,
        cancel: CancelSignal,
    ) -> Result<CollatedResult, MatchError> {
        record::write_record(workspace, spec)?;
        staging::stage(workspace, &self.archives_dir, spec.zone_assignments())?;

        if cancel.is_cancelled() {
            info!(match_number = spec.match_number(), "Match cancelled before launch");
            return Err(MatchError::Cancelled);
        }

        info!(
            match_number = spec.match_number(),
            engine = self.engine.command(),
            "Starting simulation"
        );
        let outcome = self
            .engine
            .run(workspace, cancel)
            .await
            .map_err(|source| MatchError::EngineIo {
                command: self.engine.command().to_string(),
                source,
            })?;
        self.check_outcome(workspace, outcome)?;

        let logs = collate::collate_logs(workspace, &self.archives_dir, spec)?;
        let match_file = collate::archive_match_file(workspace, &self.archives_dir, spec)?;
        let (recordings, textures_copied) =
            collate::archive_match_recordings(workspace, &self.archives_dir, &spec.label())?;

        info!(
            match_number = spec.match_number(),
            logs = logs.len(),
            recordings = recordings.len(),
            "Match complete"
        );

        Ok(CollatedResult {
            logs,
            match_file,
            recordings,
            textures_copied,
        })
    }

    fn check_outcome(
        &self,
        workspace: &WorkspaceContext,
        outcome: EngineOutcome,
    ) -> Result<(), MatchError> {
        debug!(outcome = %outcome, "Simulation finished");
        match outcome {
            EngineOutcome::Success => Ok(()),
            EngineOutcome::NotFound => Err(MatchError::EngineNotFound {
                command: self.engine.command().to_string(),
            }),
            EngineOutcome::ExitedNonZero(code) => Err(MatchError::EngineFailed {
                code,
                supervisor_log: read_supervisor_log(workspace),
            }),
            EngineOutcome::TimedOut => Err(MatchError::EngineTimedOut(
                self.engine.timeout().unwrap_or_default(),
            )),
            EngineOutcome::Cancelled => Err(MatchError::Cancelled),
        }
    }
}

fn read_supervisor_log(workspace: &WorkspaceContext) -> Option<String> {
    let path = workspace.supervisor_log();
    match fs::read(&path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read supervisor log");
            None
        }
    }
}
