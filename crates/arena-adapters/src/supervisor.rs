//! Supervision of the simulation engine process.
//!
//! The engine runs as a child process while the orchestrator waits for it.
//! By default there is no time limit; with a timeout, or when the caller
//! cancels, the child receives SIGTERM, is given a grace period to shut
//! down, and is then killed.

use crate::engine_command::EngineCommand;
use arena_core::{CancelSignal, SimulationEngine, WorkspaceContext};
use arena_proto::EngineOutcome;
use async_trait::async_trait;
use std::io;
use std::process::ExitStatus;
use std::time::Duration;
use tokio::process::Child;
use tracing::{debug, info, warn};

/// Runs the engine and reports how it ended.
#[derive(Debug, Clone)]
pub struct EngineSupervisor {
    command: EngineCommand,
    timeout: Option<Duration>,
    grace: Duration,
}

enum Waited {
    Exited(ExitStatus),
    TimedOut,
    Cancelled,
}

impl EngineSupervisor {
    /// Creates a supervisor with no timeout and a 5 second termination grace period.
    pub fn new(command: EngineCommand) -> Self {
        Self {
            command,
            timeout: None,
            grace: Duration::from_secs(5),
        }
    }

    /// Stops the engine if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Time allowed between SIGTERM and a hard kill.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Terminates the child gracefully, killing it if it outlives the grace period.
    async fn stop(&self, child: &mut Child) -> io::Result<()> {
        send_sigterm(child);
        if let Ok(status) = tokio::time::timeout(self.grace, child.wait()).await {
            debug!(status = ?status?, "Engine exited after SIGTERM");
            return Ok(());
        }
        warn!(
            grace_secs = self.grace.as_secs(),
            "Engine ignored SIGTERM, killing"
        );
        child.kill().await
    }
}

/// Sends SIGTERM to the child process.
#[cfg(unix)]
fn send_sigterm(child: &Child) {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    if let Some(pid) = child.id() {
        let pid = Pid::from_raw(pid as i32);
        debug!(%pid, "Sending SIGTERM to engine");
        let _ = kill(pid, Signal::SIGTERM);
    }
}

#[cfg(not(unix))]
fn send_sigterm(_child: &Child) {}

/// Maps an exit status to an outcome; death by signal is reported as `128 + signal`.
fn classify(status: ExitStatus) -> EngineOutcome {
    if status.success() {
        return EngineOutcome::Success;
    }
    if let Some(code) = status.code() {
        return EngineOutcome::ExitedNonZero(code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return EngineOutcome::ExitedNonZero(128 + signal);
        }
    }
    EngineOutcome::ExitedNonZero(1)
}

#[async_trait]
impl SimulationEngine for EngineSupervisor {
    fn command(&self) -> &str {
        &self.command.command
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn run(
        &self,
        workspace: &WorkspaceContext,
        mut cancel: CancelSignal,
    ) -> io::Result<EngineOutcome> {
        if cancel.is_cancelled() {
            info!("Match cancelled before the engine was launched");
            return Ok(EngineOutcome::Cancelled);
        }

        let mut command = self.command.build(workspace);
        debug!(
            command = %self.command.command,
            args = ?self.command.argv(),
            arena = %workspace.root().display(),
            "Spawning simulation engine"
        );

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
                ) =>
            {
                warn!(command = %self.command.command, error = %e, "Engine could not be executed");
                return Ok(EngineOutcome::NotFound);
            }
            Err(e) => return Err(e),
        };

        // If this future is dropped mid-match, do not leave the engine running.
        let mut child = scopeguard::guard(child, |mut child| {
            if let Ok(None) = child.try_wait() {
                warn!("Engine supervision abandoned, killing engine");
                let _ = child.start_kill();
            }
        });

        let wait = async {
            tokio::select! {
                status = child.wait() => Ok::<_, io::Error>(Waited::Exited(status?)),
                () = cancel.cancelled() => Ok(Waited::Cancelled),
            }
        };

        let waited = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, wait).await {
                Ok(result) => result?,
                Err(_) => Waited::TimedOut,
            },
            None => wait.await?,
        };

        match waited {
            Waited::Exited(status) => {
                let outcome = classify(status);
                if outcome.is_success() {
                    info!("Simulation engine exited cleanly");
                } else {
                    warn!(outcome = %outcome, ?status, "Simulation engine failed");
                }
                Ok(outcome)
            }
            Waited::TimedOut => {
                warn!(
                    timeout_secs = self.timeout.unwrap_or_default().as_secs(),
                    "Engine timeout reached, stopping engine"
                );
                self.stop(&mut child).await?;
                Ok(EngineOutcome::TimedOut)
            }
            Waited::Cancelled => {
                info!("Match cancelled, stopping engine");
                self.stop(&mut child).await?;
                Ok(EngineOutcome::Cancelled)
            }
        }
    }
}
