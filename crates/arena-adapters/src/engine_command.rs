//! Engine invocation.

use arena_core::{ARENA_ROOT_ENV, EngineConfig, WorkspaceContext};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// The command line used to run one match in the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    /// Executable, resolved on `PATH`.
    pub command: String,
    /// Fixed flags (batch mode, minimized window, real-time pacing).
    pub args: Vec<String>,
    /// World file passed as the final argument.
    pub world: PathBuf,
    /// Working directory for the engine.
    pub repo_root: PathBuf,
}

impl EngineCommand {
    /// Builds the invocation from configuration.
    pub fn from_config(config: &EngineConfig, repo_root: &Path) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            world: config.world_path(repo_root),
            repo_root: repo_root.to_path_buf(),
        }
    }

    /// Full argument vector, world file last.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = self.args.clone();
        argv.push(self.world.to_string_lossy().into_owned());
        argv
    }

    /// Creates the process command for `workspace`.
    ///
    /// The arena root reaches the engine through `ARENA_ROOT` on the child
    /// only; stdout and stderr are shared with the orchestrator.
    pub fn build(&self, workspace: &WorkspaceContext) -> Command {
        let mut command = Command::new(&self.command);
        command
            .args(self.argv())
            .env(ARENA_ROOT_ENV, workspace.root())
            .current_dir(&self.repo_root)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        command
    }
}

impl std::fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.command)?;
        for arg in self.argv() {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_invocation() {
        let command = EngineCommand::from_config(&EngineConfig::default(), Path::new("/repo"));
        assert_eq!(command.command, "webots");
        assert_eq!(
            command.argv(),
            vec![
                "--batch",
                "--stdout",
                "--stderr",
                "--minimize",
                "--mode=realtime",
                "/repo/worlds/Arena.wbt",
            ]
        );
    }

    #[test]
    fn test_display() {
        let command = EngineCommand {
            command: "engine".to_string(),
            args: vec!["--batch".to_string()],
            world: PathBuf::from("w.wbt"),
            repo_root: PathBuf::from("."),
        };
        assert_eq!(command.to_string(), "engine --batch w.wbt");
    }
}
