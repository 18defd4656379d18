//! Ephemeral arena workspaces.
//!
//! Each match runs inside its own scratch directory, the "arena root". The
//! simulation engine finds everything it needs (zone code, the match record,
//! the operating mode) relative to that root, and writes its logs, score file
//! and recordings back into it.
//!
//! The arena root is never published through process-wide state. A
//! `WorkspaceContext` is passed to every component that resolves
//! arena-relative paths, and the engine child process receives it through the
//! `ARENA_ROOT` environment variable set on the child alone.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Environment variable through which the engine learns its arena root.
pub const ARENA_ROOT_ENV: &str = "ARENA_ROOT";

/// Operating-mode marker file, relative to the arena root.
pub const MODE_FILE: &str = "robot_mode.txt";

/// Contents of the mode marker for competition matches.
pub const COMPETITION_MODE: &str = "comp";

/// Match record / score file, relative to the arena root.
pub const MATCH_FILE: &str = "match.json";

/// Log written by the engine's competition supervisor.
pub const SUPERVISOR_LOG_FILE: &str = "supervisor-log.txt";

/// Directory the engine writes recordings into.
pub const RECORDINGS_DIR: &str = "recordings";

/// Shared texture assets next to the recordings.
pub const TEXTURES_DIR: &str = "textures";

/// Errors creating or tearing down a workspace.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("failed to create arena workspace")]
    Create(#[source] std::io::Error),

    #[error("failed to remove arena workspace {path}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Handle to the arena root of one match.
///
/// The directory is removed when the context is closed or dropped, whatever
/// happened in between.
#[derive(Debug)]
pub struct WorkspaceContext {
    dir: TempDir,
}

impl WorkspaceContext {
    /// Creates a fresh arena root in the system temp directory.
    ///
    /// `suffix` becomes part of the directory name to make it recognisable.
    pub fn enter(suffix: &str) -> Result<Self, WorkspaceError> {
        Self::enter_in(&std::env::temp_dir(), suffix)
    }

    /// Creates a fresh arena root under `parent`.
    pub fn enter_in(parent: &Path, suffix: &str) -> Result<Self, WorkspaceError> {
        let suffix = format!("-{suffix}");
        let dir = tempfile::Builder::new()
            .prefix("arena-")
            .suffix(&suffix)
            .tempdir_in(parent)
            .map_err(WorkspaceError::Create)?;

        info!("Using {:?} as the arena", dir.path());
        Ok(Self { dir })
    }

    /// The arena root directory.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Directory holding the code of the robot in `zone_id`.
    pub fn zone_dir(&self, zone_id: usize) -> PathBuf {
        self.root().join(format!("zone-{zone_id}"))
    }

    /// Name of the log file the engine writes for the robot in `zone_id`.
    pub fn robot_log_file_name(zone_id: usize) -> String {
        format!("log-zone-{zone_id}.txt")
    }

    /// Full path of the robot log for `zone_id`.
    pub fn robot_log_path(&self, zone_id: usize) -> PathBuf {
        self.zone_dir(zone_id)
            .join(Self::robot_log_file_name(zone_id))
    }

    pub fn mode_file(&self) -> PathBuf {
        self.root().join(MODE_FILE)
    }

    pub fn match_file(&self) -> PathBuf {
        self.root().join(MATCH_FILE)
    }

    pub fn supervisor_log(&self) -> PathBuf {
        self.root().join(SUPERVISOR_LOG_FILE)
    }

    pub fn recordings_dir(&self) -> PathBuf {
        self.root().join(RECORDINGS_DIR)
    }

    /// Removes the arena root, reporting any failure.
    ///
    /// Dropping the context also removes the directory but swallows errors.
    pub fn close(self) -> Result<(), WorkspaceError> {
        let path = self.root().to_path_buf();
        debug!(path = %path.display(), "Removing arena workspace");
        self.dir
            .close()
            .map_err(|source| WorkspaceError::Cleanup { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_creates_named_directory() {
        let parent = TempDir::new().unwrap();
        let ctx = WorkspaceContext::enter_in(parent.path(), "match-12").unwrap();

        assert!(ctx.root().is_dir());
        assert!(ctx.root().starts_with(parent.path()));
        let name = ctx.root().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.contains("match-12"), "unexpected name {name}");
    }

    #[test]
    fn test_two_workspaces_are_distinct() {
        let parent = TempDir::new().unwrap();
        let a = WorkspaceContext::enter_in(parent.path(), "match-1").unwrap();
        let b = WorkspaceContext::enter_in(parent.path(), "match-1").unwrap();
        assert_ne!(a.root(), b.root());
    }

    #[test]
    fn test_close_removes_contents() {
        let parent = TempDir::new().unwrap();
        let ctx = WorkspaceContext::enter_in(parent.path(), "match-3").unwrap();
        let root = ctx.root().to_path_buf();
        std::fs::create_dir_all(ctx.zone_dir(0).join("nested")).unwrap();
        std::fs::write(ctx.robot_log_path(0), "log").unwrap();

        ctx.close().unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn test_drop_removes_directory() {
        let parent = TempDir::new().unwrap();
        let root = {
            let ctx = WorkspaceContext::enter_in(parent.path(), "match-4").unwrap();
            std::fs::write(ctx.match_file(), "{}").unwrap();
            ctx.root().to_path_buf()
        };
        assert!(!root.exists());
    }

    #[test]
    fn test_layout() {
        let parent = TempDir::new().unwrap();
        let ctx = WorkspaceContext::enter_in(parent.path(), "match-5").unwrap();
        let root = ctx.root();

        assert_eq!(ctx.zone_dir(1), root.join("zone-1"));
        assert_eq!(ctx.robot_log_path(1), root.join("zone-1").join("log-zone-1.txt"));
        assert_eq!(ctx.mode_file(), root.join("robot_mode.txt"));
        assert_eq!(ctx.match_file(), root.join("match.json"));
        assert_eq!(ctx.supervisor_log(), root.join("supervisor-log.txt"));
        assert_eq!(ctx.recordings_dir(), root.join("recordings"));
    }

    #[test]
    fn test_enter_does_not_touch_process_environment() {
        let before = std::env::var_os(ARENA_ROOT_ENV);
        let parent = TempDir::new().unwrap();
        let ctx = WorkspaceContext::enter_in(parent.path(), "match-6").unwrap();
        assert_eq!(std::env::var_os(ARENA_ROOT_ENV), before);
        ctx.close().unwrap();
        assert_eq!(std::env::var_os(ARENA_ROOT_ENV), before);
    }
}
