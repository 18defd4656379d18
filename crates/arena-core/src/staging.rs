//! Staging of team code into arena zones.
//!
//! Every occupied zone gets a fresh directory holding the full contents of
//! the team's `{team}.zip` archive. Unoccupied zones are left absent so the
//! engine does not start a robot there.

use crate::workspace::WorkspaceContext;
use arena_proto::TeamId;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::ZipArchive;
use zip::result::ZipError;

/// Errors raised while staging team code.
#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("no code archive for team {team}: {path} does not exist")]
    ArchiveNotFound { team: TeamId, path: PathBuf },

    #[error("code archive for team {team} ({path}) could not be extracted")]
    ArchiveExtraction {
        team: TeamId,
        path: PathBuf,
        #[source]
        source: ZipError,
    },

    #[error("filesystem error staging {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StagingError {
    /// Whether retrying the match could plausibly succeed.
    ///
    /// Missing or corrupt archives need a human; plain I/O failures may be
    /// transient contention on the filesystem.
    pub fn is_retryable(&self) -> bool {
        match self {
            StagingError::ArchiveNotFound { .. } | StagingError::ArchiveExtraction { .. } => false,
            StagingError::Io { .. } => true,
        }
    }
}

/// Extracts each assigned team's archive into its zone directory.
///
/// Zones are processed in order. A leftover zone directory is removed before
/// anything else happens to that zone, including for empty zones.
pub fn stage(
    workspace: &WorkspaceContext,
    archives_dir: &Path,
    zone_assignments: &[Option<TeamId>],
) -> Result<(), StagingError> {
    for (zone_id, team) in zone_assignments.iter().enumerate() {
        let zone_path = workspace.zone_dir(zone_id);

        if zone_path.exists() {
            debug!(zone = zone_id, path = %zone_path.display(), "Removing stale zone directory");
            fs::remove_dir_all(&zone_path).map_err(|source| StagingError::Io {
                path: zone_path.clone(),
                source,
            })?;
        }

        let Some(team) = team else {
            debug!(zone = zone_id, "No team in zone");
            continue;
        };

        fs::create_dir(&zone_path).map_err(|source| StagingError::Io {
            path: zone_path.clone(),
            source,
        })?;

        let archive_path = archives_dir.join(team.archive_file_name());
        extract_archive(team, &archive_path, &zone_path)?;
        info!(zone = zone_id, team = %team, archive = %archive_path.display(), "Staged team code");
    }

    Ok(())
}

fn extract_archive(team: &TeamId, archive_path: &Path, dest: &Path) -> Result<(), StagingError> {
    let file = File::open(archive_path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            StagingError::ArchiveNotFound {
                team: team.clone(),
                path: archive_path.to_path_buf(),
            }
        } else {
            StagingError::Io {
                path: archive_path.to_path_buf(),
                source,
            }
        }
    })?;

    let extraction_error = |source| StagingError::ArchiveExtraction {
        team: team.clone(),
        path: archive_path.to_path_buf(),
        source,
    };

    let mut archive = ZipArchive::new(file).map_err(extraction_error)?;
    // Entries with absolute or `..` paths are refused by `extract`.
    archive.extract(dest).map_err(extraction_error)?;

    debug!(entries = archive.len(), dest = %dest.display(), "Archive extracted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::write_team_archive;
    use tempfile::TempDir;

    fn team(id: &str) -> Option<TeamId> {
        Some(TeamId::new(id).unwrap())
    }

    fn setup() -> (TempDir, TempDir, WorkspaceContext) {
        let archives = TempDir::new().unwrap();
        let parent = TempDir::new().unwrap();
        let ctx = WorkspaceContext::enter_in(parent.path(), "match-1").unwrap();
        (archives, parent, ctx)
    }

    #[test]
    fn test_zone_exists_iff_assigned() {
        let (archives, _parent, ctx) = setup();
        write_team_archive(archives.path(), "ABC", &[("robot.py", "print('abc')")]);
        write_team_archive(archives.path(), "XYZ", &[("robot.py", "print('xyz')")]);

        stage(&ctx, archives.path(), &[team("ABC"), None, team("XYZ"), None]).unwrap();

        assert!(ctx.zone_dir(0).is_dir());
        assert!(!ctx.zone_dir(1).exists());
        assert!(ctx.zone_dir(2).is_dir());
        assert!(!ctx.zone_dir(3).exists());
        assert_eq!(
            fs::read_to_string(ctx.zone_dir(2).join("robot.py")).unwrap(),
            "print('xyz')"
        );
    }

    #[test]
    fn test_preserves_directory_structure() {
        let (archives, _parent, ctx) = setup();
        write_team_archive(
            archives.path(),
            "ABC",
            &[
                ("robot.py", "import lib.helpers"),
                ("lib/__init__.py", ""),
                ("lib/helpers.py", "X = 1"),
            ],
        );

        stage(&ctx, archives.path(), &[team("ABC"), None]).unwrap();

        let zone = ctx.zone_dir(0);
        assert_eq!(fs::read_to_string(zone.join("lib/helpers.py")).unwrap(), "X = 1");
        let mut entries: Vec<_> = fs::read_dir(&zone)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        entries.sort();
        assert_eq!(entries, vec!["lib", "robot.py"]);
    }

    #[test]
    fn test_removes_stale_zone_state() {
        let (archives, _parent, ctx) = setup();
        write_team_archive(archives.path(), "ABC", &[("robot.py", "new")]);

        fs::create_dir_all(ctx.zone_dir(0)).unwrap();
        fs::write(ctx.zone_dir(0).join("stale.txt"), "old").unwrap();
        fs::create_dir_all(ctx.zone_dir(1)).unwrap();

        stage(&ctx, archives.path(), &[team("ABC"), None]).unwrap();

        assert!(!ctx.zone_dir(0).join("stale.txt").exists());
        assert!(ctx.zone_dir(0).join("robot.py").exists());
        assert!(!ctx.zone_dir(1).exists());
    }

    #[test]
    fn test_missing_archive() {
        let (archives, _parent, ctx) = setup();

        let err = stage(&ctx, archives.path(), &[None, team("NOPE")]).unwrap_err();
        match &err {
            StagingError::ArchiveNotFound { team, path } => {
                assert_eq!(team.as_str(), "NOPE");
                assert!(path.ends_with("NOPE.zip"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_corrupt_archive() {
        let (archives, _parent, ctx) = setup();
        fs::write(archives.path().join("BAD.zip"), b"this is not a zip file").unwrap();

        let err = stage(&ctx, archives.path(), &[team("BAD"), None]).unwrap_err();
        assert!(matches!(err, StagingError::ArchiveExtraction { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_empty_arena() {
        let (archives, _parent, ctx) = setup();
        stage(&ctx, archives.path(), &[None, None]).unwrap();
        assert_eq!(fs::read_dir(ctx.root()).unwrap().count(), 0);
    }
}
