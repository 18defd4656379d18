//! Collation of match outputs into the archives directory.
//!
//! After a successful run the engine has left behind, inside the arena:
//! a log per occupied zone, the match file rewritten with scores, and a
//! recording made of several files sharing one stem plus a `textures`
//! directory. These are copied next to the team archives in the layout the
//! scoring tooling expects.

use crate::workspace::{TEXTURES_DIR, WorkspaceContext};
use arena_proto::MatchSpec;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Output directory for renamed match files.
pub const MATCHES_DIR: &str = "matches";

/// Output directory for recordings.
pub const ARCHIVED_RECORDINGS_DIR: &str = "recordings";

/// Errors copying results out of the arena.
#[derive(Debug, thiserror::Error)]
pub enum CollationError {
    #[error("expected match output {0} was not produced")]
    MissingArtifact(PathBuf),

    #[error("failed to copy {from} to {to}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("filesystem error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid recording stem '{0}'")]
    Stem(String),
}

impl CollationError {
    /// Copy and filesystem errors may be transient; missing outputs are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CollationError::Copy { .. } | CollationError::Io { .. })
    }
}

/// Everything collated for one match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollatedResult {
    /// Team logs copied into `{archives}/{team}/`.
    pub logs: Vec<PathBuf>,
    /// The renamed match file.
    pub match_file: PathBuf,
    /// Recording files copied into `{archives}/recordings/`.
    pub recordings: Vec<PathBuf>,
    /// Whether the textures directory was copied by this match.
    pub textures_copied: bool,
}

/// Copies the teams' logs into directories next to their code archives.
pub fn collate_logs(
    workspace: &WorkspaceContext,
    archives_dir: &Path,
    spec: &MatchSpec,
) -> Result<Vec<PathBuf>, CollationError> {
    let mut copied = Vec::new();

    for (zone_id, team) in spec.occupied_zones() {
        let log_path = workspace.robot_log_path(zone_id);
        if !log_path.is_file() {
            return Err(CollationError::MissingArtifact(log_path));
        }

        let team_dir = archives_dir.join(team.as_str());
        ensure_dir(&team_dir)?;

        let dest = team_dir.join(WorkspaceContext::robot_log_file_name(zone_id));
        copy_file(&log_path, &dest)?;
        debug!(zone = zone_id, team = %team, dest = %dest.display(), "Collated robot log");
        copied.push(dest);
    }

    Ok(copied)
}

/// Copies the match file to `{archives}/matches/{NNN}.yaml`.
///
/// The file holds JSON, which any YAML reader accepts. An existing file for
/// the same match number is overwritten.
pub fn archive_match_file(
    workspace: &WorkspaceContext,
    archives_dir: &Path,
    spec: &MatchSpec,
) -> Result<PathBuf, CollationError> {
    let matches_dir = archives_dir.join(MATCHES_DIR);
    ensure_dir(&matches_dir)?;

    let source = workspace.match_file();
    if !source.is_file() {
        return Err(CollationError::MissingArtifact(source));
    }

    let dest = matches_dir.join(format!("{}.yaml", spec.padded_number()));
    copy_file(&source, &dest)?;
    info!(dest = %dest.display(), "Archived match file");
    Ok(dest)
}

/// Copies the match recording and its shared textures into `{archives}/recordings/`.
///
/// Only files named `{stem}.<ext>` are taken; the engine's recording
/// directory is not assumed to contain nothing else. The textures are the
/// same for every match, so an existing copy is left alone.
pub fn archive_match_recordings(
    workspace: &WorkspaceContext,
    archives_dir: &Path,
    recording_stem: &str,
) -> Result<(Vec<PathBuf>, bool), CollationError> {
    let recordings_dir = archives_dir.join(ARCHIVED_RECORDINGS_DIR);
    ensure_dir(&recordings_dir)?;

    let source_dir = workspace.recordings_dir();
    let pattern = Regex::new(&format!(r"^{}\..+$", regex::escape(recording_stem)))
        .map_err(|_| CollationError::Stem(recording_stem.to_string()))?;

    let mut copied = Vec::new();
    if source_dir.is_dir() {
        let entries = fs::read_dir(&source_dir).map_err(|source| CollationError::Io {
            path: source_dir.clone(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| CollationError::Io {
                path: source_dir.clone(),
                source,
            })?;
            let path = entry.path();
            let name = entry.file_name();
            if !path.is_file() || !pattern.is_match(&name.to_string_lossy()) {
                continue;
            }
            let dest = recordings_dir.join(&name);
            copy_file(&path, &dest)?;
            copied.push(dest);
        }
    }
    copied.sort();
    debug!(count = copied.len(), stem = recording_stem, "Archived recording files");

    let textures_src = source_dir.join(TEXTURES_DIR);
    let textures_dest = recordings_dir.join(TEXTURES_DIR);
    let textures_copied = if textures_dest.exists() {
        debug!(path = %textures_dest.display(), "Textures already archived");
        false
    } else {
        if !textures_src.is_dir() {
            return Err(CollationError::MissingArtifact(textures_src));
        }
        copy_dir_recursive(&textures_src, &textures_dest)?;
        true
    };

    Ok((copied, textures_copied))
}

fn ensure_dir(path: &Path) -> Result<(), CollationError> {
    fs::create_dir_all(path).map_err(|source| CollationError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn copy_file(from: &Path, to: &Path) -> Result<(), CollationError> {
    fs::copy(from, to)
        .map(|_| ())
        .map_err(|source| CollationError::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })
}

fn copy_dir_recursive(from: &Path, to: &Path) -> Result<(), CollationError> {
    ensure_dir(to)?;
    let entries = fs::read_dir(from).map_err(|source| CollationError::Io {
        path: from.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| CollationError::Io {
            path: from.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let dest = to.join(entry.file_name());
        if path.is_dir() {
            copy_dir_recursive(&path, &dest)?;
        } else {
            copy_file(&path, &dest)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_proto::TeamId;
    use tempfile::TempDir;

    fn spec(number: u32, teams: &[Option<&str>]) -> MatchSpec {
        MatchSpec::new(
            number,
            teams
                .iter()
                .map(|t| t.map(|id| TeamId::new(id).unwrap()))
                .collect(),
            teams.len(),
            150,
            None,
        )
        .unwrap()
    }

    fn setup() -> (TempDir, TempDir, WorkspaceContext) {
        let archives = TempDir::new().unwrap();
        let parent = TempDir::new().unwrap();
        let ctx = WorkspaceContext::enter_in(parent.path(), "match-1").unwrap();
        (archives, parent, ctx)
    }

    #[test]
    fn test_collate_logs_per_team() {
        let (archives, _parent, ctx) = setup();
        let spec = spec(1, &[Some("ABC"), None, Some("XYZ")]);
        for zone in [0, 2] {
            fs::create_dir_all(ctx.zone_dir(zone)).unwrap();
            fs::write(ctx.robot_log_path(zone), format!("zone {zone}")).unwrap();
        }
        // The team directory may already exist from an earlier match
        fs::create_dir_all(archives.path().join("ABC")).unwrap();

        let logs = collate_logs(&ctx, archives.path(), &spec).unwrap();

        assert_eq!(logs.len(), 2);
        assert_eq!(
            fs::read_to_string(archives.path().join("ABC/log-zone-0.txt")).unwrap(),
            "zone 0"
        );
        assert_eq!(
            fs::read_to_string(archives.path().join("XYZ/log-zone-2.txt")).unwrap(),
            "zone 2"
        );
    }

    #[test]
    fn test_collate_logs_missing_log() {
        let (archives, _parent, ctx) = setup();
        let spec = spec(1, &[Some("ABC"), None]);
        fs::create_dir_all(ctx.zone_dir(0)).unwrap();

        let err = collate_logs(&ctx, archives.path(), &spec).unwrap_err();
        assert!(matches!(err, CollationError::MissingArtifact(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_archive_match_file_overwrites() {
        let (archives, _parent, ctx) = setup();
        let spec = spec(4, &[None, None]);

        fs::write(ctx.match_file(), r#"{"scores": 1}"#).unwrap();
        let first = archive_match_file(&ctx, archives.path(), &spec).unwrap();
        fs::write(ctx.match_file(), r#"{"scores": 2}"#).unwrap();
        let second = archive_match_file(&ctx, archives.path(), &spec).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, archives.path().join("matches").join("004.yaml"));
        assert_eq!(fs::read_to_string(&second).unwrap(), r#"{"scores": 2}"#);
        assert_eq!(
            fs::read_dir(archives.path().join("matches")).unwrap().count(),
            1
        );
    }

    #[test]
    fn test_archive_recordings() {
        let (archives, _parent, ctx) = setup();
        let rec = ctx.recordings_dir();
        fs::create_dir_all(rec.join("textures")).unwrap();
        fs::write(rec.join("clip.mp4"), "video").unwrap();
        fs::write(rec.join("clip.srt"), "subs").unwrap();
        fs::write(rec.join("other.mp4"), "not ours").unwrap();
        fs::write(rec.join("clipper.mp4"), "not ours either").unwrap();
        fs::write(rec.join("textures/floor.png"), "png").unwrap();

        let (copied, textures_copied) =
            archive_match_recordings(&ctx, archives.path(), "clip").unwrap();

        let out = archives.path().join("recordings");
        assert_eq!(copied, vec![out.join("clip.mp4"), out.join("clip.srt")]);
        assert!(textures_copied);
        assert!(out.join("textures/floor.png").is_file());
        assert!(!out.join("other.mp4").exists());
        assert!(!out.join("clipper.mp4").exists());
    }

    #[test]
    fn test_existing_textures_tolerated() {
        let (archives, _parent, ctx) = setup();
        let rec = ctx.recordings_dir();
        fs::create_dir_all(rec.join("textures")).unwrap();
        fs::write(rec.join("clip.html"), "page").unwrap();
        fs::write(rec.join("textures/floor.png"), "new").unwrap();

        let existing = archives.path().join("recordings/textures");
        fs::create_dir_all(&existing).unwrap();
        fs::write(existing.join("floor.png"), "old").unwrap();

        let (copied, textures_copied) =
            archive_match_recordings(&ctx, archives.path(), "clip").unwrap();

        assert_eq!(copied.len(), 1);
        assert!(!textures_copied);
        assert_eq!(fs::read_to_string(existing.join("floor.png")).unwrap(), "old");
    }

    #[test]
    fn test_missing_textures_is_an_error() {
        let (archives, _parent, ctx) = setup();
        fs::create_dir_all(ctx.recordings_dir()).unwrap();

        let err = archive_match_recordings(&ctx, archives.path(), "clip").unwrap_err();
        assert!(matches!(err, CollationError::MissingArtifact(_)));
    }

    #[test]
    fn test_stem_is_matched_literally() {
        let (archives, _parent, ctx) = setup();
        let rec = ctx.recordings_dir();
        fs::create_dir_all(rec.join("textures")).unwrap();
        fs::write(rec.join("match-1.html"), "page").unwrap();
        fs::write(rec.join("matchX1.html"), "page").unwrap();

        let (copied, _) = archive_match_recordings(&ctx, archives.path(), "match-1").unwrap();
        assert_eq!(copied.len(), 1);
    }
}
