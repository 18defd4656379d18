//! Match record and operating-mode marker.
//!
//! The engine reads both files once at startup: the mode marker tells it to
//! run a competition match rather than a practice session, and the match
//! record tells it which team is in which zone and for how long to run.
//! The engine later rewrites the match file with the scores.

use crate::workspace::{COMPETITION_MODE, WorkspaceContext};
use arena_proto::{MatchSpec, RecordingConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Errors writing or reading the match record.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("failed to write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize match record")]
    Json(#[from] serde_json::Error),
}

impl RecordError {
    /// Serialization failures are deterministic; only I/O may be transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RecordError::Io { .. })
    }
}

/// Match metadata as persisted for the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_number: u32,
    /// Team per zone, `null` for an empty zone.
    pub teams: Vec<Option<String>>,
    /// Match duration in seconds.
    pub duration: u32,
    pub recording_config: Option<RecordingConfig>,
}

impl MatchRecord {
    pub fn from_spec(spec: &MatchSpec) -> Self {
        Self {
            match_number: spec.match_number(),
            teams: spec
                .zone_assignments()
                .iter()
                .map(|team| team.as_ref().map(|t| t.as_str().to_string()))
                .collect(),
            duration: spec.duration_seconds(),
            recording_config: spec.recording_config().cloned(),
        }
    }
}

/// Marks the workspace as a competition match and persists the match record.
pub fn write_record(workspace: &WorkspaceContext, spec: &MatchSpec) -> Result<(), RecordError> {
    let mode_file = workspace.mode_file();
    fs::write(&mode_file, format!("{COMPETITION_MODE}\n")).map_err(|source| RecordError::Io {
        path: mode_file.clone(),
        source,
    })?;

    let record = MatchRecord::from_spec(spec);
    let json = serde_json::to_string_pretty(&record)?;
    let match_file = workspace.match_file();
    fs::write(&match_file, json).map_err(|source| RecordError::Io {
        path: match_file.clone(),
        source,
    })?;

    debug!(
        match_number = record.match_number,
        path = %match_file.display(),
        "Match record written"
    );
    Ok(())
}

/// Reads the match record back from the workspace.
pub fn read_record(workspace: &WorkspaceContext) -> Result<MatchRecord, RecordError> {
    let match_file = workspace.match_file();
    let content = fs::read_to_string(&match_file).map_err(|source| RecordError::Io {
        path: match_file.clone(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_proto::TeamId;
    use tempfile::TempDir;

    #[test]
    fn test_write_record() {
        let parent = TempDir::new().unwrap();
        let ctx = WorkspaceContext::enter_in(parent.path(), "match-9").unwrap();
        let spec = MatchSpec::new(
            9,
            vec![Some(TeamId::new("ABC").unwrap()), None],
            2,
            150,
            Some(RecordingConfig::default()),
        )
        .unwrap();

        write_record(&ctx, &spec).unwrap();

        assert_eq!(fs::read_to_string(ctx.mode_file()).unwrap(), "comp\n");

        let record = read_record(&ctx).unwrap();
        assert_eq!(record.match_number, 9);
        assert_eq!(record.teams, vec![Some("ABC".to_string()), None]);
        assert_eq!(record.duration, 150);
        assert_eq!(record.recording_config, Some(RecordingConfig::default()));
    }

    #[test]
    fn test_record_json_shape() {
        let parent = TempDir::new().unwrap();
        let ctx = WorkspaceContext::enter_in(parent.path(), "match-2").unwrap();
        let spec = MatchSpec::new(2, vec![None, Some(TeamId::new("XYZ").unwrap())], 2, 90, None)
            .unwrap();

        write_record(&ctx, &spec).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(ctx.match_file()).unwrap()).unwrap();
        assert_eq!(value["match_number"], 2);
        assert_eq!(value["teams"], serde_json::json!([null, "XYZ"]));
        assert_eq!(value["duration"], 90);
        assert!(value["recording_config"].is_null());
    }
}
