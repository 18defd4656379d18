//! Testing utilities: a scripted simulation engine and archive fixtures.

use crate::cancel::CancelSignal;
use crate::engine::SimulationEngine;
use crate::record;
use crate::workspace::{TEXTURES_DIR, WorkspaceContext};
use arena_proto::EngineOutcome;
use async_trait::async_trait;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use zip::ZipWriter;
use zip::write::FileOptions;

/// What a `ScriptedEngine` does when run.
#[derive(Debug, Clone)]
pub enum ScriptedRun {
    /// Behave like a completed match: write logs, scores and a recording.
    Succeed,
    /// Behave as if the executable is not installed.
    Missing,
    /// Exit with `code`, optionally after writing a supervisor log.
    Exit {
        code: i32,
        supervisor_log: Option<String>,
    },
    /// Run until cancelled.
    WaitForCancel,
}

/// What the engine could see in the arena when it started.
#[derive(Debug, Clone)]
pub struct Observed {
    pub root: PathBuf,
    /// Files under the zone directories, relative to the root, `/`-separated, sorted.
    pub zone_files: Vec<String>,
    pub mode: Option<String>,
}

/// In-process stand-in for the simulation engine.
#[derive(Debug)]
pub struct ScriptedEngine {
    run: ScriptedRun,
    observed: Mutex<Option<Observed>>,
}

impl ScriptedEngine {
    pub fn new(run: ScriptedRun) -> Self {
        Self {
            run,
            observed: Mutex::new(None),
        }
    }

    /// The arena as seen by the most recent run, if any.
    pub fn observed(&self) -> Option<Observed> {
        self.observed.lock().ok().and_then(|o| o.clone())
    }

    fn observe(&self, workspace: &WorkspaceContext) -> io::Result<()> {
        let root = workspace.root();
        let mut zone_files = Vec::new();
        for entry in fs::read_dir(root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() && entry.file_name().to_string_lossy().starts_with("zone-") {
                list_files(root, &entry.path(), &mut zone_files)?;
            }
        }
        zone_files.sort();

        let observed = Observed {
            root: root.to_path_buf(),
            zone_files,
            mode: fs::read_to_string(workspace.mode_file()).ok(),
        };
        if let Ok(mut slot) = self.observed.lock() {
            *slot = Some(observed);
        }
        Ok(())
    }
}

fn list_files(root: &Path, dir: &Path, out: &mut Vec<String>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            list_files(root, &path, out)?;
        } else if let Ok(relative) = path.strip_prefix(root) {
            let parts: Vec<_> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            out.push(parts.join("/"));
        }
    }
    Ok(())
}

/// Writes what a real engine leaves behind after a completed match.
fn write_match_outputs(workspace: &WorkspaceContext) -> io::Result<()> {
    let match_record = record::read_record(workspace).map_err(io::Error::other)?;

    let mut scores = serde_json::Map::new();
    for (zone_id, team) in match_record.teams.iter().enumerate() {
        let Some(team) = team else { continue };
        fs::write(
            workspace.robot_log_path(zone_id),
            format!("zone {zone_id} ({team}) started\n"),
        )?;
        scores.insert(team.clone(), serde_json::json!(zone_id * 10));
    }

    let mut value = serde_json::to_value(&match_record).map_err(io::Error::other)?;
    value["scores"] = serde_json::Value::Object(scores);
    fs::write(
        workspace.match_file(),
        serde_json::to_string_pretty(&value).map_err(io::Error::other)?,
    )?;

    let recordings = workspace.recordings_dir();
    let stem = format!("match-{}", match_record.match_number);
    fs::create_dir_all(recordings.join(TEXTURES_DIR))?;
    fs::write(recordings.join(format!("{stem}.html")), "<html></html>")?;
    fs::write(recordings.join(format!("{stem}.json")), "{}")?;
    fs::write(recordings.join(TEXTURES_DIR).join("floor.png"), "png")?;
    Ok(())
}

#[async_trait]
impl SimulationEngine for ScriptedEngine {
    fn command(&self) -> &str {
        "scripted-engine"
    }

    async fn run(
        &self,
        workspace: &WorkspaceContext,
        mut cancel: CancelSignal,
    ) -> io::Result<EngineOutcome> {
        self.observe(workspace)?;

        match &self.run {
            ScriptedRun::Succeed => {
                write_match_outputs(workspace)?;
                Ok(EngineOutcome::Success)
            }
            ScriptedRun::Missing => Ok(EngineOutcome::NotFound),
            ScriptedRun::Exit {
                code,
                supervisor_log,
            } => {
                if let Some(log) = supervisor_log {
                    fs::write(workspace.supervisor_log(), log)?;
                }
                Ok(EngineOutcome::ExitedNonZero(*code))
            }
            ScriptedRun::WaitForCancel => {
                cancel.cancelled().await;
                Ok(EngineOutcome::Cancelled)
            }
        }
    }
}

/// Creates `{dir}/{team}.zip` holding `files` as `(path, contents)` pairs.
///
/// # Panics
/// Panics if the archive cannot be written.
pub fn write_team_archive(dir: &Path, team: &str, files: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(format!("{team}.zip"));
    let file = File::create(&path).expect("create archive");
    let mut zip = ZipWriter::new(file);
    for (name, contents) in files {
        zip.start_file(*name, FileOptions::default())
            .expect("start archive entry");
        zip.write_all(contents.as_bytes())
            .expect("write archive entry");
    }
    zip.finish().expect("finish archive");
    path
}
