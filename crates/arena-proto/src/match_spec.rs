//! Match specification types.
//!
//! A `MatchSpec` identifies exactly one match: its number, which team (if
//! any) occupies each zone of the arena, how long it lasts and how it should
//! be recorded.

use crate::TeamId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Error returned when a match specification is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchSpecError {
    #[error("expected {expected} zone assignments, got {actual}")]
    ZoneCount { expected: usize, actual: usize },

    #[error("match duration must be a positive number of seconds")]
    ZeroDuration,
}

/// Pixel dimensions of the recorded video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Recording settings passed through to the simulation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Whether the engine should record the match at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Video resolution.
    #[serde(default)]
    pub resolution: Resolution,

    /// Encoder quality, 1-100.
    #[serde(default = "default_quality")]
    pub quality: u8,
}

fn default_true() -> bool {
    true
}

fn default_quality() -> u8 {
    100
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            resolution: Resolution::default(),
            quality: default_quality(),
        }
    }
}

/// Everything needed to identify and run one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpec {
    match_number: u32,
    zone_assignments: Vec<Option<TeamId>>,
    duration_seconds: u32,
    recording_config: Option<RecordingConfig>,
}

impl MatchSpec {
    /// Creates a match specification for an arena with `num_zones` zones.
    ///
    /// Duplicate team identifiers are accepted; see `duplicate_teams`.
    pub fn new(
        match_number: u32,
        zone_assignments: Vec<Option<TeamId>>,
        num_zones: usize,
        duration_seconds: u32,
        recording_config: Option<RecordingConfig>,
    ) -> Result<Self, MatchSpecError> {
        if zone_assignments.len() != num_zones {
            return Err(MatchSpecError::ZoneCount {
                expected: num_zones,
                actual: zone_assignments.len(),
            });
        }
        if duration_seconds == 0 {
            return Err(MatchSpecError::ZeroDuration);
        }

        Ok(Self {
            match_number,
            zone_assignments,
            duration_seconds,
            recording_config,
        })
    }

    pub fn match_number(&self) -> u32 {
        self.match_number
    }

    pub fn zone_assignments(&self) -> &[Option<TeamId>] {
        &self.zone_assignments
    }

    pub fn num_zones(&self) -> usize {
        self.zone_assignments.len()
    }

    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    pub fn recording_config(&self) -> Option<&RecordingConfig> {
        self.recording_config.as_ref()
    }

    /// Iterates over `(zone_id, team)` for every occupied zone, in zone order.
    pub fn occupied_zones(&self) -> impl Iterator<Item = (usize, &TeamId)> {
        self.zone_assignments
            .iter()
            .enumerate()
            .filter_map(|(zone_id, team)| team.as_ref().map(|t| (zone_id, t)))
    }

    /// Match number zero-padded to three digits, as used in archived file names.
    pub fn padded_number(&self) -> String {
        format!("{:03}", self.match_number)
    }

    /// Human-readable label, also used as the workspace suffix and recording stem.
    pub fn label(&self) -> String {
        format!("match-{}", self.match_number)
    }

    /// Teams which appear in more than one zone.
    pub fn duplicate_teams(&self) -> Vec<&TeamId> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for (_, team) in self.occupied_zones() {
            if !seen.insert(team) && !duplicates.contains(&team) {
                duplicates.push(team);
            }
        }
        duplicates
    }
}
