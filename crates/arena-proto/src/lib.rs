//! # arena-proto
//!
//! Shared types for the arena match orchestrator.
//!
//! This crate provides the vocabulary used across the arena crates:
//! - Team identifiers and zone assignments
//! - The `MatchSpec` describing a single match
//! - Recording configuration handed to the simulation engine
//! - The tagged outcome of a simulation engine run

mod match_spec;
mod outcome;
mod team;

pub use match_spec::{MatchSpec, MatchSpecError, RecordingConfig, Resolution};
pub use outcome::EngineOutcome;
pub use team::{EMPTY_ZONE_TOKEN, TeamId, TeamIdError};
