//! # arena-core
//!
//! Match lifecycle orchestration for the arena simulator.
//!
//! This crate provides:
//! - Configuration loading and validation
//! - Ephemeral arena workspaces, torn down on every exit path
//! - Staging of team code archives into arena zones
//! - The match record and competition-mode marker read by the engine
//! - Collation of logs, scores and recordings into the archives directory
//! - The orchestrator sequencing all of the above around one engine run

mod cancel;
mod collate;
mod config;
mod engine;
mod error;
mod orchestrator;
mod record;
mod staging;
pub mod testing;
pub mod workspace;

pub use arena_proto::{EngineOutcome, MatchSpec, MatchSpecError, RecordingConfig, TeamId};
pub use cancel::{CancelHandle, CancelSignal, cancel_pair};
pub use collate::{
    ARCHIVED_RECORDINGS_DIR, CollatedResult, CollationError, MATCHES_DIR, archive_match_file,
    archive_match_recordings, collate_logs,
};
pub use config::{
    ArenaConfig, ConfigError, ConfigWarning, DEFAULT_NUM_ZONES, EngineConfig,
    GAME_DURATION_SECONDS,
};
pub use engine::SimulationEngine;
pub use error::MatchError;
pub use orchestrator::MatchOrchestrator;
pub use record::{MatchRecord, RecordError, read_record, write_record};
pub use staging::{StagingError, stage};
pub use workspace::{ARENA_ROOT_ENV, WorkspaceContext, WorkspaceError};
