//! # arena-adapters
//!
//! Process-level adapters for the simulation engine.
//!
//! - `EngineCommand` builds the fixed, non-interactive engine invocation
//! - `EngineSupervisor` runs it as a child process and classifies the outcome,
//!   with an optional timeout and a terminate-then-kill path for timeouts and
//!   cancellation
//! - `probe_engine` checks that the engine launches and reports its version

mod detect;
mod engine_command;
mod supervisor;

pub use detect::{EngineProbe, probe_engine};
pub use engine_command::EngineCommand;
pub use supervisor::EngineSupervisor;
