//! Probing the engine executable before a match.

use std::fmt;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Longest a `--version` probe may take before the engine is considered unusable.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// What `<engine> --version` revealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineProbe {
    /// The engine ran and reported this version line.
    Available { version: String },
    /// The executable could not be launched.
    Missing,
    /// The executable launched but failed or hung.
    Unusable,
}

impl EngineProbe {
    pub fn is_available(&self) -> bool {
        matches!(self, EngineProbe::Available { .. })
    }
}

impl fmt::Display for EngineProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineProbe::Available { version } if version.is_empty() => f.write_str("yes"),
            EngineProbe::Available { version } => write!(f, "yes ({version})"),
            EngineProbe::Missing => f.write_str("no (not found on PATH)"),
            EngineProbe::Unusable => f.write_str("no (--version failed)"),
        }
    }
}

/// Runs `<command> --version` and reports the first line it prints.
pub async fn probe_engine(command: &str) -> EngineProbe {
    let output = Command::new(command)
        .arg("--version")
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    let probe = match tokio::time::timeout(PROBE_TIMEOUT, output).await {
        Ok(Ok(output)) if output.status.success() => EngineProbe::Available {
            version: String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or_default()
                .trim()
                .to_string(),
        },
        Ok(Ok(_)) | Err(_) => EngineProbe::Unusable,
        Ok(Err(_)) => EngineProbe::Missing,
    };
    debug!(command, probe = %probe, "Engine probe");
    probe
}
