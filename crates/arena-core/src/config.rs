//! Configuration types for the arena orchestrator.
//!
//! Configuration is read from a YAML file (`arena.yml` by default). Every
//! field has a default matching the standard competition setup, so an empty
//! or missing file yields a usable configuration.

use arena_proto::RecordingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Number of zones in the standard arena.
pub const DEFAULT_NUM_ZONES: usize = 2;

/// Standard match length in seconds.
pub const GAME_DURATION_SECONDS: u32 = 150;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Number of zones in the arena; every match must assign each of them.
    #[serde(default = "default_zones")]
    pub zones: usize,

    /// Match duration used when the caller does not override it.
    #[serde(default = "default_duration")]
    pub default_duration: u32,

    /// Simulation engine invocation.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Recording settings handed to the engine. `None` leaves the engine default.
    #[serde(default)]
    pub recording: Option<RecordingConfig>,
}

fn default_zones() -> usize {
    DEFAULT_NUM_ZONES
}

fn default_duration() -> u32 {
    GAME_DURATION_SECONDS
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            zones: default_zones(),
            default_duration: default_duration(),
            engine: EngineConfig::default(),
            recording: None,
        }
    }
}

/// How the simulation engine is launched and supervised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Executable name, resolved on `PATH`.
    #[serde(default = "default_command")]
    pub command: String,

    /// Arguments placed before the world file.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// World file, relative to the repository root.
    #[serde(default = "default_world")]
    pub world: PathBuf,

    /// Give up on the engine after this many seconds. `None` waits forever.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    /// Time between SIGTERM and a hard kill when the engine must be stopped.
    #[serde(default = "default_grace")]
    pub termination_grace_seconds: u64,
}

fn default_command() -> String {
    "webots".to_string()
}

fn default_args() -> Vec<String> {
    ["--batch", "--stdout", "--stderr", "--minimize", "--mode=realtime"]
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

fn default_world() -> PathBuf {
    PathBuf::from("worlds").join("Arena.wbt")
}

fn default_grace() -> u64 {
    5
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
            world: default_world(),
            timeout_seconds: None,
            termination_grace_seconds: default_grace(),
        }
    }
}

impl EngineConfig {
    /// Absolute path of the world file for a given repository root.
    pub fn world_path(&self, repo_root: &Path) -> PathBuf {
        if self.world.is_absolute() {
            self.world.clone()
        } else {
            repo_root.join(&self.world)
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    pub fn termination_grace(&self) -> Duration {
        Duration::from_secs(self.termination_grace_seconds)
    }
}

impl ArenaConfig {
    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        debug!(path = %path_ref.display(), "Loading configuration from file");
        let content = std::fs::read_to_string(path_ref)?;
        Self::parse_yaml(&content)
    }

    /// Parses configuration from a YAML string.
    pub fn parse_yaml(content: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        debug!(
            zones = config.zones,
            default_duration = config.default_duration,
            engine = %config.engine.command,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Checks the configuration, returning non-fatal warnings.
    pub fn validate(&self, repo_root: &Path) -> Result<Vec<ConfigWarning>, ConfigError> {
        if self.zones == 0 {
            return Err(ConfigError::Invalid(
                "zones must be at least 1".to_string(),
            ));
        }
        if self.default_duration == 0 {
            return Err(ConfigError::Invalid(
                "default_duration must be a positive number of seconds".to_string(),
            ));
        }
        if self.engine.command.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "engine.command must not be empty".to_string(),
            ));
        }

        let mut warnings = Vec::new();

        let world = self.engine.world_path(repo_root);
        if !world.exists() {
            warnings.push(ConfigWarning::MissingWorld(world));
        }

        if let Some(timeout) = self.engine.timeout_seconds
            && timeout < u64::from(self.default_duration)
        {
            warnings.push(ConfigWarning::TimeoutShorterThanMatch {
                timeout_seconds: timeout,
                duration_seconds: self.default_duration,
            });
        }

        Ok(warnings)
    }
}

/// Configuration warning emitted during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// The world file does not exist; the engine will fail to load it.
    MissingWorld(PathBuf),
    /// The engine would be stopped before a full-length match could finish.
    TimeoutShorterThanMatch {
        timeout_seconds: u64,
        duration_seconds: u32,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::MissingWorld(path) => {
                write!(f, "Warning: world file {} does not exist", path.display())
            }
            ConfigWarning::TimeoutShorterThanMatch {
                timeout_seconds,
                duration_seconds,
            } => write!(
                f,
                "Warning: engine timeout ({timeout_seconds}s) is shorter than the match duration ({duration_seconds}s)"
            ),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ArenaConfig::default();
        assert_eq!(config.zones, 2);
        assert_eq!(config.default_duration, 150);
        assert_eq!(config.engine.command, "webots");
        assert!(config.engine.args.contains(&"--batch".to_string()));
        assert!(config.engine.args.contains(&"--mode=realtime".to_string()));
        assert_eq!(config.engine.timeout(), None);
        assert!(config.recording.is_none());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ArenaConfig::parse_yaml("\n").unwrap();
        assert_eq!(config.zones, DEFAULT_NUM_ZONES);
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
zones: 4
default_duration: 120
engine:
  command: /opt/webots/webots
  timeout_seconds: 600
recording:
  quality: 75
"#;
        let config = ArenaConfig::parse_yaml(yaml).unwrap();
        assert_eq!(config.zones, 4);
        assert_eq!(config.default_duration, 120);
        assert_eq!(config.engine.command, "/opt/webots/webots");
        // Unspecified engine fields keep their defaults
        assert_eq!(config.engine.args, default_args());
        assert_eq!(config.engine.timeout(), Some(Duration::from_secs(600)));
        let recording = config.recording.unwrap();
        assert_eq!(recording.quality, 75);
        assert!(recording.enabled);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let config = ArenaConfig::parse_yaml("zones: 3\nfuture_option: true\n").unwrap();
        assert_eq!(config.zones, 3);
    }

    #[test]
    fn test_world_path_relative_to_repo_root() {
        let config = EngineConfig::default();
        assert_eq!(
            config.world_path(Path::new("/repo")),
            Path::new("/repo/worlds/Arena.wbt")
        );
    }

    #[test]
    fn test_validate_rejects_zero_zones() {
        let config = ArenaConfig {
            zones: 0,
            ..ArenaConfig::default()
        };
        assert!(matches!(
            config.validate(Path::new(".")),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_validate_warnings() {
        let repo = TempDir::new().unwrap();
        let mut config = ArenaConfig::default();
        config.engine.timeout_seconds = Some(10);

        let warnings = config.validate(repo.path()).unwrap();
        assert!(warnings
            .iter()
            .any(|w| matches!(w, ConfigWarning::MissingWorld(_))));
        assert!(warnings
            .iter()
            .any(|w| matches!(w, ConfigWarning::TimeoutShorterThanMatch { .. })));

        std::fs::create_dir_all(repo.path().join("worlds")).unwrap();
        std::fs::write(repo.path().join("worlds/Arena.wbt"), "#VRML_SIM").unwrap();
        config.engine.timeout_seconds = None;
        assert!(config.validate(repo.path()).unwrap().is_empty());
    }

    #[test]
    fn test_from_file_missing() {
        let err = ArenaConfig::from_file("/definitely/not/here/arena.yml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
