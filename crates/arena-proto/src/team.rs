//! Team identifiers.
//!
//! A team is identified by a short code (usually a three letter acronym).
//! The identifier names the team's code archive (`{team}.zip`) and its output
//! directory, so it must be safe to use as a single path component.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Token used on the command line for a zone with no team in it.
pub const EMPTY_ZONE_TOKEN: &str = "-";

/// Error returned when a team identifier is not usable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TeamIdError {
    #[error("team identifier must not be empty")]
    Empty,

    #[error("team identifier '{0}' is not a valid file name")]
    InvalidPathComponent(String),
}

/// Identifier of a competing team.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamId(String);

impl TeamId {
    /// Creates a team identifier, rejecting values that cannot name a file.
    pub fn new(id: impl Into<String>) -> Result<Self, TeamIdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TeamIdError::Empty);
        }
        if id == "."
            || id == ".."
            || id.contains(['/', '\\', '\0'])
            || id.chars().any(char::is_whitespace)
        {
            return Err(TeamIdError::InvalidPathComponent(id));
        }
        Ok(Self(id))
    }

    /// Parses a zone slot token, where `-` means the zone is empty.
    pub fn parse_slot(token: &str) -> Result<Option<Self>, TeamIdError> {
        if token == EMPTY_ZONE_TOKEN {
            Ok(None)
        } else {
            Self::new(token).map(Some)
        }
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of this team's code archive.
    pub fn archive_file_name(&self) -> String {
        format!("{}.zip", self.0)
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TeamId {
    type Error = TeamIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TeamId> for String {
    fn from(id: TeamId) -> Self {
        id.0
    }
}
