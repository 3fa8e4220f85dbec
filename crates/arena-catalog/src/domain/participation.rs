//! Participation modes.

use std::fmt;
use std::str::FromStr;

use arena_core::error::DomainError;
use serde::{Deserialize, Serialize};

/// How players take part in a session built from a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationMode {
    /// A single player; the roster holds at most one participant.
    Solo,
    /// Competitive play; each participant gets an individual outcome.
    Versus,
    /// Team play; one outcome applies to the whole roster.
    Group,
}

impl ParticipationMode {
    /// Returns the maximum roster size, if the mode caps it.
    #[must_use]
    pub fn capacity(self) -> Option<usize> {
        match self {
            Self::Solo => Some(1),
            Self::Versus | Self::Group => None,
        }
    }

    /// Returns `true` if one outcome covers every participant.
    #[must_use]
    pub fn has_uniform_outcome(self) -> bool {
        matches!(self, Self::Solo | Self::Group)
    }

    /// Returns the canonical lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Solo => "solo",
            Self::Versus => "versus",
            Self::Group => "group",
        }
    }
}

impl fmt::Display for ParticipationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticipationMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solo" => Ok(Self::Solo),
            "versus" => Ok(Self::Versus),
            "group" => Ok(Self::Group),
            other => Err(DomainError::Validation(format!(
                "unknown participation mode: {other}"
            ))),
        }
    }
}
