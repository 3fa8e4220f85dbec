//! Outcome values, staged drafts, and the finalized outcome payload.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use arena_catalog::domain::participation::ParticipationMode;
use arena_core::error::DomainError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of a session for one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeValue {
    /// The participant won.
    Win,
    /// The participant was knocked out.
    Eliminated,
}

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Open for roster changes and outcome staging.
    Active,
    /// Confirmed with an outcome. Terminal.
    Completed,
    /// Abandoned without an outcome. Terminal.
    Cancelled,
}

impl SessionStatus {
    /// Returns the wire name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` for Completed and Cancelled.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::Validation(format!(
                "unknown session status: {other}"
            ))),
        }
    }
}

/// Outcome selection staged while a session is Active.
///
/// Solo and Group sessions stage one value for the whole roster; Versus
/// sessions stage a value per player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DraftOutcome {
    /// One value applied to every participant.
    Uniform {
        /// The staged value, if any.
        value: Option<OutcomeValue>,
    },
    /// A value per player, keyed by player ID.
    PerParticipant {
        /// The staged values.
        values: BTreeMap<Uuid, OutcomeValue>,
    },
}

impl DraftOutcome {
    /// Returns an empty draft of the shape the mode requires.
    #[must_use]
    pub fn empty_for(mode: ParticipationMode) -> Self {
        if mode.has_uniform_outcome() {
            Self::Uniform { value: None }
        } else {
            Self::PerParticipant {
                values: BTreeMap::new(),
            }
        }
    }

    /// Discards every staged value, keeping the shape.
    pub fn clear(&mut self) {
        match self {
            Self::Uniform { value } => *value = None,
            Self::PerParticipant { values } => values.clear(),
        }
    }
}

/// Uniform result of a Solo or Group session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniformResult {
    /// The roster won.
    Won,
    /// The roster was eliminated.
    Eliminated,
}

impl From<OutcomeValue> for UniformResult {
    fn from(value: OutcomeValue) -> Self {
        match value {
            OutcomeValue::Win => Self::Won,
            OutcomeValue::Eliminated => Self::Eliminated,
        }
    }
}

/// The finalized outcome of a Completed session.
///
/// Serializes as `{"result": "won"}` for Solo/Group sessions and as
/// `{"winners": [...], "eliminated": [...]}` (usernames) for Versus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionOutcome {
    /// Solo or Group.
    Uniform {
        /// The roster's result.
        result: UniformResult,
    },
    /// Versus.
    Versus {
        /// Usernames of the winners, in roster order.
        winners: Vec<String>,
        /// Usernames of the eliminated, in roster order.
        eliminated: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_outcome_serializes_as_result() {
        let outcome = SessionOutcome::Uniform {
            result: UniformResult::Won,
        };

        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json, serde_json::json!({ "result": "won" }));
    }

    #[test]
    fn test_versus_outcome_deserializes_from_partition() {
        let json = serde_json::json!({ "winners": ["ada"], "eliminated": ["bob", "cy"] });

        let outcome: SessionOutcome = serde_json::from_value(json).unwrap();

        assert_eq!(
            outcome,
            SessionOutcome::Versus {
                winners: vec!["ada".to_owned()],
                eliminated: vec!["bob".to_owned(), "cy".to_owned()],
            }
        );
    }

    #[test]
    fn test_empty_draft_shape_follows_mode() {
        assert_eq!(
            DraftOutcome::empty_for(ParticipationMode::Group),
            DraftOutcome::Uniform { value: None }
        );
        assert!(matches!(
            DraftOutcome::empty_for(ParticipationMode::Versus),
            DraftOutcome::PerParticipant { .. }
        ));
    }

    #[test]
    fn test_status_parses_wire_names() {
        assert_eq!(
            "cancelled".parse::<SessionStatus>().unwrap(),
            SessionStatus::Cancelled
        );
        assert!(matches!(
            "paused".parse::<SessionStatus>(),
            Err(DomainError::Validation(_))
        ));
    }
}
