// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Match status tracking and transition logic.
//!
//! A match pairs one donor with one blood request. Transitions are
//! staff-initiated except creation, which the donor performs.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle states of a donor-to-request match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Donor responded; awaiting staff decision
    Pending,
    /// Staff approved; appointment scheduled
    Accepted,
    /// Staff turned the donor down
    Declined,
    /// Donor arrived and the QR code was verified
    CheckedIn,
    /// Donation confirmed
    Donated,
}

impl MatchStatus {
    /// Returns the string representation of the status.
    ///
    /// This is used for persistence and API serialization.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::CheckedIn => "checked_in",
            Self::Donated => "donated",
        }
    }

    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            "checked_in" => Ok(Self::CheckedIn),
            "donated" => Ok(Self::Donated),
            _ => Err(DomainError::InvalidMatchStatus(s.to_string())),
        }
    }

    /// Returns true if this status is terminal (cannot transition to another state).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Declined | Self::Donated)
    }

    /// Returns true if the donor has been approved for this match.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self, Self::Accepted | Self::CheckedIn | Self::Donated)
    }

    /// Validates if a transition from this status to another is permitted.
    ///
    /// Permitted transitions:
    /// - `pending` -> `accepted` | `declined`
    /// - `accepted` -> `checked_in` | `donated`
    /// - `checked_in` -> `donated`
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStatusTransition` if the transition is not allowed.
    pub fn validate_transition(&self, new_status: Self) -> Result<(), DomainError> {
        if self.is_terminal() {
            return Err(DomainError::InvalidStatusTransition {
                entity: "match",
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "match is already closed".to_string(),
            });
        }

        let valid: bool = match self {
            Self::Pending => matches!(new_status, Self::Accepted | Self::Declined),
            Self::Accepted => matches!(new_status, Self::CheckedIn | Self::Donated),
            Self::CheckedIn => matches!(new_status, Self::Donated),
            Self::Declined | Self::Donated => false,
        };

        if valid {
            Ok(())
        } else {
            Err(DomainError::InvalidStatusTransition {
                entity: "match",
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: format!("a {self} match cannot become {new_status}"),
            })
        }
    }
}

impl FromStr for MatchStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [MatchStatus; 5] = [
        MatchStatus::Pending,
        MatchStatus::Accepted,
        MatchStatus::Declined,
        MatchStatus::CheckedIn,
        MatchStatus::Donated,
    ];

    #[test]
    fn test_status_string_round_trip() {
        for status in ALL {
            let s: &str = status.as_str();
            match MatchStatus::parse_str(s) {
                Ok(parsed) => assert_eq!(status, parsed),
                Err(e) => panic!("Failed to parse status string: {s}: {e}"),
            }
        }
    }

    #[test]
    fn test_invalid_status_string() {
        assert!(MatchStatus::parse_str("completed").is_err());
        assert!(MatchStatus::parse_str("Pending").is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!MatchStatus::Pending.is_terminal());
        assert!(!MatchStatus::Accepted.is_terminal());
        assert!(!MatchStatus::CheckedIn.is_terminal());
        assert!(MatchStatus::Declined.is_terminal());
        assert!(MatchStatus::Donated.is_terminal());
    }

    #[test]
    fn test_transition_table() {
        let allowed: [(MatchStatus, MatchStatus); 5] = [
            (MatchStatus::Pending, MatchStatus::Accepted),
            (MatchStatus::Pending, MatchStatus::Declined),
            (MatchStatus::Accepted, MatchStatus::CheckedIn),
            (MatchStatus::Accepted, MatchStatus::Donated),
            (MatchStatus::CheckedIn, MatchStatus::Donated),
        ];

        for from in ALL {
            for to in ALL {
                let expected: bool = allowed.contains(&(from, to));
                assert_eq!(
                    from.validate_transition(to).is_ok(),
                    expected,
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_accepting_accepted_or_declined_is_invalid_transition() {
        for from in [MatchStatus::Accepted, MatchStatus::Declined] {
            let Err(err) = from.validate_transition(MatchStatus::Accepted) else {
                panic!("accepting a {from} match must be refused");
            };
            assert!(matches!(
                err,
                DomainError::InvalidStatusTransition { entity: "match", .. }
            ));
        }
    }
}
