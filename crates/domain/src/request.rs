// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Blood request status and creation rules.

use crate::blood_type::BloodType;
use crate::error::DomainError;
use crate::types::Hospital;
use crate::validation::validate_city;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// Maximum length of free-text notes on a request.
pub const MAX_NOTES_LENGTH: usize = 2000;

/// Status of a blood request.
///
/// `open`, `partial` and `fulfilled` follow from the unit counts.
/// `expired` is only ever set by the deadline sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// No units donated yet
    Open,
    /// Some units donated
    Partial,
    /// All requested units donated
    Fulfilled,
    /// Deadline passed before the request was fulfilled
    Expired,
}

impl RequestStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Partial => "partial",
            Self::Fulfilled => "fulfilled",
            Self::Expired => "expired",
        }
    }

    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "open" => Ok(Self::Open),
            "partial" => Ok(Self::Partial),
            "fulfilled" => Ok(Self::Fulfilled),
            "expired" => Ok(Self::Expired),
            _ => Err(DomainError::InvalidRequestStatus(s.to_string())),
        }
    }

    /// Returns true if donors may still respond to the request.
    #[must_use]
    pub const fn accepts_matches(&self) -> bool {
        matches!(self, Self::Open | Self::Partial)
    }
}

impl FromStr for RequestStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unvalidated input for a new blood request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodRequestDraft {
    /// The requested blood type.
    pub blood_type: BloodType,
    /// The city the request is posted in.
    pub city: String,
    /// The district within the city.
    pub district: String,
    /// Number of units needed.
    pub units_requested: i32,
    /// When the request stops accepting donors.
    #[serde(with = "time::serde::rfc3339")]
    pub deadline_at: OffsetDateTime,
    /// Free-text notes for donors.
    pub notes: String,
}

impl BloodRequestDraft {
    /// Validates the draft against the hospital it will be posted for.
    ///
    /// Returns a normalised copy with trimmed text fields.
    ///
    /// # Arguments
    ///
    /// * `hospital` - The hospital of the creating staff member
    /// * `now` - The current time
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `units_requested` is less than 1
    /// - `deadline_at` is not strictly after `now`
    /// - the city is empty or differs from the hospital's city
    /// - the notes are too long
    pub fn validate(&self, hospital: &Hospital, now: OffsetDateTime) -> Result<Self, DomainError> {
        if self.units_requested < 1 {
            return Err(DomainError::InvalidUnits(format!(
                "at least one unit must be requested, got {}",
                self.units_requested
            )));
        }

        if self.deadline_at <= now {
            return Err(DomainError::InvalidDeadline(String::from(
                "deadline must be in the future",
            )));
        }

        let city: String = validate_city(&self.city)?;
        if !city.eq_ignore_ascii_case(hospital.city.trim()) {
            return Err(DomainError::CityMismatch {
                hospital_city: hospital.city.clone(),
                requested_city: city,
            });
        }

        let notes: &str = self.notes.trim();
        if notes.chars().count() > MAX_NOTES_LENGTH {
            return Err(DomainError::InvalidNotes(format!(
                "notes must be at most {MAX_NOTES_LENGTH} characters"
            )));
        }

        Ok(Self {
            blood_type: self.blood_type,
            city: hospital.city.clone(),
            district: self.district.trim().to_string(),
            units_requested: self.units_requested,
            deadline_at: self.deadline_at,
            notes: notes.to_string(),
        })
    }
}

/// Returns `Expired` if an open or partial request has passed its deadline.
///
/// Requests that are already fulfilled or expired are left alone.
#[must_use]
pub fn expire_if_overdue(
    status: RequestStatus,
    deadline_at: OffsetDateTime,
    now: OffsetDateTime,
) -> Option<RequestStatus> {
    if status.accepts_matches() && deadline_at <= now {
        Some(RequestStatus::Expired)
    } else {
        None
    }
}
