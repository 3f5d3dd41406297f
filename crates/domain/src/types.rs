// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::appointment::{AppointmentWindow, QrPayload};
use crate::blood_type::BloodType;
use crate::certificate::CertificateSerial;
use crate::cooldown;
use crate::match_status::MatchStatus;
use crate::request::RequestStatus;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A hospital that posts blood requests.
///
/// Hospitals are unique on (name, city).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hospital {
    /// `None` until persisted.
    pub hospital_id: Option<i64>,
    pub name: String,
    pub city: String,
    pub district: String,
    pub is_verified: bool,
}

/// A registered donor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donor {
    /// `None` until persisted.
    pub donor_id: Option<i64>,
    pub account_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub blood_type: BloodType,
    pub city: String,
    pub district: String,
    pub eligibility_consent: bool,
    /// Name shown on public pages instead of the real name.
    pub public_alias: Option<String>,
    /// The donor may not be matched before this instant.
    #[serde(with = "time::serde::rfc3339::option")]
    pub cooldown_until: Option<OffsetDateTime>,
}

impl Donor {
    /// Returns the donor's full name.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Returns the alias if set, otherwise the full name.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.public_alias
            .as_deref()
            .map(str::trim)
            .filter(|alias| !alias.is_empty())
            .map_or_else(|| self.full_name(), ToString::to_string)
    }

    /// Returns true if the donor is still resting at `now`.
    #[must_use]
    pub fn is_in_cooldown(&self, now: OffsetDateTime) -> bool {
        cooldown::is_in_cooldown(self.cooldown_until, now)
    }
}

/// A hospital staff member.
///
/// New staff start unverified. Only verified staff act on requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    /// `None` until persisted.
    pub staff_id: Option<i64>,
    pub account_id: i64,
    pub hospital_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub is_verified: bool,
}

/// A hospital's request for donated blood.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodRequest {
    /// `None` until persisted.
    pub request_id: Option<i64>,
    pub hospital_id: i64,
    pub created_by_staff_id: Option<i64>,
    pub blood_type: BloodType,
    pub city: String,
    pub district: String,
    pub units_requested: i32,
    /// Never exceeds `units_requested`.
    pub units_fulfilled: i32,
    pub status: RequestStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub deadline_at: OffsetDateTime,
    pub notes: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl BloodRequest {
    /// Returns the number of units still needed.
    #[must_use]
    pub fn units_remaining(&self) -> i32 {
        (self.units_requested - self.units_fulfilled).max(0)
    }

    /// Returns true if donors may respond at `now`.
    #[must_use]
    pub fn is_matchable_at(&self, now: OffsetDateTime) -> bool {
        self.status.accepts_matches() && self.deadline_at > now
    }
}

/// A pairing of one donor with one blood request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// `None` until persisted.
    pub match_id: Option<i64>,
    pub request_id: i64,
    pub donor_id: i64,
    pub status: MatchStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub accepted_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub declined_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub checked_in_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub donated_at: Option<OffsetDateTime>,
}

impl Match {
    /// Creates a pending match.
    #[must_use]
    pub const fn pending(request_id: i64, donor_id: i64, now: OffsetDateTime) -> Self {
        Self {
            match_id: None,
            request_id,
            donor_id,
            status: MatchStatus::Pending,
            created_at: now,
            accepted_at: None,
            declined_at: None,
            checked_in_at: None,
            donated_at: None,
        }
    }
}

/// The donation visit booked for an accepted match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    /// `None` until persisted.
    pub appointment_id: Option<i64>,
    pub match_id: i64,
    pub window: AppointmentWindow,
    /// Set once the appointment has an identifier.
    pub qr_payload: Option<QrPayload>,
    /// Reference to the rendered QR artifact, if rendering succeeded.
    pub qr_artifact: Option<String>,
}

/// A confirmed donation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    /// `None` until persisted.
    pub donation_id: Option<i64>,
    pub match_id: i64,
    pub units: i32,
    pub certificate_serial: CertificateSerial,
    pub confirmed_by_staff_id: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub confirmed_at: OffsetDateTime,
    /// Reference to the rendered certificate, if rendering succeeded.
    pub certificate_artifact: Option<String>,
}

/// The stored role of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Guest,
    Donor,
    Staff,
    Admin,
}

impl AccountKind {
    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Donor => "donor",
            Self::Staff => "staff",
            Self::Admin => "admin",
        }
    }
}

impl std::str::FromStr for AccountKind {
    type Err = crate::error::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guest" => Ok(Self::Guest),
            "donor" => Ok(Self::Donor),
            "staff" => Ok(Self::Staff),
            "admin" => Ok(Self::Admin),
            _ => Err(crate::error::DomainError::InvalidAccountRole(s.to_string())),
        }
    }
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
