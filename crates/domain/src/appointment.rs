// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Appointment scheduling and QR verification payloads.
//!
//! Accepting a match books a fixed two hour slot starting one day out. The
//! QR payload carries a verification code derived from the appointment and
//! match identifiers, so a scanned payload can be checked without storing a
//! secret.

use crate::artifact::{ArtifactKind, ArtifactPayload};
use crate::blood_type::BloodType;
use crate::error::DomainError;
use crate::timestamp::format_timestamp;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};

/// Delay between acceptance and the start of the appointment slot.
pub const APPOINTMENT_LEAD_TIME: Duration = Duration::hours(24);

/// Length of an appointment slot.
pub const APPOINTMENT_SLOT_LENGTH: Duration = Duration::hours(2);

/// Number of hex digits kept from the digest.
pub const VERIFICATION_CODE_LENGTH: usize = 12;

/// A half-open appointment window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentWindow {
    #[serde(with = "time::serde::rfc3339")]
    start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    end: OffsetDateTime,
}

impl AppointmentWindow {
    /// Creates a window.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidAppointmentWindow` unless `start < end`.
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Result<Self, DomainError> {
        if start >= end {
            return Err(DomainError::InvalidAppointmentWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// The slot booked when a match is accepted at `now`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DateArithmeticOverflow` if `now` is too close to
    /// the end of the representable range.
    pub fn for_acceptance(now: OffsetDateTime) -> Result<Self, DomainError> {
        let start: OffsetDateTime = now.checked_add(APPOINTMENT_LEAD_TIME).ok_or_else(|| {
            DomainError::DateArithmeticOverflow {
                operation: String::from("scheduling appointment start"),
            }
        })?;
        let end: OffsetDateTime = start.checked_add(APPOINTMENT_SLOT_LENGTH).ok_or_else(|| {
            DomainError::DateArithmeticOverflow {
                operation: String::from("scheduling appointment end"),
            }
        })?;
        Self::new(start, end)
    }

    #[must_use]
    pub const fn start(&self) -> OffsetDateTime {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> OffsetDateTime {
        self.end
    }

    /// Returns the slot length.
    #[must_use]
    pub fn length(&self) -> Duration {
        self.end - self.start
    }
}

/// Derives the verification code for an appointment.
///
/// The code is the first twelve hex digits of the SHA-256 digest of the
/// identifiers, upper-cased.
#[must_use]
pub fn verification_code(appointment_id: i64, match_id: i64) -> String {
    let digest = Sha256::digest(format!("GP-APPT:{appointment_id}:MATCH:{match_id}").as_bytes());
    let mut code: String = hex::encode_upper(digest);
    code.truncate(VERIFICATION_CODE_LENGTH);
    code
}

/// Facts about the donor and hospital known before the appointment exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrDetails {
    pub donor_name: String,
    pub donor_email: String,
    pub blood_type: BloodType,
    pub hospital_name: String,
    pub window: AppointmentWindow,
}

/// The structured content of an appointment QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPayload {
    pub appointment_id: i64,
    pub match_id: i64,
    pub donor_name: String,
    pub donor_email: String,
    pub blood_type: BloodType,
    pub hospital_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub window_start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub window_end: OffsetDateTime,
    pub verification_code: String,
}

impl QrPayload {
    /// Builds the payload once the appointment has an identifier.
    #[must_use]
    pub fn new(appointment_id: i64, match_id: i64, details: QrDetails) -> Self {
        Self {
            appointment_id,
            match_id,
            donor_name: details.donor_name,
            donor_email: details.donor_email,
            blood_type: details.blood_type,
            hospital_name: details.hospital_name,
            window_start: details.window.start(),
            window_end: details.window.end(),
            verification_code: verification_code(appointment_id, match_id),
        }
    }

    /// Checks that the payload's code matches its identifiers and the
    /// appointment it is presented for.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::VerificationCodeMismatch` if the code was
    /// altered or the payload belongs to another appointment or match.
    pub fn verify(&self, appointment_id: i64, match_id: i64) -> Result<(), DomainError> {
        let expected: String = verification_code(appointment_id, match_id);
        if self.appointment_id != appointment_id
            || self.match_id != match_id
            || !self.verification_code.eq_ignore_ascii_case(&expected)
        {
            return Err(DomainError::VerificationCodeMismatch {
                appointment_id: self.appointment_id,
            });
        }
        Ok(())
    }

    /// Converts the payload into renderer input.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTimestamp` if a window bound cannot be formatted.
    pub fn to_artifact_payload(&self) -> Result<ArtifactPayload, DomainError> {
        Ok(
            ArtifactPayload::new(ArtifactKind::QrCode, self.appointment_id.to_string())
                .with("appointment_id", self.appointment_id)
                .with("match_id", self.match_id)
                .with("donor_name", &self.donor_name)
                .with("donor_email", &self.donor_email)
                .with("blood_type", self.blood_type)
                .with("hospital_name", &self.hospital_name)
                .with("window_start", format_timestamp(self.window_start)?)
                .with("window_end", format_timestamp(self.window_end)?)
                .with("verification_code", &self.verification_code),
        )
    }
}
