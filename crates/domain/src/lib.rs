// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod appointment;
mod artifact;
mod blood_type;
mod certificate;
mod cooldown;
mod error;
mod fulfillment;
mod match_status;
mod request;
mod timestamp;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use appointment::{
    APPOINTMENT_LEAD_TIME, APPOINTMENT_SLOT_LENGTH, AppointmentWindow, QrDetails, QrPayload,
    VERIFICATION_CODE_LENGTH, verification_code,
};
pub use artifact::{ArtifactKind, ArtifactPayload};
pub use blood_type::{AboGroup, BloodType, RhFactor, ensure_compatible, is_compatible};
pub use certificate::{CertificatePayload, CertificateSerial, SERIAL_PREFIX, verification_url};
pub use cooldown::{DEFAULT_COOLDOWN_DAYS, apply_cooldown, ensure_not_in_cooldown, is_in_cooldown};
pub use error::DomainError;
pub use fulfillment::{FulfillmentOutcome, classify, record_donation};
pub use match_status::MatchStatus;
pub use request::{BloodRequestDraft, MAX_NOTES_LENGTH, RequestStatus, expire_if_overdue};
pub use timestamp::{format_timestamp, parse_timestamp};

// Re-export public types
pub use types::{AccountKind, Appointment, BloodRequest, Donation, Donor, Hospital, Match, Staff};
pub use validation::{
    MAX_EMAIL_LENGTH, MAX_NAME_LENGTH, MAX_PLACE_LENGTH, normalize_email, validate_city,
    validate_person_name, validate_phone,
};
