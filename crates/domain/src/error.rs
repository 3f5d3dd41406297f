// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::OffsetDateTime;

use crate::blood_type::BloodType;
use crate::request::RequestStatus;

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Blood type text could not be parsed.
    InvalidBloodType(String),
    /// Request status text could not be parsed.
    InvalidRequestStatus(String),
    /// Match status text could not be parsed.
    InvalidMatchStatus(String),
    /// Account role text could not be parsed.
    InvalidAccountRole(String),
    /// A status transition is not permitted by the lifecycle rules.
    InvalidStatusTransition {
        /// The entity whose status was changing (e.g. "match").
        entity: &'static str,
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
        /// Why the transition was refused.
        reason: String,
    },
    /// The donor's blood type cannot be given to the requested blood type.
    IncompatibleBloodType {
        /// The donor's blood type.
        donor: BloodType,
        /// The blood type the request needs.
        requested: BloodType,
    },
    /// The donor is resting after a recent commitment.
    DonorInCooldown {
        /// When the donor becomes eligible again.
        until: OffsetDateTime,
    },
    /// The request no longer accepts new matches.
    RequestNotAcceptingMatches {
        /// The request identifier.
        request_id: i64,
        /// The request's current status.
        status: RequestStatus,
    },
    /// The request deadline has passed.
    RequestDeadlinePassed {
        /// The request identifier.
        request_id: i64,
        /// The request deadline.
        deadline_at: OffsetDateTime,
    },
    /// A match already exists for this request and donor.
    DuplicateMatch {
        /// The request identifier.
        request_id: i64,
        /// The donor identifier.
        donor_id: i64,
        /// The identifier of the match that already exists.
        existing_match_id: Option<i64>,
    },
    /// No match exists in the transition scope.
    MatchNotFound {
        /// The request identifier.
        request_id: i64,
        /// The donor identifier.
        donor_id: i64,
    },
    /// The match has no appointment to complete or check in against.
    AppointmentMissing {
        /// The match identifier.
        match_id: i64,
    },
    /// A donation has already been confirmed for the match.
    DonationAlreadyRecorded {
        /// The match identifier.
        match_id: i64,
    },
    /// Unit count is out of range.
    InvalidUnits(String),
    /// Deadline is missing or not in the future.
    InvalidDeadline(String),
    /// Person name is empty or malformed.
    InvalidName(String),
    /// Email address is malformed.
    InvalidEmail(String),
    /// Phone number is malformed.
    InvalidPhone(String),
    /// City is empty or too long.
    InvalidCity(String),
    /// Notes are too long.
    InvalidNotes(String),
    /// The requested city does not match the hospital's city.
    CityMismatch {
        /// The hospital's city.
        hospital_city: String,
        /// The city supplied with the request.
        requested_city: String,
    },
    /// Appointment window does not start before it ends.
    InvalidAppointmentWindow {
        /// The window start.
        start: OffsetDateTime,
        /// The window end.
        end: OffsetDateTime,
    },
    /// A scanned verification code does not match the appointment.
    VerificationCodeMismatch {
        /// The appointment identifier named in the payload.
        appointment_id: i64,
    },
    /// Certificate serial text is malformed.
    InvalidCertificateSerial(String),
    /// Timestamp could not be formatted or parsed.
    InvalidTimestamp(String),
    /// Date arithmetic overflow.
    DateArithmeticOverflow {
        /// Description of the operation that failed.
        operation: String,
    },
}

impl std::fmt::Display for DomainError {
    #[allow(clippy::too_many_lines)]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBloodType(value) => write!(f, "Invalid blood type: '{value}'"),
            Self::InvalidRequestStatus(value) => write!(f, "Invalid request status: '{value}'"),
            Self::InvalidMatchStatus(value) => write!(f, "Invalid match status: '{value}'"),
            Self::InvalidAccountRole(value) => write!(f, "Invalid account role: '{value}'"),
            Self::InvalidStatusTransition {
                entity,
                from,
                to,
                reason,
            } => {
                write!(
                    f,
                    "Cannot move {entity} from '{from}' to '{to}': {reason}"
                )
            }
            Self::IncompatibleBloodType { donor, requested } => {
                write!(
                    f,
                    "Donor blood type {donor} is not compatible with requested type {requested}"
                )
            }
            Self::DonorInCooldown { until } => {
                write!(f, "Donor is in cooldown until {until}")
            }
            Self::RequestNotAcceptingMatches { request_id, status } => {
                write!(
                    f,
                    "Blood request {request_id} is {status} and no longer accepts donors"
                )
            }
            Self::RequestDeadlinePassed {
                request_id,
                deadline_at,
            } => {
                write!(
                    f,
                    "Blood request {request_id} closed at its deadline {deadline_at}"
                )
            }
            Self::DuplicateMatch {
                request_id,
                donor_id,
                existing_match_id,
            } => match existing_match_id {
                Some(match_id) => write!(
                    f,
                    "Donor {donor_id} already responded to request {request_id} (match {match_id})"
                ),
                None => write!(
                    f,
                    "Donor {donor_id} already responded to request {request_id}"
                ),
            },
            Self::MatchNotFound {
                request_id,
                donor_id,
            } => {
                write!(
                    f,
                    "No match exists for donor {donor_id} on request {request_id}"
                )
            }
            Self::AppointmentMissing { match_id } => {
                write!(f, "Match {match_id} has no appointment")
            }
            Self::DonationAlreadyRecorded { match_id } => {
                write!(f, "A donation is already recorded for match {match_id}")
            }
            Self::InvalidUnits(msg) => write!(f, "Invalid units: {msg}"),
            Self::InvalidDeadline(msg) => write!(f, "Invalid deadline: {msg}"),
            Self::InvalidName(msg) => write!(f, "Invalid name: {msg}"),
            Self::InvalidEmail(msg) => write!(f, "Invalid email: {msg}"),
            Self::InvalidPhone(msg) => write!(f, "Invalid phone number: {msg}"),
            Self::InvalidCity(msg) => write!(f, "Invalid city: {msg}"),
            Self::InvalidNotes(msg) => write!(f, "Invalid notes: {msg}"),
            Self::CityMismatch {
                hospital_city,
                requested_city,
            } => {
                write!(
                    f,
                    "City '{requested_city}' must match the hospital's city '{hospital_city}'"
                )
            }
            Self::InvalidAppointmentWindow { start, end } => {
                write!(
                    f,
                    "Appointment window must start before it ends ({start} .. {end})"
                )
            }
            Self::VerificationCodeMismatch { appointment_id } => {
                write!(
                    f,
                    "Verification code does not match appointment {appointment_id}"
                )
            }
            Self::InvalidCertificateSerial(value) => {
                write!(f, "Invalid certificate serial: '{value}'")
            }
            Self::InvalidTimestamp(msg) => write!(f, "Invalid timestamp: {msg}"),
            Self::DateArithmeticOverflow { operation } => {
                write!(f, "Date arithmetic overflow while {operation}")
            }
        }
    }
}

impl std::error::Error for DomainError {}
