// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.

use give_pulse_domain::{Appointment, BloodRequest, Hospital, QrPayload};
use give_pulse_persistence::MatchSummary;
use time::OffsetDateTime;

// ============================================================================
// Authentication
// ============================================================================

/// API request to log in.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LoginRequest {
    /// The account email.
    pub email: String,
    /// The account password.
    pub password: String,
}

/// API response for a successful login.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LoginResponse {
    /// The session token (opaque).
    pub session_token: String,
    /// The account identifier.
    pub account_id: i64,
    /// The account role.
    pub role: String,
    /// When the session expires.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

/// API response describing the current account.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WhoAmIResponse {
    pub account_id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    /// Set for donors.
    pub donor_id: Option<i64>,
    /// Set for staff.
    pub staff_id: Option<i64>,
    /// Set for staff.
    pub hospital_id: Option<i64>,
    /// Set for staff.
    pub is_verified: Option<bool>,
    /// Set for donors who are resting.
    #[serde(with = "time::serde::rfc3339::option")]
    pub cooldown_until: Option<OffsetDateTime>,
}

// ============================================================================
// Registration
// ============================================================================

/// API request to register a donor account.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RegisterDonorRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub password_confirmation: String,
    /// Blood type such as `O-` or `AB+`.
    pub blood_type: String,
    pub city: String,
    pub district: String,
    pub eligibility_consent: bool,
    /// Name shown on public certificates instead of the full name.
    pub public_alias: Option<String>,
}

/// API request to register a staff account.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RegisterStaffRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub password_confirmation: String,
    /// The city chosen on the form; must be the hospital's city.
    pub city: String,
    pub hospital_id: i64,
}

/// API response for a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RegisterResponse {
    pub account_id: i64,
    /// The donor or staff identifier.
    pub profile_id: i64,
    pub role: String,
    /// A success message.
    pub message: String,
}

// ============================================================================
// Hospitals
// ============================================================================

/// Information about a hospital.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HospitalInfo {
    pub hospital_id: i64,
    pub name: String,
    pub city: String,
    pub district: String,
    pub is_verified: bool,
}

impl HospitalInfo {
    pub(crate) fn from_domain(hospital: Hospital) -> Self {
        Self {
            hospital_id: hospital.hospital_id.unwrap_or_default(),
            name: hospital.name,
            city: hospital.city,
            district: hospital.district,
            is_verified: hospital.is_verified,
        }
    }
}

/// API response listing hospitals.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListHospitalsResponse {
    pub hospitals: Vec<HospitalInfo>,
}

// ============================================================================
// Blood Requests
// ============================================================================

/// API request to open a blood request.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CreateBloodRequestRequest {
    /// Blood type such as `O-` or `AB+`.
    pub blood_type: String,
    pub city: String,
    pub district: String,
    pub units_requested: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub deadline_at: OffsetDateTime,
    #[serde(default)]
    pub notes: String,
}

/// Information about a blood request.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BloodRequestInfo {
    pub request_id: i64,
    pub hospital_id: i64,
    pub blood_type: String,
    pub city: String,
    pub district: String,
    pub units_requested: i32,
    pub units_fulfilled: i32,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub deadline_at: OffsetDateTime,
    pub notes: String,
}

impl BloodRequestInfo {
    pub(crate) fn from_domain(request: BloodRequest) -> Self {
        Self {
            request_id: request.request_id.unwrap_or_default(),
            hospital_id: request.hospital_id,
            blood_type: request.blood_type.to_string(),
            city: request.city,
            district: request.district,
            units_requested: request.units_requested,
            units_fulfilled: request.units_fulfilled,
            status: request.status.to_string(),
            deadline_at: request.deadline_at,
            notes: request.notes,
        }
    }
}

/// API response for a newly opened request.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CreateBloodRequestResponse {
    pub request: BloodRequestInfo,
    /// The audit event recorded for the change.
    pub event_id: i64,
}

/// API response listing requests a donor may respond to.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MatchableRequestsResponse {
    /// Set when the donor is resting; `requests` is then empty.
    #[serde(with = "time::serde::rfc3339::option")]
    pub cooldown_until: Option<OffsetDateTime>,
    pub requests: Vec<BloodRequestInfo>,
}

/// One match shown on the request detail page.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MatchInfo {
    pub match_id: i64,
    pub donor_id: i64,
    pub donor_name: String,
    pub donor_blood_type: String,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub appointment_id: Option<i64>,
}

impl MatchInfo {
    pub(crate) fn from_summary(summary: MatchSummary) -> Self {
        Self {
            match_id: summary.record.match_id.unwrap_or_default(),
            donor_id: summary.record.donor_id,
            donor_name: summary.donor_name,
            donor_blood_type: summary.donor_blood_type.to_string(),
            status: summary.record.status.to_string(),
            created_at: summary.record.created_at,
            appointment_id: summary.appointment_id,
        }
    }
}

/// API response for the request detail page.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RequestDetailResponse {
    pub request: BloodRequestInfo,
    pub matches: Vec<MatchInfo>,
}

// ============================================================================
// Matches & Appointments
// ============================================================================

/// API response for a match transition without side effects.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MatchResponse {
    pub match_id: i64,
    pub request_id: i64,
    pub donor_id: i64,
    pub status: String,
    pub event_id: i64,
    /// A success message.
    pub message: String,
}

/// Information about a booked appointment.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AppointmentInfo {
    pub appointment_id: i64,
    pub match_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub window_start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub window_end: OffsetDateTime,
    pub qr_payload: Option<QrPayload>,
    /// Reference to the rendered QR code, if rendering succeeded.
    pub qr_artifact: Option<String>,
}

impl AppointmentInfo {
    pub(crate) fn from_domain(appointment: Appointment) -> Self {
        Self {
            appointment_id: appointment.appointment_id.unwrap_or_default(),
            match_id: appointment.match_id,
            window_start: appointment.window.start(),
            window_end: appointment.window.end(),
            qr_payload: appointment.qr_payload,
            qr_artifact: appointment.qr_artifact,
        }
    }
}

/// API response for an accepted match.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AcceptMatchResponse {
    pub match_id: i64,
    pub status: String,
    /// When the donor may respond to requests again.
    #[serde(with = "time::serde::rfc3339")]
    pub cooldown_until: OffsetDateTime,
    pub appointment: AppointmentInfo,
    pub event_id: i64,
    /// Non-fatal problems, such as a QR code that could not be rendered.
    pub warnings: Vec<String>,
}

/// API request carrying a scanned QR payload.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CheckInRequest {
    pub payload: QrPayload,
}

/// API request to confirm a donation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CompleteDonationRequest {
    pub units: i32,
}

/// API response for a confirmed donation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CompleteDonationResponse {
    pub donation_id: i64,
    pub match_id: i64,
    pub certificate_serial: String,
    pub verification_url: String,
    pub units: i32,
    pub request_status: String,
    pub units_fulfilled: i32,
    /// Reference to the rendered certificate, if rendering succeeded.
    pub certificate_artifact: Option<String>,
    pub event_id: i64,
    /// Non-fatal problems, such as a certificate that could not be rendered.
    pub warnings: Vec<String>,
}

/// API response for a public certificate lookup.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CertificateVerificationResponse {
    pub serial: String,
    /// The donor's public alias, or full name when no alias is set.
    pub donor_name: String,
    pub blood_type: String,
    pub hospital_name: String,
    /// Calendar date of the donation (`YYYY-MM-DD`).
    pub donation_date: String,
    pub units: i32,
}

// ============================================================================
// Maintenance
// ============================================================================

/// Counts from an artifact regeneration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RegenerationSummary {
    pub rendered: usize,
    pub failed: usize,
}

/// Outcome of the request expiry command.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExpireRequestsResponse {
    /// Requests moved to `expired`.
    pub expired: Vec<i64>,
    /// Requests closed by a concurrent change before they could be expired.
    pub skipped: Vec<i64>,
}

/// Whether to set or clear verification flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyAction {
    Verify,
    Unverify,
}

/// Which entities a verification command applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyTarget {
    Hospital,
    Staff,
    All,
}

/// API request to change verification flags.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VerifyEntitiesRequest {
    pub action: VerifyAction,
    pub target: VerifyTarget,
    /// Restrict to one hospital or staff member.
    pub id: Option<i64>,
    /// Restrict staff changes to one hospital.
    pub hospital_id: Option<i64>,
}

/// Rows changed by a verification command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VerifyEntitiesResponse {
    pub hospitals_changed: usize,
    pub staff_changed: usize,
}

/// Rows removed by session cleanup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CleanupSessionsResponse {
    pub expired_removed: usize,
    pub orphaned_removed: usize,
}

/// API request to bootstrap an administrator.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CreateAdminRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// API response for a created administrator.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CreateAdminResponse {
    pub account_id: i64,
    pub email: String,
}
