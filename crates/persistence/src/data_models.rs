// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use give_pulse_domain::{
    AccountKind, Appointment, BloodType, CertificateSerial, FulfillmentOutcome, Match,
};
use time::{Date, OffsetDateTime};

/// A stored account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountData {
    pub account_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: AccountKind,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Input for a new account. The password is hashed on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    /// Already normalized to lower case.
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub role: AccountKind,
}

/// Input for the donor half of a donor registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDonorProfile {
    pub blood_type: BloodType,
    pub city: String,
    pub district: String,
    pub eligibility_consent: bool,
    pub public_alias: Option<String>,
}

/// A stored session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub session_id: i64,
    pub session_token: String,
    pub account_id: i64,
    pub created_at: OffsetDateTime,
    pub last_activity_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

/// A match listed on a request's detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSummary {
    pub record: Match,
    pub donor_name: String,
    pub donor_blood_type: BloodType,
    pub appointment_id: Option<i64>,
}

/// What a public certificate lookup reveals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRecord {
    pub serial: CertificateSerial,
    /// The donor's public alias, or their name when no alias is set.
    pub donor_display_name: String,
    pub blood_type: BloodType,
    pub hospital_name: String,
    pub donation_date: Date,
    pub units: i32,
}

/// Everything needed to render a certificate for a stored donation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSource {
    pub donation_id: i64,
    pub serial: CertificateSerial,
    pub donor_name: String,
    pub blood_type: BloodType,
    pub hospital_name: String,
    pub confirmed_at: OffsetDateTime,
    pub units: i32,
    pub certificate_artifact: Option<String>,
}

/// Identifiers and derived values produced while persisting a match transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistTransitionResult {
    /// The audit event recording the transition.
    pub event_id: i64,
    /// The match the transition applied to.
    pub match_id: i64,
    /// The appointment booked on acceptance, with its QR payload.
    pub appointment: Option<Appointment>,
    /// The donation recorded on completion.
    pub donation_id: Option<i64>,
    /// The request counts as re-read inside the transaction.
    pub fulfillment: Option<FulfillmentOutcome>,
}
