// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the GivePulse donation coordinator.
//!
//! This crate stores hospitals, accounts, blood requests, matches,
//! appointments, donations, sessions and audit events. It is built on Diesel
//! with the `SQLite` backend.
//!
//! ## Database
//!
//! - File databases run in WAL mode
//! - In-memory databases are unique per adapter, so tests never share state
//! - `PRAGMA foreign_keys = ON` is set and verified at startup
//! - The schema is created by embedded migrations (`migrations/`)
//!
//! ## Transitions
//!
//! Match transitions computed by `give_pulse::apply` are written by
//! [`Persistence::persist_transition`] inside one immediate transaction.
//! Status updates are compare-and-set on the expected source status; a
//! stale transition fails with [`PersistenceError::Conflict`].
//!
//! ## Timestamps
//!
//! Timestamps are stored as fixed-width UTC RFC 3339 text, truncated to
//! whole seconds.
//!
//! ## Testing Philosophy
//!
//! - Tests run against unique in-memory databases
//! - Every test builds the rows it needs; nothing is shared

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
#![allow(clippy::multiple_crate_versions)]

use diesel::SqliteConnection;
use give_pulse::{RequestTransition, State, TransitionResult};
use give_pulse_audit::AuditEvent;
use give_pulse_domain::{
    Appointment, BloodRequest, CertificateSerial, Donation, Donor, Hospital, Match, RequestStatus,
    Staff,
};
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;

/// Atomic counter for generating unique in-memory database names.
///
/// Each call to `new_in_memory()` receives a unique sequential ID.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
mod tests;

pub use data_models::{
    AccountData, CertificateRecord, CertificateSource, MatchSummary, NewAccount, NewDonorProfile,
    PersistTransitionResult, SessionData,
};
pub use error::PersistenceError;
pub use queries::verify_password;

/// Type alias kept for callers that name the backend explicitly.
pub type SqlitePersistence = Persistence;

/// Persistence adapter over a single `SQLite` connection.
pub struct Persistence {
    pub(crate) conn: SqliteConnection,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique database instance via atomic counter,
    /// ensuring deterministic test isolation.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let db_name = format!("memdb_test_{db_id}");
        let shared_memory_url = format!("file:{db_name}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(&shared_memory_url)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(path_str)?;

        // Enable WAL mode for better read concurrency
        backend::sqlite::enable_wal_mode(&mut conn)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        backend::sqlite::verify_foreign_key_enforcement(&mut self.conn)
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Persists a match transition and its audit event atomically.
    ///
    /// # Arguments
    ///
    /// * `result` - The transition result to persist
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Conflict` if the stored rows changed since
    /// the scope was loaded, or an error if a write fails.
    pub fn persist_transition(
        &mut self,
        result: &TransitionResult,
    ) -> Result<PersistTransitionResult, PersistenceError> {
        mutations::persist_transition(&mut self.conn, result)
    }

    /// Inserts a newly opened blood request and its audit event.
    ///
    /// # Returns
    ///
    /// `(request_id, event_id)`.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn persist_request_opened(
        &mut self,
        transition: &RequestTransition,
    ) -> Result<(i64, i64), PersistenceError> {
        mutations::persist_request_opened(&mut self.conn, transition)
    }

    /// Marks an overdue request expired and records its audit event.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Conflict` if the request is no longer open.
    pub fn persist_request_expired(
        &mut self,
        transition: &RequestTransition,
    ) -> Result<i64, PersistenceError> {
        mutations::persist_request_expired(&mut self.conn, transition)
    }

    /// Persists a standalone audit event.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn persist_audit_event(&mut self, event: &AuditEvent) -> Result<i64, PersistenceError> {
        mutations::persist_audit_event(&mut self.conn, event)
    }

    // ========================================================================
    // Transition Scope
    // ========================================================================

    /// Loads the transition scope for a (request, donor) pair.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the request, hospital or donor
    /// does not exist.
    pub fn load_scope(
        &mut self,
        request_id: i64,
        donor_id: i64,
    ) -> Result<State, PersistenceError> {
        queries::load_scope(&mut self.conn, request_id, donor_id)
    }

    /// Loads the transition scope containing a match.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the match does not exist.
    pub fn load_scope_for_match(&mut self, match_id: i64) -> Result<State, PersistenceError> {
        queries::load_scope_for_match(&mut self.conn, match_id)
    }

    // ========================================================================
    // Hospitals
    // ========================================================================

    /// Creates a hospital.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::UniqueViolation` for a duplicate (name, city).
    pub fn create_hospital(&mut self, hospital: &Hospital) -> Result<i64, PersistenceError> {
        mutations::create_hospital(&mut self.conn, hospital)
    }

    /// Retrieves a hospital by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_hospital(&mut self, hospital_id: i64) -> Result<Option<Hospital>, PersistenceError> {
        queries::get_hospital(&mut self.conn, hospital_id)
    }

    /// Lists the hospitals in a city.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_hospitals_by_city(
        &mut self,
        city: &str,
    ) -> Result<Vec<Hospital>, PersistenceError> {
        queries::list_hospitals_by_city(&mut self.conn, city)
    }

    /// Lists every hospital.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_hospitals(&mut self) -> Result<Vec<Hospital>, PersistenceError> {
        queries::list_hospitals(&mut self.conn)
    }

    /// Marks one hospital, or all of them, verified or unverified.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn set_hospital_verification(
        &mut self,
        hospital_id: Option<i64>,
        verified: bool,
    ) -> Result<usize, PersistenceError> {
        mutations::set_hospital_verification(&mut self.conn, hospital_id, verified)
    }

    // ========================================================================
    // Accounts & Profiles
    // ========================================================================

    /// Creates an account with no profile (admins).
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::UniqueViolation` if the email is taken.
    pub fn create_account(
        &mut self,
        account: &NewAccount,
        now: OffsetDateTime,
    ) -> Result<i64, PersistenceError> {
        mutations::create_account(&mut self.conn, account, now)
    }

    /// Registers a donor account and profile.
    ///
    /// # Returns
    ///
    /// `(account_id, donor_id)`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::UniqueViolation` if the email is taken.
    pub fn register_donor(
        &mut self,
        account: &NewAccount,
        profile: &NewDonorProfile,
        now: OffsetDateTime,
    ) -> Result<(i64, i64), PersistenceError> {
        mutations::register_donor(&mut self.conn, account, profile, now)
    }

    /// Registers a staff account bound to a hospital, unverified.
    ///
    /// # Returns
    ///
    /// `(account_id, staff_id)`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::UniqueViolation` if the email is taken.
    pub fn register_staff(
        &mut self,
        account: &NewAccount,
        hospital_id: i64,
        now: OffsetDateTime,
    ) -> Result<(i64, i64), PersistenceError> {
        mutations::register_staff(&mut self.conn, account, hospital_id, now)
    }

    /// Deletes an account and its profiles.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_account(&mut self, account_id: i64) -> Result<usize, PersistenceError> {
        mutations::delete_account(&mut self.conn, account_id)
    }

    /// Retrieves an account by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_account_by_email(
        &mut self,
        email: &str,
    ) -> Result<Option<AccountData>, PersistenceError> {
        queries::get_account_by_email(&mut self.conn, email)
    }

    /// Retrieves an account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_account_by_id(
        &mut self,
        account_id: i64,
    ) -> Result<Option<AccountData>, PersistenceError> {
        queries::get_account_by_id(&mut self.conn, account_id)
    }

    /// Counts admin accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_admin_accounts(&mut self) -> Result<i64, PersistenceError> {
        queries::count_admin_accounts(&mut self.conn)
    }

    /// Retrieves the donor profile of an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_donor_by_account(
        &mut self,
        account_id: i64,
    ) -> Result<Option<Donor>, PersistenceError> {
        queries::get_donor_by_account(&mut self.conn, account_id)
    }

    /// Retrieves the staff profile of an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_staff_by_account(
        &mut self,
        account_id: i64,
    ) -> Result<Option<Staff>, PersistenceError> {
        queries::get_staff_by_account(&mut self.conn, account_id)
    }

    /// Marks staff verified or unverified.
    ///
    /// # Arguments
    ///
    /// * `staff_id` - Restrict to one staff member
    /// * `hospital_id` - Restrict to one hospital's staff
    /// * `verified` - The new flag value
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn set_staff_verification(
        &mut self,
        staff_id: Option<i64>,
        hospital_id: Option<i64>,
        verified: bool,
    ) -> Result<usize, PersistenceError> {
        mutations::set_staff_verification(&mut self.conn, staff_id, hospital_id, verified)
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Creates a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_session(
        &mut self,
        session_token: &str,
        account_id: i64,
        now: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) -> Result<i64, PersistenceError> {
        mutations::create_session(&mut self.conn, session_token, account_id, now, expires_at)
    }

    /// Retrieves a session by token.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_session_by_token(
        &mut self,
        session_token: &str,
    ) -> Result<Option<SessionData>, PersistenceError> {
        queries::get_session_by_token(&mut self.conn, session_token)
    }

    /// Records session activity.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn update_session_activity(
        &mut self,
        session_id: i64,
        now: OffsetDateTime,
    ) -> Result<(), PersistenceError> {
        mutations::update_session_activity(&mut self.conn, session_id, now)
    }

    /// Deletes a session by token.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_session(&mut self, session_token: &str) -> Result<usize, PersistenceError> {
        mutations::delete_session(&mut self.conn, session_token)
    }

    /// Deletes sessions that expired before `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_expired_sessions(
        &mut self,
        now: OffsetDateTime,
    ) -> Result<usize, PersistenceError> {
        mutations::delete_expired_sessions(&mut self.conn, now)
    }

    /// Deletes sessions whose account no longer exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_orphaned_sessions(&mut self) -> Result<usize, PersistenceError> {
        mutations::delete_orphaned_sessions(&mut self.conn)
    }

    // ========================================================================
    // Requests & Matches
    // ========================================================================

    /// Retrieves a blood request by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_request(
        &mut self,
        request_id: i64,
    ) -> Result<Option<BloodRequest>, PersistenceError> {
        queries::get_request(&mut self.conn, request_id)
    }

    /// Lists requests in the given statuses, soonest deadline first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_requests_by_status(
        &mut self,
        statuses: &[RequestStatus],
    ) -> Result<Vec<BloodRequest>, PersistenceError> {
        queries::list_requests_by_status(&mut self.conn, statuses)
    }

    /// Lists a hospital's requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_requests_for_hospital(
        &mut self,
        hospital_id: i64,
    ) -> Result<Vec<BloodRequest>, PersistenceError> {
        queries::list_requests_for_hospital(&mut self.conn, hospital_id)
    }

    /// Retrieves a match by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_match(&mut self, match_id: i64) -> Result<Option<Match>, PersistenceError> {
        queries::get_match(&mut self.conn, match_id)
    }

    /// Returns the requests a donor already has a match for.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn matched_request_ids(&mut self, donor_id: i64) -> Result<HashSet<i64>, PersistenceError> {
        queries::matched_request_ids(&mut self.conn, donor_id)
    }

    /// Lists a request's matches with donor details.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_match_summaries(
        &mut self,
        request_id: i64,
    ) -> Result<Vec<MatchSummary>, PersistenceError> {
        queries::list_match_summaries(&mut self.conn, request_id)
    }

    // ========================================================================
    // Appointments, Donations & Artifacts
    // ========================================================================

    /// Retrieves an appointment by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_appointment(
        &mut self,
        appointment_id: i64,
    ) -> Result<Option<Appointment>, PersistenceError> {
        queries::get_appointment(&mut self.conn, appointment_id)
    }

    /// Retrieves a donation by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_donation(&mut self, donation_id: i64) -> Result<Option<Donation>, PersistenceError> {
        queries::get_donation(&mut self.conn, donation_id)
    }

    /// Looks up a certificate by serial.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_certificate(
        &mut self,
        serial: &CertificateSerial,
    ) -> Result<Option<CertificateRecord>, PersistenceError> {
        queries::find_certificate(&mut self.conn, serial)
    }

    /// Lists appointments whose QR code should be rendered.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn appointments_needing_qr(
        &mut self,
        appointment_id: Option<i64>,
        force: bool,
    ) -> Result<Vec<Appointment>, PersistenceError> {
        queries::appointments_needing_qr(&mut self.conn, appointment_id, force)
    }

    /// Lists donations whose certificate should be rendered.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn donations_needing_certificate(
        &mut self,
        donation_id: Option<i64>,
        force: bool,
    ) -> Result<Vec<CertificateSource>, PersistenceError> {
        queries::donations_needing_certificate(&mut self.conn, donation_id, force)
    }

    /// Stores a rendered QR artifact reference.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the appointment does not exist.
    pub fn set_qr_artifact(
        &mut self,
        appointment_id: i64,
        reference: &str,
    ) -> Result<(), PersistenceError> {
        mutations::set_qr_artifact(&mut self.conn, appointment_id, reference)
    }

    /// Stores a rendered certificate reference.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the donation does not exist.
    pub fn set_certificate_artifact(
        &mut self,
        donation_id: i64,
        reference: &str,
    ) -> Result<(), PersistenceError> {
        mutations::set_certificate_artifact(&mut self.conn, donation_id, reference)
    }

    // ========================================================================
    // Audit Event Queries
    // ========================================================================

    /// Retrieves an audit event by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the event is not found or cannot be deserialized.
    pub fn get_audit_event(&mut self, event_id: i64) -> Result<AuditEvent, PersistenceError> {
        queries::get_audit_event(&mut self.conn, event_id)
    }

    /// Retrieves the audit timeline of one entity.
    ///
    /// # Errors
    ///
    /// Returns an error if events cannot be retrieved or deserialized.
    pub fn get_audit_timeline(
        &mut self,
        subject_type: &str,
        subject_id: i64,
    ) -> Result<Vec<AuditEvent>, PersistenceError> {
        queries::get_audit_timeline(&mut self.conn, subject_type, subject_id)
    }

    /// Counts stored audit events.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_audit_events(&mut self) -> Result<i64, PersistenceError> {
        queries::count_audit_events(&mut self.conn)
    }
}
