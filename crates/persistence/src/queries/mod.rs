// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Query modules for persistence layer.
//!
//! This module contains all read-only queries for the persistence layer.
//!
//! ## Module Organization
//!
//! - `accounts`: Accounts, donor and staff profiles, sessions
//! - `hospitals`: Hospital lookups
//! - `requests`: Blood request lookups and listings
//! - `matches`: Matches and transition scope loading
//! - `artifacts`: Appointments, donations and certificate lookups
//! - `audit`: Audit event queries
//!
//! The `Persistence` adapter in `lib.rs` wraps these functions.

pub mod accounts;
pub mod artifacts;
pub mod audit;
pub mod hospitals;
pub mod matches;
pub mod requests;
mod rows;

pub use accounts::{
    count_admin_accounts, get_account_by_email, get_account_by_id, get_donor_by_account,
    get_session_by_token, get_staff_by_account, verify_password,
};
pub use artifacts::{
    appointments_needing_qr, donations_needing_certificate, find_certificate, get_appointment,
    get_donation,
};
pub use audit::{count_audit_events, get_audit_event, get_audit_timeline};
pub use hospitals::{get_hospital, list_hospitals, list_hospitals_by_city};
pub use matches::{
    get_match, list_match_summaries, load_scope, load_scope_for_match, matched_request_ids,
};
pub use requests::{get_request, list_requests_by_status, list_requests_for_hospital};
