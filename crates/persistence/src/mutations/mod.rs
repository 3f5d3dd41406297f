// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Mutation modules.
//!
//! This module contains all state-changing operations for the persistence layer.
//! Mutations use Diesel DSL, with raw SQL limited to `last_insert_rowid()` and
//! the capped fulfillment increment.
//!
//! ## Module Organization
//!
//! - `accounts`: Registration, verification flags and sessions
//! - `hospitals`: Hospital creation and verification
//! - `requests`: Opening and expiring blood requests
//! - `transitions`: Match lifecycle transitions (`persist_transition`)
//! - `artifacts`: Rendered artifact references
//! - `audit`: Audit event persistence

pub mod accounts;
pub mod artifacts;
pub mod audit;
pub mod hospitals;
pub mod requests;
pub mod transitions;

pub use accounts::{
    create_account, create_session, delete_account, delete_expired_sessions,
    delete_orphaned_sessions, delete_session, register_donor, register_staff,
    set_staff_verification, update_session_activity,
};
pub use artifacts::{set_certificate_artifact, set_qr_artifact};
pub use audit::persist_audit_event;
pub use hospitals::{create_hospital, set_hospital_verification};
pub use requests::{persist_request_expired, persist_request_opened};
pub use transitions::persist_transition;
