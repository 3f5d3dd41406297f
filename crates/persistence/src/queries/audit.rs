// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit event queries.
//!
//! This module contains queries for retrieving audit events and the audit
//! timeline of a single entity.

use diesel::SqliteConnection;
use diesel::prelude::*;
use give_pulse_audit::{AuditEvent, AuditSubject};

use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;

/// Diesel Queryable struct for full audit event rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = audit_events)]
struct AuditEventFullRow {
    event_id: i64,
    subject_type: String,
    subject_id: Option<i64>,
    actor_json: String,
    cause_json: String,
    action_json: String,
    before_snapshot_json: String,
    after_snapshot_json: String,
}

impl AuditEventFullRow {
    fn into_event(self) -> Result<AuditEvent, PersistenceError> {
        let mut event: AuditEvent = AuditEvent::new(
            serde_json::from_str(&self.actor_json)?,
            serde_json::from_str(&self.cause_json)?,
            serde_json::from_str(&self.action_json)?,
            serde_json::from_str(&self.before_snapshot_json)?,
            serde_json::from_str(&self.after_snapshot_json)?,
            AuditSubject::new(&self.subject_type, self.subject_id),
        );
        event.event_id = Some(self.event_id);
        Ok(event)
    }
}

/// Retrieves an audit event by ID.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `event_id` - The event ID to retrieve
///
/// # Errors
///
/// Returns an error if the event is not found or cannot be deserialized.
pub fn get_audit_event(
    conn: &mut SqliteConnection,
    event_id: i64,
) -> Result<AuditEvent, PersistenceError> {
    let result = audit_events::table
        .filter(audit_events::event_id.eq(event_id))
        .select(AuditEventFullRow::as_select())
        .first::<AuditEventFullRow>(conn);

    let row: AuditEventFullRow = match result {
        Ok(r) => r,
        Err(diesel::result::Error::NotFound) => {
            return Err(PersistenceError::EventNotFound(event_id));
        }
        Err(e) => return Err(PersistenceError::from(e)),
    };

    row.into_event()
}

/// Retrieves the audit timeline of one entity, oldest first.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `subject_type` - The entity type (`match`, `blood_request`, ...)
/// * `subject_id` - The entity ID
///
/// # Errors
///
/// Returns an error if events cannot be retrieved or deserialized.
pub fn get_audit_timeline(
    conn: &mut SqliteConnection,
    subject_type: &str,
    subject_id: i64,
) -> Result<Vec<AuditEvent>, PersistenceError> {
    let rows: Vec<AuditEventFullRow> = audit_events::table
        .filter(audit_events::subject_type.eq(subject_type))
        .filter(audit_events::subject_id.eq(subject_id))
        .order(audit_events::event_id.asc())
        .select(AuditEventFullRow::as_select())
        .load(conn)?;

    rows.into_iter()
        .map(AuditEventFullRow::into_event)
        .collect()
}

/// Counts all stored audit events.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_audit_events(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    Ok(audit_events::table.count().get_result(conn)?)
}
