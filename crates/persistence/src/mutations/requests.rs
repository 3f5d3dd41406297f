// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Blood request mutations.

use diesel::SqliteConnection;
use diesel::prelude::*;
use give_pulse::RequestTransition;
use give_pulse_audit::AuditEvent;
use give_pulse_domain::{BloodRequest, RequestStatus};
use tracing::info;

use crate::backend::sqlite::{get_last_insert_rowid, timestamp_text};
use crate::diesel_schema::blood_requests;
use crate::error::PersistenceError;
use crate::mutations::audit::persist_audit_event;

/// Inserts a newly opened request and its audit event.
///
/// # Returns
///
/// `(request_id, event_id)`.
///
/// # Errors
///
/// Returns an error if either insert fails. Nothing is written on failure.
pub fn persist_request_opened(
    conn: &mut SqliteConnection,
    transition: &RequestTransition,
) -> Result<(i64, i64), PersistenceError> {
    conn.immediate_transaction(|conn| {
        let request: &BloodRequest = &transition.request;

        diesel::insert_into(blood_requests::table)
            .values((
                blood_requests::hospital_id.eq(request.hospital_id),
                blood_requests::created_by_staff_id.eq(request.created_by_staff_id),
                blood_requests::abo_type.eq(request.blood_type.abo().as_str()),
                blood_requests::rh_type.eq(request.blood_type.rh().as_str()),
                blood_requests::city.eq(&request.city),
                blood_requests::district.eq(&request.district),
                blood_requests::units_requested.eq(request.units_requested),
                blood_requests::units_fulfilled.eq(request.units_fulfilled),
                blood_requests::status.eq(request.status.as_str()),
                blood_requests::deadline_at.eq(timestamp_text(request.deadline_at)?),
                blood_requests::notes.eq(&request.notes),
                blood_requests::created_at.eq(timestamp_text(request.created_at)?),
            ))
            .execute(conn)?;

        let request_id: i64 = get_last_insert_rowid(conn)?;
        let event: AuditEvent = transition.audit_event.with_subject_id(request_id);
        let event_id: i64 = persist_audit_event(conn, &event)?;

        info!(
            request_id,
            event_id,
            hospital_id = request.hospital_id,
            blood_type = %request.blood_type,
            units = request.units_requested,
            "Blood request opened"
        );
        Ok((request_id, event_id))
    })
}

/// Marks an overdue request expired and records its audit event.
///
/// The update only applies while the stored status is still open or
/// partial.
///
/// # Errors
///
/// Returns `PersistenceError::Conflict` if the request was closed in the
/// meantime, or an error if a write fails.
pub fn persist_request_expired(
    conn: &mut SqliteConnection,
    transition: &RequestTransition,
) -> Result<i64, PersistenceError> {
    let request_id: i64 = transition.request.request_id.ok_or_else(|| {
        PersistenceError::Other(String::from("Cannot expire a request without an ID"))
    })?;

    conn.immediate_transaction(|conn| {
        let updated: usize = diesel::update(blood_requests::table)
            .filter(blood_requests::request_id.eq(request_id))
            .filter(blood_requests::status.eq_any([
                RequestStatus::Open.as_str(),
                RequestStatus::Partial.as_str(),
            ]))
            .set(blood_requests::status.eq(RequestStatus::Expired.as_str()))
            .execute(conn)?;

        if updated == 0 {
            return Err(PersistenceError::Conflict {
                resource: String::from("blood_request"),
                message: String::from("request is no longer open"),
                existing_id: Some(request_id),
            });
        }

        let event_id: i64 = persist_audit_event(conn, &transition.audit_event)?;
        info!(request_id, event_id, "Blood request expired");
        Ok(event_id)
    })
}
