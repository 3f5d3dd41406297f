// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Match transition persistence.
//!
//! `persist_transition` writes one `TransitionResult` inside an immediate
//! (write-locking) transaction. Every status change is a compare-and-set on
//! the source status, so a transition computed from a stale read fails with
//! `PersistenceError::Conflict` instead of overwriting a concurrent change.
//!
//! Fulfillment is incremented in SQL and re-read before the request status
//! is classified, all under the same write lock.

use diesel::SqliteConnection;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::Integer;
use give_pulse::{Transition, TransitionResult};
use give_pulse_audit::AuditEvent;
use give_pulse_domain::{
    Appointment, AppointmentWindow, DomainError, Donation, FulfillmentOutcome, Match, MatchStatus,
    QrDetails, QrPayload, RequestStatus, classify, ensure_not_in_cooldown,
};
use std::str::FromStr;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::backend::sqlite::{get_last_insert_rowid, optional_stored_timestamp, timestamp_text};
use crate::data_models::PersistTransitionResult;
use crate::diesel_schema::{blood_requests, donation_appointments, donations, donors, matches};
use crate::error::PersistenceError;
use crate::mutations::audit::persist_audit_event;

/// Persists a match transition and its audit event atomically.
///
/// # Arguments
///
/// * `conn` - The active database connection
/// * `result` - The transition result produced by `give_pulse::apply`
///
/// # Errors
///
/// Returns `PersistenceError::Conflict` if a guard finds the stored rows
/// changed since the scope was loaded, `PersistenceError::Ineligible` if the
/// request closed or the donor entered cooldown in the meantime, or an error
/// if any write fails. Nothing is written on failure.
pub fn persist_transition(
    conn: &mut SqliteConnection,
    result: &TransitionResult,
) -> Result<PersistTransitionResult, PersistenceError> {
    let current: &Match = result.new_state.current_match.as_ref().ok_or_else(|| {
        PersistenceError::Other(String::from("Transition result carries no match"))
    })?;

    let persisted: PersistTransitionResult =
        conn.immediate_transaction(|conn| write_transition(conn, current, result))?;

    info!(
        event_id = persisted.event_id,
        match_id = persisted.match_id,
        action = %result.audit_event.action.name,
        "Persisted transition"
    );
    Ok(persisted)
}

fn write_transition(
    conn: &mut SqliteConnection,
    current: &Match,
    result: &TransitionResult,
) -> Result<PersistTransitionResult, PersistenceError> {
    match &result.change {
        Transition::MatchCreated => persist_match_created(conn, current, &result.audit_event),
        Transition::MatchAccepted {
            cooldown_until,
            window,
            qr_details,
        } => persist_match_accepted(
            conn,
            current,
            *cooldown_until,
            *window,
            qr_details,
            &result.audit_event,
        ),
        Transition::MatchDeclined => {
            let match_id: i64 = require_match_id(current)?;
            compare_and_set_status(
                conn,
                match_id,
                &[MatchStatus::Pending],
                MatchStatus::Declined,
                current.declined_at,
            )?;
            finish(conn, match_id, &result.audit_event)
        }
        Transition::MatchCheckedIn => {
            let match_id: i64 = require_match_id(current)?;
            compare_and_set_status(
                conn,
                match_id,
                &[MatchStatus::Accepted],
                MatchStatus::CheckedIn,
                current.checked_in_at,
            )?;
            finish(conn, match_id, &result.audit_event)
        }
        Transition::DonationCompleted { .. } => {
            let donation: &Donation = result.new_state.donation.as_ref().ok_or_else(|| {
                PersistenceError::Other(String::from("Completed donation carries no donation"))
            })?;
            persist_donation_completed(
                conn,
                current,
                result.new_state.request.request_id,
                donation,
                &result.audit_event,
            )
        }
    }
}

fn require_match_id(current: &Match) -> Result<i64, PersistenceError> {
    current
        .match_id
        .ok_or_else(|| PersistenceError::Other(String::from("Match has not been persisted")))
}

fn finish(
    conn: &mut SqliteConnection,
    match_id: i64,
    event: &AuditEvent,
) -> Result<PersistTransitionResult, PersistenceError> {
    let event_id: i64 = persist_audit_event(conn, event)?;
    Ok(PersistTransitionResult {
        event_id,
        match_id,
        appointment: None,
        donation_id: None,
        fulfillment: None,
    })
}

fn persist_match_created(
    conn: &mut SqliteConnection,
    created: &Match,
    event: &AuditEvent,
) -> Result<PersistTransitionResult, PersistenceError> {
    let existing: Option<i64> = matches::table
        .filter(matches::request_id.eq(created.request_id))
        .filter(matches::donor_id.eq(created.donor_id))
        .select(matches::match_id)
        .first::<i64>(conn)
        .optional()?;
    if let Some(existing_id) = existing {
        return Err(PersistenceError::Conflict {
            resource: String::from("match"),
            message: format!(
                "donor {} already responded to request {}",
                created.donor_id, created.request_id
            ),
            existing_id: Some(existing_id),
        });
    }

    let request_status: String = blood_requests::table
        .filter(blood_requests::request_id.eq(created.request_id))
        .select(blood_requests::status)
        .first(conn)?;
    let status: RequestStatus = RequestStatus::from_str(&request_status)?;
    if !status.accepts_matches() {
        let err: DomainError = DomainError::RequestNotAcceptingMatches {
            request_id: created.request_id,
            status,
        };
        return Err(PersistenceError::Ineligible(err));
    }

    let cooldown_text: Option<String> = donors::table
        .filter(donors::donor_id.eq(created.donor_id))
        .select(donors::cooldown_until)
        .first(conn)?;
    let cooldown_until: Option<OffsetDateTime> =
        optional_stored_timestamp(cooldown_text.as_deref())?;
    ensure_not_in_cooldown(cooldown_until, created.created_at)
        .map_err(PersistenceError::Ineligible)?;

    diesel::insert_into(matches::table)
        .values((
            matches::request_id.eq(created.request_id),
            matches::donor_id.eq(created.donor_id),
            matches::status.eq(MatchStatus::Pending.as_str()),
            matches::created_at.eq(timestamp_text(created.created_at)?),
        ))
        .execute(conn)?;

    let match_id: i64 = get_last_insert_rowid(conn)?;
    debug!(match_id, "Inserted pending match");
    finish(conn, match_id, &event.with_subject_id(match_id))
}

fn persist_match_accepted(
    conn: &mut SqliteConnection,
    accepted: &Match,
    cooldown_until: OffsetDateTime,
    window: AppointmentWindow,
    qr_details: &QrDetails,
    event: &AuditEvent,
) -> Result<PersistTransitionResult, PersistenceError> {
    let match_id: i64 = require_match_id(accepted)?;
    compare_and_set_status(
        conn,
        match_id,
        &[MatchStatus::Pending],
        MatchStatus::Accepted,
        accepted.accepted_at,
    )?;

    diesel::update(donors::table)
        .filter(donors::donor_id.eq(accepted.donor_id))
        .set(donors::cooldown_until.eq(timestamp_text(cooldown_until)?))
        .execute(conn)?;

    diesel::insert_into(donation_appointments::table)
        .values((
            donation_appointments::match_id.eq(match_id),
            donation_appointments::window_start.eq(timestamp_text(window.start())?),
            donation_appointments::window_end.eq(timestamp_text(window.end())?),
        ))
        .execute(conn)?;
    let appointment_id: i64 = get_last_insert_rowid(conn)?;

    let payload: QrPayload = QrPayload::new(appointment_id, match_id, qr_details.clone());
    diesel::update(donation_appointments::table)
        .filter(donation_appointments::appointment_id.eq(appointment_id))
        .set(donation_appointments::qr_payload.eq(serde_json::to_string(&payload)?))
        .execute(conn)?;
    debug!(match_id, appointment_id, "Booked appointment");

    let mut persisted: PersistTransitionResult = finish(conn, match_id, event)?;
    persisted.appointment = Some(Appointment {
        appointment_id: Some(appointment_id),
        match_id,
        window,
        qr_payload: Some(payload),
        qr_artifact: None,
    });
    Ok(persisted)
}

fn persist_donation_completed(
    conn: &mut SqliteConnection,
    donated: &Match,
    request_id: Option<i64>,
    donation: &Donation,
    event: &AuditEvent,
) -> Result<PersistTransitionResult, PersistenceError> {
    let match_id: i64 = require_match_id(donated)?;
    let request_id: i64 = request_id
        .ok_or_else(|| PersistenceError::Other(String::from("Request has not been persisted")))?;

    let existing: Option<i64> = donations::table
        .filter(donations::match_id.eq(match_id))
        .select(donations::donation_id)
        .first::<i64>(conn)
        .optional()?;
    if let Some(existing_id) = existing {
        return Err(PersistenceError::Conflict {
            resource: String::from("donation"),
            message: format!("match {match_id} already has a donation"),
            existing_id: Some(existing_id),
        });
    }

    compare_and_set_status(
        conn,
        match_id,
        &[MatchStatus::Accepted, MatchStatus::CheckedIn],
        MatchStatus::Donated,
        donated.donated_at,
    )?;

    let inserted: Result<usize, diesel::result::Error> = diesel::insert_into(donations::table)
        .values((
            donations::match_id.eq(match_id),
            donations::units.eq(donation.units),
            donations::certificate_serial.eq(donation.certificate_serial.as_str()),
            donations::confirmed_by_staff_id.eq(donation.confirmed_by_staff_id),
            donations::confirmed_at.eq(timestamp_text(donation.confirmed_at)?),
        ))
        .execute(conn);
    match inserted.map_err(PersistenceError::from) {
        Ok(_) => {}
        Err(PersistenceError::UniqueViolation(message)) => {
            return Err(PersistenceError::Conflict {
                resource: String::from("certificate_serial"),
                message,
                existing_id: None,
            });
        }
        Err(e) => return Err(e),
    }
    let donation_id: i64 = get_last_insert_rowid(conn)?;

    // Capped in SQL so concurrent completions add to the committed count.
    diesel::update(blood_requests::table)
        .filter(blood_requests::request_id.eq(request_id))
        .set(
            blood_requests::units_fulfilled.eq(sql::<Integer>("MIN(units_fulfilled + ")
                .bind::<Integer, _>(donation.units)
                .sql(", units_requested)")),
        )
        .execute(conn)?;

    let (status_text, units_fulfilled, units_requested): (String, i32, i32) =
        blood_requests::table
            .filter(blood_requests::request_id.eq(request_id))
            .select((
                blood_requests::status,
                blood_requests::units_fulfilled,
                blood_requests::units_requested,
            ))
            .first(conn)?;
    let previous_status: RequestStatus = RequestStatus::from_str(&status_text)?;
    let status: RequestStatus = classify(previous_status, units_fulfilled, units_requested);
    if status != previous_status {
        diesel::update(blood_requests::table)
            .filter(blood_requests::request_id.eq(request_id))
            .set(blood_requests::status.eq(status.as_str()))
            .execute(conn)?;
    }
    debug!(
        request_id,
        donation_id,
        units_fulfilled,
        units_requested,
        status = %status,
        "Recorded donation against request"
    );

    let mut persisted: PersistTransitionResult = finish(conn, match_id, event)?;
    persisted.donation_id = Some(donation_id);
    persisted.fulfillment = Some(FulfillmentOutcome {
        units_fulfilled,
        status,
        previous_status,
    });
    Ok(persisted)
}

/// Moves a match to `to` only if its stored status is one of `from`.
fn compare_and_set_status(
    conn: &mut SqliteConnection,
    match_id: i64,
    from: &[MatchStatus],
    to: MatchStatus,
    at: Option<OffsetDateTime>,
) -> Result<(), PersistenceError> {
    let at: String = timestamp_text(at.ok_or_else(|| {
        PersistenceError::Other(format!("Match {match_id} has no {to} timestamp"))
    })?)?;
    let sources: Vec<&'static str> = from.iter().map(MatchStatus::as_str).collect();
    let target = matches::table
        .filter(matches::match_id.eq(match_id))
        .filter(matches::status.eq_any(sources));

    let status = matches::status.eq(to.as_str());
    let updated: usize = match to {
        MatchStatus::Accepted => diesel::update(target)
            .set((status, matches::accepted_at.eq(at)))
            .execute(conn)?,
        MatchStatus::Declined => diesel::update(target)
            .set((status, matches::declined_at.eq(at)))
            .execute(conn)?,
        MatchStatus::CheckedIn => diesel::update(target)
            .set((status, matches::checked_in_at.eq(at)))
            .execute(conn)?,
        MatchStatus::Donated => diesel::update(target)
            .set((status, matches::donated_at.eq(at)))
            .execute(conn)?,
        MatchStatus::Pending => {
            return Err(PersistenceError::Other(String::from(
                "A match cannot move back to pending",
            )));
        }
    };

    if updated == 0 {
        return Err(PersistenceError::Conflict {
            resource: String::from("match"),
            message: format!("match is no longer {}", sources_text(from)),
            existing_id: Some(match_id),
        });
    }
    Ok(())
}

fn sources_text(from: &[MatchStatus]) -> String {
    from.iter()
        .map(MatchStatus::as_str)
        .collect::<Vec<&str>>()
        .join(" or ")
}
