// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::{Command, RequestCommand};
use crate::error::{CoreError, stored_id};
use crate::state::{RequestTransition, State, Transition, TransitionResult};
use give_pulse_audit::{Action, Actor, AuditEvent, AuditSubject, Cause, StateSnapshot};
use give_pulse_domain::{
    Appointment, AppointmentWindow, BloodRequest, BloodRequestDraft, DEFAULT_COOLDOWN_DAYS,
    DomainError, Donation, FulfillmentOutcome, Hospital, Match, MatchStatus, QrDetails,
    RequestStatus, apply_cooldown, ensure_compatible, ensure_not_in_cooldown, expire_if_overdue,
    record_donation,
};
use time::OffsetDateTime;

/// Applies a match command to the transition scope, producing a new state and audit event.
///
/// # Arguments
///
/// * `state` - The current transition scope (immutable)
/// * `command` - The command to apply
/// * `now` - The time the command is applied
/// * `actor` - The actor performing this action
/// * `cause` - The cause or reason for this action
///
/// # Returns
///
/// * `Ok(TransitionResult)` containing the new state, the change and an audit event
/// * `Err(CoreError)` if the command is not permitted in the current state
///
/// # Errors
///
/// Returns an error if:
/// - A match already exists when creating one, or none exists otherwise
/// - The request no longer accepts donors
/// - The donor is incompatible or in cooldown
/// - The match status does not allow the transition
/// - A donation was already recorded for the match
/// - A scanned QR payload does not belong to the match
pub fn apply(
    state: &State,
    command: Command,
    now: OffsetDateTime,
    actor: Actor,
    cause: Cause,
) -> Result<TransitionResult, CoreError> {
    let action_name: &'static str = command.action_name();
    let before: StateSnapshot = state.to_snapshot();

    let (new_state, change, details): (State, Transition, String) = match command {
        Command::CreateMatch => create_match(state, now)?,
        Command::AcceptMatch => accept_match(state, now)?,
        Command::DeclineMatch => decline_match(state, now)?,
        Command::CheckInMatch { payload } => {
            let current: &Match = require_match(state)?;
            let match_id: i64 = persisted_match_id(state, current)?;
            let appointment_id: i64 = state
                .appointment
                .as_ref()
                .and_then(|a| a.appointment_id)
                .ok_or(DomainError::AppointmentMissing { match_id })?;
            payload.verify(appointment_id, match_id)?;
            current.status.validate_transition(MatchStatus::CheckedIn)?;

            let mut new_state: State = state.clone();
            if let Some(m) = new_state.current_match.as_mut() {
                m.status = MatchStatus::CheckedIn;
                m.checked_in_at = Some(now);
            }
            (
                new_state,
                Transition::MatchCheckedIn,
                format!("Checked in donor for appointment {appointment_id}"),
            )
        }
        Command::CompleteDonation {
            units,
            certificate_serial,
            confirmed_by_staff_id,
        } => {
            let current: &Match = require_match(state)?;
            let match_id: i64 = persisted_match_id(state, current)?;
            if state.donation.is_some() {
                return Err(DomainError::DonationAlreadyRecorded { match_id }.into());
            }
            if state.appointment.is_none() {
                return Err(DomainError::AppointmentMissing { match_id }.into());
            }
            current.status.validate_transition(MatchStatus::Donated)?;

            let fulfillment: FulfillmentOutcome = record_donation(
                state.request.status,
                state.request.units_fulfilled,
                state.request.units_requested,
                units,
            )?;

            let mut new_state: State = state.clone();
            if let Some(m) = new_state.current_match.as_mut() {
                m.status = MatchStatus::Donated;
                m.donated_at = Some(now);
            }
            new_state.request.units_fulfilled = fulfillment.units_fulfilled;
            new_state.request.status = fulfillment.status;
            new_state.donation = Some(Donation {
                donation_id: None,
                match_id,
                units,
                certificate_serial: certificate_serial.clone(),
                confirmed_by_staff_id,
                confirmed_at: now,
                certificate_artifact: None,
            });
            (
                new_state,
                Transition::DonationCompleted { fulfillment },
                format!(
                    "Recorded {units} unit(s) with certificate {certificate_serial}; request is {}",
                    fulfillment.status
                ),
            )
        }
    };

    let after: StateSnapshot = new_state.to_snapshot();
    let subject_id: Option<i64> = state.current_match.as_ref().and_then(|m| m.match_id);
    let audit_event: AuditEvent = AuditEvent::new(
        actor,
        cause,
        Action::new(String::from(action_name), Some(details)),
        before,
        after,
        AuditSubject::new("match", subject_id),
    );

    Ok(TransitionResult {
        new_state,
        change,
        audit_event,
    })
}

fn create_match(
    state: &State,
    now: OffsetDateTime,
) -> Result<(State, Transition, String), CoreError> {
    let request_id: i64 = stored_id(state.request.request_id, "blood request")?;
    let donor_id: i64 = stored_id(state.donor.donor_id, "donor")?;

    if let Some(existing) = &state.current_match {
        return Err(DomainError::DuplicateMatch {
            request_id,
            donor_id,
            existing_match_id: existing.match_id,
        }
        .into());
    }

    if !state.request.status.accepts_matches() {
        return Err(DomainError::RequestNotAcceptingMatches {
            request_id,
            status: state.request.status,
        }
        .into());
    }

    if state.request.deadline_at <= now {
        return Err(DomainError::RequestDeadlinePassed {
            request_id,
            deadline_at: state.request.deadline_at,
        }
        .into());
    }

    ensure_compatible(state.donor.blood_type, state.request.blood_type)?;
    ensure_not_in_cooldown(state.donor.cooldown_until, now)?;

    let mut new_state: State = state.clone();
    new_state.current_match = Some(Match::pending(request_id, donor_id, now));

    Ok((
        new_state,
        Transition::MatchCreated,
        format!(
            "Donor {donor_id} ({}) responded to request {request_id} ({})",
            state.donor.blood_type, state.request.blood_type
        ),
    ))
}

fn accept_match(
    state: &State,
    now: OffsetDateTime,
) -> Result<(State, Transition, String), CoreError> {
    let current: &Match = require_match(state)?;
    let match_id: i64 = persisted_match_id(state, current)?;
    current.status.validate_transition(MatchStatus::Accepted)?;

    let cooldown_until: OffsetDateTime = apply_cooldown(now, DEFAULT_COOLDOWN_DAYS)?;
    let window: AppointmentWindow = AppointmentWindow::for_acceptance(now)?;
    let qr_details: QrDetails = QrDetails {
        donor_name: state.donor.full_name(),
        donor_email: state.donor.email.clone(),
        blood_type: state.donor.blood_type,
        hospital_name: state.hospital.name.clone(),
        window,
    };

    let mut new_state: State = state.clone();
    if let Some(m) = new_state.current_match.as_mut() {
        m.status = MatchStatus::Accepted;
        m.accepted_at = Some(now);
    }
    new_state.donor.cooldown_until = Some(cooldown_until);
    new_state.appointment = Some(Appointment {
        appointment_id: None,
        match_id,
        window,
        qr_payload: None,
        qr_artifact: None,
    });

    Ok((
        new_state,
        Transition::MatchAccepted {
            cooldown_until,
            window,
            qr_details,
        },
        format!("Accepted match {match_id}; donor rests for {DEFAULT_COOLDOWN_DAYS} days"),
    ))
}

fn decline_match(
    state: &State,
    now: OffsetDateTime,
) -> Result<(State, Transition, String), CoreError> {
    let current: &Match = require_match(state)?;
    let match_id: i64 = persisted_match_id(state, current)?;
    current.status.validate_transition(MatchStatus::Declined)?;

    let mut new_state: State = state.clone();
    if let Some(m) = new_state.current_match.as_mut() {
        m.status = MatchStatus::Declined;
        m.declined_at = Some(now);
    }

    Ok((
        new_state,
        Transition::MatchDeclined,
        format!("Declined match {match_id}"),
    ))
}

fn require_match(state: &State) -> Result<&Match, DomainError> {
    state
        .current_match
        .as_ref()
        .ok_or_else(|| DomainError::MatchNotFound {
            request_id: state.request.request_id.unwrap_or_default(),
            donor_id: state.donor.donor_id.unwrap_or_default(),
        })
}

fn persisted_match_id(state: &State, current: &Match) -> Result<i64, DomainError> {
    current.match_id.ok_or_else(|| DomainError::MatchNotFound {
        request_id: state.request.request_id.unwrap_or_default(),
        donor_id: state.donor.donor_id.unwrap_or_default(),
    })
}

/// Applies a request-level command.
///
/// # Arguments
///
/// * `hospital` - The hospital the request belongs to
/// * `request` - The existing request, `None` when opening a new one
/// * `command` - The command to apply
/// * `now` - The time the command is applied
/// * `actor` - The actor performing this action
/// * `cause` - The cause or reason for this action
///
/// # Errors
///
/// Returns an error if:
/// - The draft fails validation when opening a request
/// - `Expire` is applied without a request, or to a request that is not overdue
pub fn apply_request_command(
    hospital: &Hospital,
    request: Option<&BloodRequest>,
    command: RequestCommand,
    now: OffsetDateTime,
    actor: Actor,
    cause: Cause,
) -> Result<RequestTransition, CoreError> {
    match command {
        RequestCommand::Open {
            draft,
            created_by_staff_id,
        } => {
            let validated: BloodRequestDraft = draft.validate(hospital, now)?;
            let hospital_id: i64 = stored_id(hospital.hospital_id, "hospital")?;
            let new_request: BloodRequest = BloodRequest {
                request_id: None,
                hospital_id,
                created_by_staff_id: Some(created_by_staff_id),
                blood_type: validated.blood_type,
                city: validated.city,
                district: validated.district,
                units_requested: validated.units_requested,
                units_fulfilled: 0,
                status: RequestStatus::Open,
                deadline_at: validated.deadline_at,
                notes: validated.notes,
                created_at: now,
            };

            let after: StateSnapshot = request_snapshot(&new_request);
            let audit_event: AuditEvent = AuditEvent::new(
                actor,
                cause,
                Action::new(
                    String::from("OpenBloodRequest"),
                    Some(format!(
                        "Requested {} unit(s) of {} at {}",
                        new_request.units_requested, new_request.blood_type, hospital.name
                    )),
                ),
                StateSnapshot::absent(),
                after,
                AuditSubject::new("blood_request", None),
            );

            Ok(RequestTransition {
                request: new_request,
                audit_event,
            })
        }
        RequestCommand::Expire => {
            let existing: &BloodRequest = request.ok_or(CoreError::MissingRequest)?;
            let Some(status) = expire_if_overdue(existing.status, existing.deadline_at, now)
            else {
                return Err(DomainError::InvalidStatusTransition {
                    entity: "blood_request",
                    from: existing.status.to_string(),
                    to: RequestStatus::Expired.to_string(),
                    reason: String::from("request is closed or its deadline has not passed"),
                }
                .into());
            };

            let before: StateSnapshot = request_snapshot(existing);
            let mut expired: BloodRequest = existing.clone();
            expired.status = status;
            let after: StateSnapshot = request_snapshot(&expired);

            let audit_event: AuditEvent = AuditEvent::new(
                actor,
                cause,
                Action::new(
                    String::from("ExpireBloodRequest"),
                    Some(String::from("Deadline passed before the request was fulfilled")),
                ),
                before,
                after,
                AuditSubject::new("blood_request", existing.request_id),
            );

            Ok(RequestTransition {
                request: expired,
                audit_event,
            })
        }
    }
}

fn request_snapshot(request: &BloodRequest) -> StateSnapshot {
    StateSnapshot::new(format!(
        "status={},units={}/{},blood_type={},deadline={}",
        request.status,
        request.units_fulfilled,
        request.units_requested,
        request.blood_type,
        request.deadline_at.unix_timestamp()
    ))
}
