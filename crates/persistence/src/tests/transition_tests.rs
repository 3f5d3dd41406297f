// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for persisting match transitions.

use give_pulse::{Command, State, TransitionResult, apply};
use give_pulse_domain::{
    Appointment, BloodRequest, CertificateSerial, DEFAULT_COOLDOWN_DAYS, DomainError, Donor, Match,
    MatchStatus, QrPayload, RequestStatus,
};
use time::Duration;

use crate::PersistenceError;
use crate::tests::{
    Fixture, NOW, apply_and_persist, create_test_actor, create_test_cause, create_test_donor,
    open_test_request,
};

fn complete_command(serial_suffix: u32, units: i32, staff_id: i64) -> Command {
    Command::CompleteDonation {
        units,
        certificate_serial: CertificateSerial::compose(NOW.date(), serial_suffix),
        confirmed_by_staff_id: Some(staff_id),
    }
}

#[test]
fn test_create_match_inserts_pending_match_and_audit_event() {
    let mut fixture = Fixture::new(1);

    let persisted = fixture.create_match();

    let stored: Match = fixture
        .persistence
        .get_match(persisted.match_id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, MatchStatus::Pending);
    assert_eq!(stored.created_at, NOW);

    let event = fixture
        .persistence
        .get_audit_event(persisted.event_id)
        .unwrap();
    assert_eq!(event.action.name, "CreateMatch");
    assert_eq!(event.subject.entity_type, "match");
    assert_eq!(event.subject.entity_id, Some(persisted.match_id));
}

#[test]
fn test_stale_create_is_rejected_with_existing_match_id() {
    let mut fixture = Fixture::new(1);
    let state: State = fixture
        .persistence
        .load_scope(fixture.request_id(), fixture.donor_id())
        .unwrap();
    let stale: TransitionResult = apply(
        &state,
        Command::CreateMatch,
        NOW,
        create_test_actor(),
        create_test_cause(),
    )
    .unwrap();

    let first = fixture.create_match();
    let err = fixture.persistence.persist_transition(&stale).unwrap_err();

    assert_eq!(
        err,
        PersistenceError::Conflict {
            resource: String::from("match"),
            message: format!(
                "donor {} already responded to request {}",
                fixture.donor_id(),
                fixture.request_id()
            ),
            existing_id: Some(first.match_id),
        }
    );
    let summaries = fixture
        .persistence
        .list_match_summaries(fixture.request_id())
        .unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].record.status, MatchStatus::Pending);
}

#[test]
fn test_stale_create_is_ineligible_once_donor_enters_cooldown() {
    let mut fixture = Fixture::new(1);
    let other: BloodRequest = open_test_request(
        &mut fixture.persistence,
        &fixture.hospital,
        fixture.staff_id,
        "B+",
        1,
    );
    let other_id: i64 = other.request_id.unwrap();
    let state: State = fixture
        .persistence
        .load_scope(other_id, fixture.donor_id())
        .unwrap();
    let stale: TransitionResult = apply(
        &state,
        Command::CreateMatch,
        NOW,
        create_test_actor(),
        create_test_cause(),
    )
    .unwrap();

    fixture.create_match();
    fixture.accept_match();
    let err = fixture.persistence.persist_transition(&stale).unwrap_err();

    assert_eq!(
        err,
        PersistenceError::Ineligible(DomainError::DonorInCooldown {
            until: NOW + Duration::hours(1) + Duration::days(DEFAULT_COOLDOWN_DAYS),
        })
    );
    assert!(
        fixture
            .persistence
            .list_match_summaries(other_id)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_accept_sets_cooldown_and_books_one_appointment() {
    let mut fixture = Fixture::new(1);
    fixture.create_match();

    let persisted = fixture.accept_match();

    let appointment: Appointment = persisted.appointment.clone().unwrap();
    let appointment_id: i64 = appointment.appointment_id.unwrap();
    assert_eq!(appointment.window.length(), Duration::hours(2));
    assert_eq!(appointment.window.start(), NOW + Duration::hours(25));

    let payload: QrPayload = appointment.qr_payload.unwrap();
    assert_eq!(payload.appointment_id, appointment_id);
    assert_eq!(payload.match_id, persisted.match_id);
    assert_eq!(payload.hospital_name, "City General");
    assert!(payload.verify(appointment_id, persisted.match_id).is_ok());

    let state: State = fixture
        .persistence
        .load_scope_for_match(persisted.match_id)
        .unwrap();
    let stored_match: Match = state.current_match.unwrap();
    assert_eq!(stored_match.status, MatchStatus::Accepted);
    assert_eq!(
        state.donor.cooldown_until,
        Some(NOW + Duration::hours(1) + Duration::days(DEFAULT_COOLDOWN_DAYS))
    );
    let stored_appointment: Appointment = state.appointment.unwrap();
    assert_eq!(stored_appointment.appointment_id, Some(appointment_id));
    assert_eq!(stored_appointment.qr_payload, Some(payload));
    assert_eq!(stored_appointment.qr_artifact, None);
    assert_eq!(state.request.units_fulfilled, 0);
    assert_eq!(state.request.status, RequestStatus::Open);
}

#[test]
fn test_stale_accept_fails_compare_and_set() {
    let mut fixture = Fixture::new(1);
    let created = fixture.create_match();
    let state: State = fixture
        .persistence
        .load_scope_for_match(created.match_id)
        .unwrap();
    let stale_accept: TransitionResult = apply(
        &state,
        Command::AcceptMatch,
        NOW,
        create_test_actor(),
        create_test_cause(),
    )
    .unwrap();

    let (request_id, donor_id) = (fixture.request_id(), fixture.donor_id());
    apply_and_persist(
        &mut fixture.persistence,
        request_id,
        donor_id,
        Command::DeclineMatch,
        NOW,
    );
    let err = fixture
        .persistence
        .persist_transition(&stale_accept)
        .unwrap_err();

    assert!(matches!(
        err,
        PersistenceError::Conflict { ref resource, existing_id: Some(id), .. }
            if resource == "match" && id == created.match_id
    ));
    let donor: Donor = fixture
        .persistence
        .load_scope_for_match(created.match_id)
        .unwrap()
        .donor;
    assert_eq!(donor.cooldown_until, None);
    assert!(
        fixture
            .persistence
            .appointments_needing_qr(None, true)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_decline_leaves_units_and_cooldown_untouched() {
    let mut fixture = Fixture::new(2);
    fixture.create_match();

    let (request_id, donor_id) = (fixture.request_id(), fixture.donor_id());
    let persisted = apply_and_persist(
        &mut fixture.persistence,
        request_id,
        donor_id,
        Command::DeclineMatch,
        NOW,
    );

    let state: State = fixture
        .persistence
        .load_scope_for_match(persisted.match_id)
        .unwrap();
    assert_eq!(state.current_match.unwrap().status, MatchStatus::Declined);
    assert_eq!(state.donor.cooldown_until, None);
    assert_eq!(state.request.units_fulfilled, 0);
    assert_eq!(state.appointment, None);
}

#[test]
fn test_check_in_then_complete_fulfills_single_unit_request() {
    let mut fixture = Fixture::new(1);
    fixture.create_match();
    let accepted = fixture.accept_match();
    let payload: QrPayload = accepted.appointment.unwrap().qr_payload.unwrap();

    let (request_id, donor_id) = (fixture.request_id(), fixture.donor_id());
    apply_and_persist(
        &mut fixture.persistence,
        request_id,
        donor_id,
        Command::CheckInMatch { payload },
        NOW + Duration::hours(25),
    );
    let completed = apply_and_persist(
        &mut fixture.persistence,
        request_id,
        donor_id,
        complete_command(0x00AB_CDEF, 1, fixture.staff_id),
        NOW + Duration::hours(26),
    );

    let fulfillment = completed.fulfillment.unwrap();
    assert_eq!(fulfillment.units_fulfilled, 1);
    assert_eq!(fulfillment.status, RequestStatus::Fulfilled);
    assert_eq!(fulfillment.previous_status, RequestStatus::Open);

    let request: BloodRequest = fixture
        .persistence
        .get_request(request_id)
        .unwrap()
        .unwrap();
    assert_eq!(request.status, RequestStatus::Fulfilled);
    assert_eq!(request.units_fulfilled, 1);

    let state: State = fixture
        .persistence
        .load_scope_for_match(completed.match_id)
        .unwrap();
    let stored_match: Match = state.current_match.unwrap();
    assert_eq!(stored_match.status, MatchStatus::Donated);
    assert!(stored_match.checked_in_at.is_some());
    assert_eq!(state.donation.unwrap().donation_id, completed.donation_id);
}

#[test]
fn test_complete_against_three_units_is_partial() {
    let mut fixture = Fixture::new(3);
    fixture.create_match();
    fixture.accept_match();

    let (request_id, donor_id) = (fixture.request_id(), fixture.donor_id());
    let completed = apply_and_persist(
        &mut fixture.persistence,
        request_id,
        donor_id,
        complete_command(1, 1, fixture.staff_id),
        NOW + Duration::hours(25),
    );

    let fulfillment = completed.fulfillment.unwrap();
    assert_eq!(fulfillment.units_fulfilled, 1);
    assert_eq!(fulfillment.status, RequestStatus::Partial);
}

#[test]
fn test_fulfillment_adds_to_committed_count_and_caps() {
    let mut fixture = Fixture::new(3);
    let second: Donor = create_test_donor(&mut fixture.persistence, "rui@example.com", "A+");
    let second_id: i64 = second.donor_id.unwrap();
    let request_id: i64 = fixture.request_id();

    fixture.create_match();
    fixture.accept_match();
    apply_and_persist(
        &mut fixture.persistence,
        request_id,
        second_id,
        Command::CreateMatch,
        NOW,
    );
    apply_and_persist(
        &mut fixture.persistence,
        request_id,
        second_id,
        Command::AcceptMatch,
        NOW + Duration::hours(1),
    );

    // Both completions are computed from the same stale count of zero.
    let first_scope: State = fixture
        .persistence
        .load_scope(request_id, fixture.donor_id())
        .unwrap();
    let second_scope: State = fixture
        .persistence
        .load_scope(request_id, second_id)
        .unwrap();
    let first: TransitionResult = apply(
        &first_scope,
        complete_command(2, 2, fixture.staff_id),
        NOW + Duration::hours(25),
        create_test_actor(),
        create_test_cause(),
    )
    .unwrap();
    let second: TransitionResult = apply(
        &second_scope,
        complete_command(3, 2, fixture.staff_id),
        NOW + Duration::hours(25),
        create_test_actor(),
        create_test_cause(),
    )
    .unwrap();

    let first_persisted = fixture.persistence.persist_transition(&first).unwrap();
    let second_persisted = fixture.persistence.persist_transition(&second).unwrap();

    assert_eq!(first_persisted.fulfillment.unwrap().units_fulfilled, 2);
    assert_eq!(
        first_persisted.fulfillment.unwrap().status,
        RequestStatus::Partial
    );
    let last = second_persisted.fulfillment.unwrap();
    assert_eq!(last.units_fulfilled, 3);
    assert_eq!(last.status, RequestStatus::Fulfilled);
    assert_eq!(last.previous_status, RequestStatus::Partial);
}

#[test]
fn test_duplicate_certificate_serial_is_a_conflict() {
    let mut fixture = Fixture::new(3);
    let second: Donor = create_test_donor(&mut fixture.persistence, "rui@example.com", "A+");
    let second_id: i64 = second.donor_id.unwrap();
    let request_id: i64 = fixture.request_id();

    fixture.create_match();
    fixture.accept_match();
    apply_and_persist(
        &mut fixture.persistence,
        request_id,
        second_id,
        Command::CreateMatch,
        NOW,
    );
    apply_and_persist(
        &mut fixture.persistence,
        request_id,
        second_id,
        Command::AcceptMatch,
        NOW + Duration::hours(1),
    );

    let donor_id: i64 = fixture.donor_id();
    apply_and_persist(
        &mut fixture.persistence,
        request_id,
        donor_id,
        complete_command(7, 1, fixture.staff_id),
        NOW + Duration::hours(25),
    );

    let scope: State = fixture
        .persistence
        .load_scope(request_id, second_id)
        .unwrap();
    let clash: TransitionResult = apply(
        &scope,
        complete_command(7, 1, fixture.staff_id),
        NOW + Duration::hours(25),
        create_test_actor(),
        create_test_cause(),
    )
    .unwrap();
    let err = fixture.persistence.persist_transition(&clash).unwrap_err();

    assert!(matches!(
        err,
        PersistenceError::Conflict { ref resource, .. } if resource == "certificate_serial"
    ));
    // The rolled back completion left the second match accepted.
    let state: State = fixture
        .persistence
        .load_scope(request_id, second_id)
        .unwrap();
    assert_eq!(state.current_match.unwrap().status, MatchStatus::Accepted);
    assert_eq!(state.request.units_fulfilled, 1);
}

#[test]
fn test_match_timeline_records_every_transition() {
    let mut fixture = Fixture::new(1);
    let created = fixture.create_match();
    fixture.accept_match();

    let timeline = fixture
        .persistence
        .get_audit_timeline("match", created.match_id)
        .unwrap();

    let names: Vec<&str> = timeline.iter().map(|e| e.action.name.as_str()).collect();
    assert_eq!(names, vec!["CreateMatch", "AcceptMatch"]);
    assert!(timeline.iter().all(|e| e.event_id.is_some()));
}
