// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{
    NOW, accepted_state, apply_and_persist, create_test_actor, create_test_cause,
    create_test_state, pending_state,
};
use crate::{Command, CoreError, State, Transition, TransitionResult, apply};
use give_pulse_domain::{
    CertificateSerial, DomainError, MatchStatus, QrDetails, QrPayload, RequestStatus,
    verification_code,
};
use time::macros::date;
use time::{Duration, OffsetDateTime};

fn run(state: &State, command: Command) -> Result<TransitionResult, CoreError> {
    apply(
        state,
        command,
        NOW,
        create_test_actor(),
        create_test_cause(),
    )
}

fn complete(units: i32) -> Command {
    Command::CompleteDonation {
        units,
        certificate_serial: CertificateSerial::compose(date!(2026 - 03 - 02), 0xDEAD_BEEF),
        confirmed_by_staff_id: Some(1),
    }
}

fn scanned_payload(state: &State) -> QrPayload {
    let appointment = state.appointment.as_ref().unwrap();
    let details: QrDetails = QrDetails {
        donor_name: state.donor.full_name(),
        donor_email: state.donor.email.clone(),
        blood_type: state.donor.blood_type,
        hospital_name: state.hospital.name.clone(),
        window: appointment.window,
    };
    QrPayload::new(
        appointment.appointment_id.unwrap(),
        appointment.match_id,
        details,
    )
}

#[test]
fn test_accept_sets_status_cooldown_and_appointment() {
    let state: State = pending_state(1);

    let transition: TransitionResult = run(&state, Command::AcceptMatch).unwrap();

    let accepted = transition.new_state.current_match.as_ref().unwrap();
    assert_eq!(accepted.status, MatchStatus::Accepted);
    assert_eq!(accepted.accepted_at, Some(NOW));

    let until: OffsetDateTime = transition.new_state.donor.cooldown_until.unwrap();
    assert_eq!(until - NOW, Duration::days(56));

    let appointment = transition.new_state.appointment.as_ref().unwrap();
    assert_eq!(appointment.match_id, 30);
    assert_eq!(appointment.window.length(), Duration::hours(2));
    assert_eq!(appointment.window.start() - NOW, Duration::hours(24));
    assert_eq!(appointment.qr_artifact, None);

    match transition.change {
        Transition::MatchAccepted {
            cooldown_until,
            window,
            qr_details,
        } => {
            assert_eq!(cooldown_until, until);
            assert_eq!(window, appointment.window);
            assert_eq!(qr_details.hospital_name, "City General");
            assert_eq!(qr_details.donor_name, "Ana Silva");
        }
        other => panic!("unexpected change {other:?}"),
    }
}

#[test]
fn test_accept_does_not_change_fulfillment() {
    let state: State = pending_state(1);

    let transition: TransitionResult = run(&state, Command::AcceptMatch).unwrap();

    assert_eq!(transition.new_state.request.units_fulfilled, 0);
    assert_eq!(transition.new_state.request.status, RequestStatus::Open);
}

#[test]
fn test_accepting_accepted_match_is_invalid_transition() {
    let state: State = accepted_state(1);

    let result = run(&state, Command::AcceptMatch);

    assert!(matches!(
        result,
        Err(CoreError::DomainViolation(
            DomainError::InvalidStatusTransition { .. }
        ))
    ));
}

#[test]
fn test_accepting_declined_match_is_invalid_transition() {
    let declined: State = apply_and_persist(&pending_state(1), Command::DeclineMatch, NOW);

    let result = run(&declined, Command::AcceptMatch);

    assert!(matches!(
        result,
        Err(CoreError::DomainViolation(
            DomainError::InvalidStatusTransition { .. }
        ))
    ));
}

#[test]
fn test_accept_without_match_is_not_found() {
    let state: State = create_test_state("O-", "A+", 1);

    assert!(matches!(
        run(&state, Command::AcceptMatch),
        Err(CoreError::DomainViolation(DomainError::MatchNotFound { .. }))
    ));
}

#[test]
fn test_decline_has_no_cooldown_or_fulfillment_effects() {
    let state: State = pending_state(3);

    let transition: TransitionResult = run(&state, Command::DeclineMatch).unwrap();

    let declined = transition.new_state.current_match.as_ref().unwrap();
    assert_eq!(declined.status, MatchStatus::Declined);
    assert_eq!(declined.declined_at, Some(NOW));
    assert_eq!(transition.new_state.donor.cooldown_until, None);
    assert_eq!(transition.new_state.request, state.request);
    assert_eq!(transition.new_state.appointment, None);
    assert_eq!(transition.change, Transition::MatchDeclined);
}

#[test]
fn test_decline_requires_pending() {
    let state: State = accepted_state(1);

    assert!(run(&state, Command::DeclineMatch).is_err());
}

#[test]
fn test_complete_single_unit_fulfills_request() {
    let state: State = accepted_state(1);

    let transition: TransitionResult = run(&state, complete(1)).unwrap();

    assert_eq!(transition.new_state.request.units_fulfilled, 1);
    assert_eq!(
        transition.new_state.request.status,
        RequestStatus::Fulfilled
    );
    let donated = transition.new_state.current_match.as_ref().unwrap();
    assert_eq!(donated.status, MatchStatus::Donated);
    assert_eq!(donated.donated_at, Some(NOW));
    let donation = transition.new_state.donation.as_ref().unwrap();
    assert_eq!(donation.units, 1);
    assert_eq!(donation.certificate_serial.as_str(), "GP-20260302-DEADBEEF");
    assert_eq!(donation.confirmed_by_staff_id, Some(1));
}

#[test]
fn test_complete_against_three_units_is_partial() {
    let state: State = accepted_state(3);

    let transition: TransitionResult = run(&state, complete(1)).unwrap();

    assert_eq!(transition.new_state.request.units_fulfilled, 1);
    assert_eq!(transition.new_state.request.status, RequestStatus::Partial);
    match transition.change {
        Transition::DonationCompleted { fulfillment } => {
            assert_eq!(fulfillment.previous_status, RequestStatus::Open);
            assert_eq!(fulfillment.status, RequestStatus::Partial);
        }
        other => panic!("unexpected change {other:?}"),
    }
}

#[test]
fn test_complete_twice_is_conflict() {
    let donated: State = apply_and_persist(&accepted_state(3), complete(1), NOW);

    let result = run(&donated, complete(1));

    assert_eq!(
        result,
        Err(CoreError::DomainViolation(
            DomainError::DonationAlreadyRecorded { match_id: 30 }
        ))
    );
}

#[test]
fn test_complete_requires_accepted_match() {
    let mut state: State = accepted_state(1);
    if let Some(m) = state.current_match.as_mut() {
        m.status = MatchStatus::Pending;
    }

    assert!(matches!(
        run(&state, complete(1)),
        Err(CoreError::DomainViolation(
            DomainError::InvalidStatusTransition { .. }
        ))
    ));
}

#[test]
fn test_check_in_then_complete() {
    let state: State = accepted_state(2);
    let payload: QrPayload = scanned_payload(&state);

    let checked_in: State = apply_and_persist(&state, Command::CheckInMatch { payload }, NOW);
    let current = checked_in.current_match.as_ref().unwrap();
    assert_eq!(current.status, MatchStatus::CheckedIn);
    assert_eq!(current.checked_in_at, Some(NOW));

    let transition: TransitionResult = run(&checked_in, complete(1)).unwrap();
    assert_eq!(
        transition.new_state.current_match.unwrap().status,
        MatchStatus::Donated
    );
}

#[test]
fn test_check_in_rejects_foreign_payload() {
    let state: State = accepted_state(2);
    let mut payload: QrPayload = scanned_payload(&state);
    payload.appointment_id = 41;
    payload.verification_code = verification_code(41, 30);

    assert!(matches!(
        run(&state, Command::CheckInMatch { payload }),
        Err(CoreError::DomainViolation(
            DomainError::VerificationCodeMismatch { .. }
        ))
    ));
}

#[test]
fn test_check_in_twice_is_invalid_transition() {
    let state: State = accepted_state(2);
    let payload: QrPayload = scanned_payload(&state);
    let checked_in: State = apply_and_persist(
        &state,
        Command::CheckInMatch {
            payload: payload.clone(),
        },
        NOW,
    );

    assert!(matches!(
        run(&checked_in, Command::CheckInMatch { payload }),
        Err(CoreError::DomainViolation(
            DomainError::InvalidStatusTransition { .. }
        ))
    ));
}
