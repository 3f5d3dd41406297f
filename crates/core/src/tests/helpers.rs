// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{Command, State, TransitionResult, apply};
use give_pulse_audit::{Actor, Cause};
use give_pulse_domain::{BloodRequest, BloodType, Donor, Hospital, RequestStatus};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

pub const NOW: OffsetDateTime = datetime!(2026-03-01 10:00 UTC);

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("staff-1"), String::from("staff"))
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("req-456"), String::from("Staff request"))
}

pub fn create_test_hospital() -> Hospital {
    Hospital {
        hospital_id: Some(1),
        name: String::from("City General"),
        city: String::from("Lisbon"),
        district: String::from("Centro"),
        is_verified: true,
    }
}

pub fn create_test_request(blood_type: &str, units_requested: i32) -> BloodRequest {
    BloodRequest {
        request_id: Some(10),
        hospital_id: 1,
        created_by_staff_id: Some(1),
        blood_type: blood_type.parse::<BloodType>().unwrap(),
        city: String::from("Lisbon"),
        district: String::from("Centro"),
        units_requested,
        units_fulfilled: 0,
        status: RequestStatus::Open,
        deadline_at: NOW + Duration::days(7),
        notes: String::new(),
        created_at: NOW - Duration::days(1),
    }
}

pub fn create_test_donor(blood_type: &str) -> Donor {
    Donor {
        donor_id: Some(20),
        account_id: 5,
        first_name: String::from("Ana"),
        last_name: String::from("Silva"),
        email: String::from("ana@example.org"),
        blood_type: blood_type.parse::<BloodType>().unwrap(),
        city: String::from("Lisbon"),
        district: String::from("Alfama"),
        eligibility_consent: true,
        public_alias: None,
        cooldown_until: None,
    }
}

pub fn create_test_state(donor_type: &str, request_type: &str, units: i32) -> State {
    State::new(
        create_test_request(request_type, units),
        create_test_hospital(),
        create_test_donor(donor_type),
    )
}

/// Applies a command and simulates the identifiers persistence would assign.
pub fn apply_and_persist(state: &State, command: Command, now: OffsetDateTime) -> State {
    let result: TransitionResult = apply(
        state,
        command,
        now,
        create_test_actor(),
        create_test_cause(),
    )
    .unwrap();
    let mut next: State = result.new_state;
    if let Some(m) = next.current_match.as_mut() {
        m.match_id.get_or_insert(30);
    }
    if let Some(a) = next.appointment.as_mut() {
        a.appointment_id.get_or_insert(40);
    }
    if let Some(d) = next.donation.as_mut() {
        d.donation_id.get_or_insert(50);
    }
    next
}

/// A scope with a persisted pending match.
pub fn pending_state(units: i32) -> State {
    apply_and_persist(
        &create_test_state("O-", "A+", units),
        Command::CreateMatch,
        NOW,
    )
}

/// A scope with a persisted accepted match and appointment.
pub fn accepted_state(units: i32) -> State {
    apply_and_persist(&pending_state(units), Command::AcceptMatch, NOW)
}
