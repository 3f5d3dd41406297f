// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod transition_tests;

use give_pulse::{
    Command, RequestCommand, RequestTransition, State, TransitionResult, apply,
    apply_request_command,
};
use give_pulse_audit::{Actor, Cause};
use give_pulse_domain::{AccountKind, BloodRequest, BloodRequestDraft, BloodType, Donor, Hospital};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

use crate::{NewAccount, NewDonorProfile, PersistTransitionResult, SqlitePersistence};

pub const NOW: OffsetDateTime = datetime!(2026-03-01 10:00 UTC);

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("test-actor"), String::from("staff"))
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("test-cause"), String::from("Test operation"))
}

pub fn create_test_hospital(persistence: &mut SqlitePersistence) -> Hospital {
    let mut hospital: Hospital = Hospital {
        hospital_id: None,
        name: String::from("City General"),
        city: String::from("Lisbon"),
        district: String::from("Arroios"),
        is_verified: true,
    };
    let id: i64 = persistence.create_hospital(&hospital).unwrap();
    hospital.hospital_id = Some(id);
    hospital
}

pub fn new_account(email: &str, role: AccountKind) -> NewAccount {
    NewAccount {
        first_name: String::from("Ana"),
        last_name: String::from("Silva"),
        email: email.to_string(),
        phone: None,
        password: String::from("Str0ng!pass"),
        role,
    }
}

pub fn create_test_donor(
    persistence: &mut SqlitePersistence,
    email: &str,
    blood_type: &str,
) -> Donor {
    let profile: NewDonorProfile = NewDonorProfile {
        blood_type: blood_type.parse::<BloodType>().unwrap(),
        city: String::from("Lisbon"),
        district: String::from("Arroios"),
        eligibility_consent: true,
        public_alias: None,
    };
    let (account_id, _donor_id) = persistence
        .register_donor(&new_account(email, AccountKind::Donor), &profile, NOW)
        .unwrap();
    persistence
        .get_donor_by_account(account_id)
        .unwrap()
        .unwrap()
}

/// Registers a verified staff member and returns the staff ID.
pub fn create_test_staff(persistence: &mut SqlitePersistence, hospital: &Hospital) -> i64 {
    let (_account_id, staff_id) = persistence
        .register_staff(
            &new_account("nurse@city-general.pt", AccountKind::Staff),
            hospital.hospital_id.unwrap(),
            NOW,
        )
        .unwrap();
    persistence
        .set_staff_verification(Some(staff_id), None, true)
        .unwrap();
    staff_id
}

pub fn open_test_request(
    persistence: &mut SqlitePersistence,
    hospital: &Hospital,
    staff_id: i64,
    blood_type: &str,
    units: i32,
) -> BloodRequest {
    let draft: BloodRequestDraft = BloodRequestDraft {
        blood_type: blood_type.parse::<BloodType>().unwrap(),
        city: String::from("Lisbon"),
        district: String::from("Arroios"),
        units_requested: units,
        deadline_at: NOW + Duration::days(7),
        notes: String::new(),
    };
    let transition: RequestTransition = apply_request_command(
        hospital,
        None,
        RequestCommand::Open {
            draft,
            created_by_staff_id: staff_id,
        },
        NOW,
        create_test_actor(),
        create_test_cause(),
    )
    .unwrap();
    let (request_id, _event_id) = persistence.persist_request_opened(&transition).unwrap();
    persistence.get_request(request_id).unwrap().unwrap()
}

/// Loads the scope, applies the command at `now` and persists the result.
pub fn apply_and_persist(
    persistence: &mut SqlitePersistence,
    request_id: i64,
    donor_id: i64,
    command: Command,
    now: OffsetDateTime,
) -> PersistTransitionResult {
    let state: State = persistence.load_scope(request_id, donor_id).unwrap();
    let result: TransitionResult = apply(
        &state,
        command,
        now,
        create_test_actor(),
        create_test_cause(),
    )
    .unwrap();
    persistence.persist_transition(&result).unwrap()
}

/// Everything a lifecycle test needs: a hospital, verified staff, a donor
/// and an open request the donor is compatible with.
pub struct Fixture {
    pub persistence: SqlitePersistence,
    pub hospital: Hospital,
    pub staff_id: i64,
    pub donor: Donor,
    pub request: BloodRequest,
}

impl Fixture {
    pub fn new(units: i32) -> Self {
        let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
        let hospital: Hospital = create_test_hospital(&mut persistence);
        let staff_id: i64 = create_test_staff(&mut persistence, &hospital);
        let donor: Donor = create_test_donor(&mut persistence, "ana@example.com", "O-");
        let request: BloodRequest =
            open_test_request(&mut persistence, &hospital, staff_id, "A+", units);
        Self {
            persistence,
            hospital,
            staff_id,
            donor,
            request,
        }
    }

    pub fn request_id(&self) -> i64 {
        self.request.request_id.unwrap()
    }

    pub fn donor_id(&self) -> i64 {
        self.donor.donor_id.unwrap()
    }

    pub fn create_match(&mut self) -> PersistTransitionResult {
        let (request_id, donor_id) = (self.request_id(), self.donor_id());
        apply_and_persist(
            &mut self.persistence,
            request_id,
            donor_id,
            Command::CreateMatch,
            NOW,
        )
    }

    pub fn accept_match(&mut self) -> PersistTransitionResult {
        let (request_id, donor_id) = (self.request_id(), self.donor_id());
        apply_and_persist(
            &mut self.persistence,
            request_id,
            donor_id,
            Command::AcceptMatch,
            NOW + Duration::hours(1),
        )
    }
}
