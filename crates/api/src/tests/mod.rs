// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test module for the API crate.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod auth_tests;
mod authorization_tests;
mod registration_tests;

use give_pulse_audit::Cause;
use give_pulse_domain::{ArtifactKind, ArtifactPayload, Hospital};
use give_pulse_persistence::SqlitePersistence;
use std::cell::RefCell;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

use crate::{
    AcceptMatchResponse, ArtifactError, ArtifactRenderer, AuthenticatedActor,
    AuthenticationService, CreateBloodRequestRequest, CreateBloodRequestResponse, MatchResponse,
    RegisterDonorRequest, RegisterStaffRequest, accept_match, create_blood_request, create_match,
    register_donor, register_staff,
};

pub const NOW: OffsetDateTime = datetime!(2026-03-01 10:00 UTC);
pub const PASSWORD: &str = "Str0ng!pass";
pub const BASE_URL: &str = "https://givepulse.example";

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("api-req-1"), String::from("API request"))
}

pub fn donor_request(email: &str, blood_type: &str) -> RegisterDonorRequest {
    RegisterDonorRequest {
        first_name: String::from("Ana"),
        last_name: String::from("Silva"),
        email: email.to_string(),
        phone: Some(String::from("+351912345678")),
        password: PASSWORD.to_string(),
        password_confirmation: PASSWORD.to_string(),
        blood_type: blood_type.to_string(),
        city: String::from("Lisbon"),
        district: String::from("Arroios"),
        eligibility_consent: true,
        public_alias: None,
    }
}

pub fn staff_request(email: &str, hospital_id: i64) -> RegisterStaffRequest {
    RegisterStaffRequest {
        first_name: String::from("Rui"),
        last_name: String::from("Costa"),
        email: email.to_string(),
        phone: None,
        password: PASSWORD.to_string(),
        password_confirmation: PASSWORD.to_string(),
        city: String::from("Lisbon"),
        hospital_id,
    }
}

pub fn blood_request(blood_type: &str, units: i32) -> CreateBloodRequestRequest {
    CreateBloodRequestRequest {
        blood_type: blood_type.to_string(),
        city: String::from("Lisbon"),
        district: String::from("Arroios"),
        units_requested: units,
        deadline_at: NOW + Duration::days(7),
        notes: String::from("Scheduled surgery"),
    }
}

pub fn create_hospital(persistence: &mut SqlitePersistence, name: &str) -> Hospital {
    let mut hospital: Hospital = Hospital {
        hospital_id: None,
        name: name.to_string(),
        city: String::from("Lisbon"),
        district: String::from("Arroios"),
        is_verified: true,
    };
    hospital.hospital_id = Some(persistence.create_hospital(&hospital).unwrap());
    hospital
}

/// Logs in and returns the resolved actor.
pub fn login_as(persistence: &mut SqlitePersistence, email: &str) -> AuthenticatedActor {
    let (_token, actor, _session) =
        AuthenticationService::login(persistence, email, PASSWORD, NOW).unwrap();
    actor
}

/// Registers and verifies a staff member at `hospital`, then logs in.
pub fn verified_staff(
    persistence: &mut SqlitePersistence,
    hospital: &Hospital,
    email: &str,
) -> AuthenticatedActor {
    let registered = register_staff(
        persistence,
        staff_request(email, hospital.hospital_id.unwrap()),
        create_test_cause(),
        NOW,
    )
    .unwrap();
    persistence
        .set_staff_verification(Some(registered.profile_id), None, true)
        .unwrap();
    login_as(persistence, email)
}

/// Registers a donor and logs in.
pub fn donor(
    persistence: &mut SqlitePersistence,
    email: &str,
    blood_type: &str,
) -> AuthenticatedActor {
    register_donor(
        persistence,
        donor_request(email, blood_type),
        create_test_cause(),
        NOW,
    )
    .unwrap();
    login_as(persistence, email)
}

/// Keeps every payload it is handed and returns an in-memory reference.
#[derive(Default)]
pub struct RecordingRenderer {
    pub rendered: RefCell<Vec<ArtifactPayload>>,
}

impl RecordingRenderer {
    pub fn count(&self, kind: ArtifactKind) -> usize {
        self.rendered
            .borrow()
            .iter()
            .filter(|p| p.kind == kind)
            .count()
    }

    pub fn last(&self) -> ArtifactPayload {
        self.rendered.borrow().last().cloned().unwrap()
    }

    fn record(&self, payload: &ArtifactPayload) -> String {
        self.rendered.borrow_mut().push(payload.clone());
        format!("memory/{}/{}", payload.kind.as_str(), payload.subject)
    }
}

impl ArtifactRenderer for RecordingRenderer {
    fn render_qr(&self, payload: &ArtifactPayload) -> Result<String, ArtifactError> {
        Ok(self.record(payload))
    }

    fn render_certificate(&self, payload: &ArtifactPayload) -> Result<String, ArtifactError> {
        Ok(self.record(payload))
    }
}

/// Fails every render.
pub struct FailingRenderer;

impl ArtifactRenderer for FailingRenderer {
    fn render_qr(&self, _payload: &ArtifactPayload) -> Result<String, ArtifactError> {
        Err(ArtifactError::Storage(String::from("renderer offline")))
    }

    fn render_certificate(&self, _payload: &ArtifactPayload) -> Result<String, ArtifactError> {
        Err(ArtifactError::Storage(String::from("renderer offline")))
    }
}

/// A hospital with verified staff, an O- donor and an open A+ request.
pub struct Harness {
    pub persistence: SqlitePersistence,
    pub hospital: Hospital,
    pub staff: AuthenticatedActor,
    pub donor: AuthenticatedActor,
    pub request_id: i64,
}

impl Harness {
    pub fn new(units: i32) -> Self {
        let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
        let hospital: Hospital = create_hospital(&mut persistence, "City General");
        let staff: AuthenticatedActor =
            verified_staff(&mut persistence, &hospital, "rui@city-general.pt");
        let donor: AuthenticatedActor = donor(&mut persistence, "ana@example.com", "O-");

        let created: CreateBloodRequestResponse = create_blood_request(
            &mut persistence,
            blood_request("A+", units),
            &staff,
            create_test_cause(),
            NOW,
        )
        .unwrap();

        Self {
            persistence,
            hospital,
            staff,
            donor,
            request_id: created.request.request_id,
        }
    }

    pub fn create_match(&mut self) -> MatchResponse {
        create_match(
            &mut self.persistence,
            &self.donor,
            self.request_id,
            create_test_cause(),
            NOW,
        )
        .unwrap()
    }

    pub fn accept(&mut self, renderer: &dyn ArtifactRenderer) -> AcceptMatchResponse {
        let created: MatchResponse = self.create_match();
        accept_match(
            &mut self.persistence,
            renderer,
            &self.staff,
            created.match_id,
            create_test_cause(),
            NOW + Duration::hours(1),
        )
        .unwrap()
    }
}
