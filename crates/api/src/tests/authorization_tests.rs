// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use give_pulse_domain::Hospital;

use super::{
    Harness, NOW, PASSWORD, RecordingRenderer, blood_request, create_hospital, create_test_cause,
    login_as, staff_request, verified_staff,
};
use crate::{
    ApiError, AuthenticatedActor, AuthorizationService, CreateAdminRequest, MatchResponse,
    accept_match, create_admin, create_blood_request, create_match, decline_match,
    matchable_requests, register_staff, request_detail,
};

fn assert_unauthorized<T: std::fmt::Debug>(result: Result<T, ApiError>) {
    assert!(
        matches!(result, Err(ApiError::Unauthorized { .. })),
        "expected Unauthorized, got {result:?}"
    );
}

#[test]
fn test_donor_cannot_act_as_staff() {
    let mut harness: Harness = Harness::new(1);
    let created: MatchResponse = harness.create_match();

    assert_unauthorized(accept_match(
        &mut harness.persistence,
        &RecordingRenderer::default(),
        &harness.donor,
        created.match_id,
        create_test_cause(),
        NOW,
    ));
    assert_unauthorized(create_blood_request(
        &mut harness.persistence,
        blood_request("O+", 1),
        &harness.donor,
        create_test_cause(),
        NOW,
    ));
}

#[test]
fn test_staff_cannot_respond_to_requests() {
    let mut harness: Harness = Harness::new(1);

    assert_unauthorized(create_match(
        &mut harness.persistence,
        &harness.staff,
        harness.request_id,
        create_test_cause(),
        NOW,
    ));
    assert_unauthorized(matchable_requests(
        &mut harness.persistence,
        &harness.staff,
        None,
        NOW,
    ));
}

#[test]
fn test_unverified_staff_cannot_open_requests() {
    let mut harness: Harness = Harness::new(1);
    let hospital_id: i64 = harness.hospital.hospital_id.unwrap();
    register_staff(
        &mut harness.persistence,
        staff_request("new@city-general.pt", hospital_id),
        create_test_cause(),
        NOW,
    )
    .unwrap();
    let unverified: AuthenticatedActor = login_as(&mut harness.persistence, "new@city-general.pt");

    let err: ApiError = create_blood_request(
        &mut harness.persistence,
        blood_request("O+", 1),
        &unverified,
        create_test_cause(),
        NOW,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        ApiError::Unauthorized { ref required_role, .. } if required_role == "verified staff"
    ));
}

#[test]
fn test_staff_of_other_hospital_is_rejected() {
    let mut harness: Harness = Harness::new(1);
    let other: Hospital = create_hospital(&mut harness.persistence, "Santa Maria");
    let outsider: AuthenticatedActor =
        verified_staff(&mut harness.persistence, &other, "joao@santa-maria.pt");
    let created: MatchResponse = harness.create_match();

    assert_unauthorized(accept_match(
        &mut harness.persistence,
        &RecordingRenderer::default(),
        &outsider,
        created.match_id,
        create_test_cause(),
        NOW,
    ));
    assert_unauthorized(decline_match(
        &mut harness.persistence,
        &outsider,
        created.match_id,
        create_test_cause(),
        NOW,
    ));
    assert_unauthorized(request_detail(
        &mut harness.persistence,
        &outsider,
        harness.request_id,
    ));
}

#[test]
fn test_admin_is_neither_donor_nor_staff() {
    let mut harness: Harness = Harness::new(1);
    create_admin(
        &mut harness.persistence,
        &CreateAdminRequest {
            email: String::from("root@givepulse.example"),
            password: PASSWORD.to_string(),
            first_name: String::from("Site"),
            last_name: String::from("Admin"),
        },
        NOW,
    )
    .unwrap();
    let admin: AuthenticatedActor = login_as(&mut harness.persistence, "root@givepulse.example");

    assert!(AuthorizationService::authorize_admin(&admin, "verify").is_ok());
    assert!(AuthorizationService::authorize_admin(&harness.staff, "verify").is_err());
    assert_unauthorized(matchable_requests(
        &mut harness.persistence,
        &admin,
        None,
        NOW,
    ));
    assert_unauthorized(create_blood_request(
        &mut harness.persistence,
        blood_request("O+", 1),
        &admin,
        create_test_cause(),
        NOW,
    ));
}
