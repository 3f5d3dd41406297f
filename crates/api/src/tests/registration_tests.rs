// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use give_pulse_audit::AuditEvent;
use give_pulse_domain::{AccountKind, Hospital};
use give_pulse_persistence::{AccountData, SqlitePersistence};

use super::{NOW, create_hospital, create_test_cause, donor_request, login_as, staff_request};
use crate::{
    AccountRole, ApiError, AuthenticatedActor, ListHospitalsResponse, RegisterDonorRequest,
    RegisterResponse, RegisterStaffRequest, hospitals_by_city, register_donor, register_staff,
};

#[test]
fn test_register_donor_normalizes_email_and_records_audit() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let mut request: RegisterDonorRequest = donor_request("  Ana@Example.COM ", "ab-");
    request.public_alias = Some(String::from("  "));

    let response: RegisterResponse =
        register_donor(&mut persistence, request, create_test_cause(), NOW).unwrap();

    assert_eq!(response.role, "donor");
    let account: AccountData = persistence
        .get_account_by_email("ana@example.com")
        .unwrap()
        .unwrap();
    assert_eq!(account.account_id, response.account_id);
    assert_eq!(account.role, AccountKind::Donor);

    let actor: AuthenticatedActor = login_as(&mut persistence, "ana@example.com");
    let AccountRole::Donor(profile) = actor.role else {
        panic!("expected donor role");
    };
    assert_eq!(profile.blood_type.to_string(), "AB-");
    assert!(profile.public_alias.is_none());

    let timeline: Vec<AuditEvent> = persistence
        .get_audit_timeline("account", response.account_id)
        .unwrap();
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].action.name, "RegisterDonor");
    assert_eq!(timeline[0].actor.actor_type, "guest");
}

#[test]
fn test_duplicate_email_is_a_conflict() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    register_donor(
        &mut persistence,
        donor_request("ana@example.com", "O+"),
        create_test_cause(),
        NOW,
    )
    .unwrap();

    let err: ApiError = register_donor(
        &mut persistence,
        donor_request("ANA@example.com", "O+"),
        create_test_cause(),
        NOW,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        ApiError::Conflict { ref resource, .. } if resource == "account"
    ));
    assert_eq!(persistence.count_audit_events().unwrap(), 1);
}

#[test]
fn test_register_donor_rejects_invalid_fields() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();

    let bad_blood_type: ApiError = register_donor(
        &mut persistence,
        donor_request("a@example.com", "C+"),
        create_test_cause(),
        NOW,
    )
    .unwrap_err();
    assert!(matches!(
        bad_blood_type,
        ApiError::InvalidInput { ref field, .. } if field == "blood_type"
    ));

    let mut no_district: RegisterDonorRequest = donor_request("b@example.com", "O+");
    no_district.district = String::from("   ");
    let err: ApiError =
        register_donor(&mut persistence, no_district, create_test_cause(), NOW).unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput { ref field, .. } if field == "district"));

    let mut bad_email: RegisterDonorRequest = donor_request("not-an-email", "O+");
    bad_email.public_alias = None;
    let err: ApiError =
        register_donor(&mut persistence, bad_email, create_test_cause(), NOW).unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput { ref field, .. } if field == "email"));

    let mut weak: RegisterDonorRequest = donor_request("c@example.com", "O+");
    weak.password = String::from("password");
    weak.password_confirmation = String::from("password");
    let err: ApiError =
        register_donor(&mut persistence, weak, create_test_cause(), NOW).unwrap_err();
    assert!(matches!(err, ApiError::PasswordPolicyViolation { .. }));

    assert!(
        persistence
            .get_account_by_email("c@example.com")
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_register_staff_starts_unverified() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let hospital: Hospital = create_hospital(&mut persistence, "City General");

    let response: RegisterResponse = register_staff(
        &mut persistence,
        staff_request("rui@city-general.pt", hospital.hospital_id.unwrap()),
        create_test_cause(),
        NOW,
    )
    .unwrap();

    let actor: AuthenticatedActor = login_as(&mut persistence, "rui@city-general.pt");
    let AccountRole::Staff(staff) = actor.role else {
        panic!("expected staff role");
    };
    assert_eq!(staff.staff_id, Some(response.profile_id));
    assert_eq!(staff.hospital_id, hospital.hospital_id.unwrap());
    assert!(!staff.is_verified);
}

#[test]
fn test_register_staff_requires_existing_hospital_in_same_city() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let hospital: Hospital = create_hospital(&mut persistence, "City General");

    let missing: ApiError = register_staff(
        &mut persistence,
        staff_request("rui@city-general.pt", 999),
        create_test_cause(),
        NOW,
    )
    .unwrap_err();
    assert!(matches!(missing, ApiError::ResourceNotFound { .. }));

    let mut elsewhere: RegisterStaffRequest =
        staff_request("rui@city-general.pt", hospital.hospital_id.unwrap());
    elsewhere.city = String::from("Porto");
    let mismatch: ApiError =
        register_staff(&mut persistence, elsewhere, create_test_cause(), NOW).unwrap_err();
    assert!(matches!(mismatch, ApiError::InvalidInput { ref field, .. } if field == "city"));

    let mut lower_case: RegisterStaffRequest =
        staff_request("rui@city-general.pt", hospital.hospital_id.unwrap());
    lower_case.city = String::from("lisbon");
    assert!(register_staff(&mut persistence, lower_case, create_test_cause(), NOW).is_ok());
}

#[test]
fn test_hospitals_by_city() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    create_hospital(&mut persistence, "City General");
    create_hospital(&mut persistence, "Santa Maria");

    let response: ListHospitalsResponse = hospitals_by_city(&mut persistence, "LISBON").unwrap();
    assert_eq!(response.hospitals.len(), 2);

    let none: ListHospitalsResponse = hospitals_by_city(&mut persistence, "Porto").unwrap();
    assert!(none.hospitals.is_empty());

    let err: ApiError = hospitals_by_city(&mut persistence, "  ").unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput { ref field, .. } if field == "city"));
}
