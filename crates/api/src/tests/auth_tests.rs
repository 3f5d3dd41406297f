// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use give_pulse_persistence::SqlitePersistence;
use time::Duration;

use super::{Harness, NOW, PASSWORD, donor};
use crate::{
    AccountRole, ApiError, AuthError, AuthenticatedActor, AuthenticationService, LoginRequest,
    LoginResponse, SESSION_LIFETIME, WhoAmIResponse, login, logout, whoami,
};

#[test]
fn test_login_returns_session_and_role() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    donor(&mut persistence, "ana@example.com", "O-");

    let response: LoginResponse = login(
        &mut persistence,
        &LoginRequest {
            email: String::from("ANA@example.com"),
            password: PASSWORD.to_string(),
        },
        NOW,
    )
    .unwrap();

    assert_eq!(response.role, "donor");
    assert_eq!(response.session_token.len(), 32);
    assert_eq!(response.expires_at, NOW + SESSION_LIFETIME);
}

#[test]
fn test_wrong_password_and_unknown_email_fail_alike() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    donor(&mut persistence, "ana@example.com", "O-");

    let wrong_password: AuthError =
        AuthenticationService::login(&mut persistence, "ana@example.com", "Wr0ng!pass", NOW)
            .unwrap_err();
    let unknown: AuthError =
        AuthenticationService::login(&mut persistence, "nobody@example.com", PASSWORD, NOW)
            .unwrap_err();

    assert_eq!(wrong_password, unknown);
}

#[test]
fn test_validate_session_resolves_donor_profile() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    donor(&mut persistence, "ana@example.com", "O-");
    let (token, _, _) =
        AuthenticationService::login(&mut persistence, "ana@example.com", PASSWORD, NOW).unwrap();

    let actor: AuthenticatedActor =
        AuthenticationService::validate_session(&mut persistence, &token, NOW + Duration::hours(2))
            .unwrap();

    let AccountRole::Donor(profile) = &actor.role else {
        panic!("expected a donor role, got {:?}", actor.role);
    };
    assert_eq!(profile.email, "ana@example.com");
    assert_eq!(profile.blood_type.to_string(), "O-");
}

#[test]
fn test_expired_session_is_rejected() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    donor(&mut persistence, "ana@example.com", "O-");
    let (token, _, _) =
        AuthenticationService::login(&mut persistence, "ana@example.com", PASSWORD, NOW).unwrap();

    let result: Result<AuthenticatedActor, AuthError> = AuthenticationService::validate_session(
        &mut persistence,
        &token,
        NOW + SESSION_LIFETIME,
    );

    assert!(matches!(
        result,
        Err(AuthError::AuthenticationFailed { ref reason }) if reason == "Session expired"
    ));
}

#[test]
fn test_logout_invalidates_session() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    donor(&mut persistence, "ana@example.com", "O-");
    let (token, _, _) =
        AuthenticationService::login(&mut persistence, "ana@example.com", PASSWORD, NOW).unwrap();

    logout(&mut persistence, &token).unwrap();

    let result: Result<AuthenticatedActor, ApiError> =
        AuthenticationService::validate_session(&mut persistence, &token, NOW)
            .map_err(ApiError::from);
    assert!(matches!(result, Err(ApiError::AuthenticationFailed { .. })));
}

#[test]
fn test_whoami_describes_staff_and_donor() {
    let harness: Harness = Harness::new(1);

    let staff: WhoAmIResponse = whoami(&harness.staff);
    assert_eq!(staff.role, "staff");
    assert_eq!(staff.hospital_id, harness.hospital.hospital_id);
    assert_eq!(staff.is_verified, Some(true));
    assert!(staff.donor_id.is_none());

    let donor: WhoAmIResponse = whoami(&harness.donor);
    assert_eq!(donor.role, "donor");
    assert!(donor.donor_id.is_some());
    assert!(donor.cooldown_until.is_none());
    assert!(donor.hospital_id.is_none());
}
