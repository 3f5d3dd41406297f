// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode as HttpStatusCode},
};
use give_pulse_api::FileArtifactRenderer;
use give_pulse_domain::Hospital;
use give_pulse_persistence::SqlitePersistence;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339};
use tokio::sync::Mutex;
use tower::ServiceExt;

use super::{AppState, build_router};

const PASSWORD: &str = "Str0ng!pass";

static MEDIA_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Helper to create test app state with in-memory persistence.
fn create_test_app_state() -> AppState {
    let persistence: SqlitePersistence =
        SqlitePersistence::new_in_memory().expect("Failed to create in-memory persistence");
    let media_root: PathBuf = std::env::temp_dir().join(format!(
        "give-pulse-server-test-{}-{}",
        std::process::id(),
        MEDIA_COUNTER.fetch_add(1, Ordering::SeqCst)
    ));
    AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        renderer: FileArtifactRenderer::new(media_root),
        public_base_url: Arc::from("https://givepulse.example"),
    }
}

/// Sends one request and returns the status and JSON body (`Null` if empty).
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (HttpStatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request: Request<Body> = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status: HttpStatusCode = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn donor_body(email: &str, blood_type: &str) -> Value {
    json!({
        "first_name": "Ana",
        "last_name": "Silva",
        "email": email,
        "phone": null,
        "password": PASSWORD,
        "password_confirmation": PASSWORD,
        "blood_type": blood_type,
        "city": "Lisbon",
        "district": "Arroios",
        "eligibility_consent": true,
        "public_alias": null
    })
}

async fn login(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, HttpStatusCode::OK, "login failed: {body}");
    body["session_token"].as_str().unwrap().to_string()
}

/// Creates a hospital, registers and verifies a staff member, and returns
/// the staff session token.
async fn setup_staff(app_state: &AppState, app: &Router) -> String {
    let hospital_id: i64 = {
        let mut persistence = app_state.persistence.lock().await;
        persistence.create_hospital(&city_general()).unwrap()
    };

    let (status, body) = send(
        app,
        "POST",
        "/register/staff",
        None,
        Some(json!({
            "first_name": "Rui",
            "last_name": "Costa",
            "email": "rui@city-general.pt",
            "phone": null,
            "password": PASSWORD,
            "password_confirmation": PASSWORD,
            "city": "Lisbon",
            "hospital_id": hospital_id
        })),
    )
    .await;
    assert_eq!(
        status,
        HttpStatusCode::OK,
        "staff registration failed: {body}"
    );

    app_state
        .persistence
        .lock()
        .await
        .set_staff_verification(body["profile_id"].as_i64(), None, true)
        .unwrap();

    login(app, "rui@city-general.pt").await
}

fn city_general() -> Hospital {
    Hospital {
        hospital_id: None,
        name: String::from("City General"),
        city: String::from("Lisbon"),
        district: String::from("Arroios"),
        is_verified: true,
    }
}

async fn open_request(app: &Router, staff_token: &str, units: i32) -> i64 {
    let deadline: String = (OffsetDateTime::now_utc() + Duration::days(7))
        .format(&Rfc3339)
        .unwrap();
    let (status, body) = send(
        app,
        "POST",
        "/requests",
        Some(staff_token),
        Some(json!({
            "blood_type": "A+",
            "city": "Lisbon",
            "district": "Arroios",
            "units_requested": units,
            "deadline_at": deadline,
            "notes": "Surgery"
        })),
    )
    .await;
    assert_eq!(
        status,
        HttpStatusCode::OK,
        "request creation failed: {body}"
    );
    body["request"]["request_id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let app: Router = build_router(create_test_app_state());

    let (status, body) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_whoami_requires_session() {
    let app: Router = build_router(create_test_app_state());

    let (missing, _) = send(&app, "GET", "/auth/whoami", None, None).await;
    assert_eq!(missing, HttpStatusCode::UNAUTHORIZED);

    let (bogus, _) = send(&app, "GET", "/auth/whoami", Some("not-a-token"), None).await;
    assert_eq!(bogus, HttpStatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_login_whoami_logout() {
    let app: Router = build_router(create_test_app_state());

    let (status, _) = send(
        &app,
        "POST",
        "/register/donor",
        None,
        Some(donor_body("ana@example.com", "O-")),
    )
    .await;
    assert_eq!(status, HttpStatusCode::OK);

    let token: String = login(&app, "ana@example.com").await;
    let (status, me) = send(&app, "GET", "/auth/whoami", Some(&token), None).await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(me["role"], "donor");
    assert_eq!(me["email"], "ana@example.com");

    let (status, _) = send(&app, "POST", "/auth/logout", Some(&token), None).await;
    assert_eq!(status, HttpStatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", "/auth/whoami", Some(&token), None).await;
    assert_eq!(status, HttpStatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_registration_is_bad_request() {
    let app: Router = build_router(create_test_app_state());

    let (status, body) = send(
        &app,
        "POST",
        "/register/donor",
        None,
        Some(donor_body("ana@example.com", "C+")),
    )
    .await;

    assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
}

#[tokio::test]
async fn test_hospitals_by_city() {
    let app_state: AppState = create_test_app_state();
    let app: Router = build_router(app_state.clone());
    setup_staff(&app_state, &app).await;

    let (status, body) = send(&app, "GET", "/hospitals?city=lisbon", None, None).await;

    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body["hospitals"].as_array().unwrap().len(), 1);
    assert_eq!(body["hospitals"][0]["name"], "City General");
}

#[tokio::test]
async fn test_donor_cannot_open_requests() {
    let app_state: AppState = create_test_app_state();
    let app: Router = build_router(app_state.clone());
    send(
        &app,
        "POST",
        "/register/donor",
        None,
        Some(donor_body("ana@example.com", "O-")),
    )
    .await;
    let donor_token: String = login(&app, "ana@example.com").await;

    let (status, _) = send(
        &app,
        "POST",
        "/requests",
        Some(&donor_token),
        Some(json!({
            "blood_type": "A+",
            "city": "Lisbon",
            "district": "Arroios",
            "units_requested": 1,
            "deadline_at": "2099-01-01T00:00:00Z",
            "notes": ""
        })),
    )
    .await;

    assert_eq!(status, HttpStatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unparseable_deadline_is_bad_request() {
    let app_state: AppState = create_test_app_state();
    let app: Router = build_router(app_state.clone());
    let staff_token: String = setup_staff(&app_state, &app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/requests",
        Some(&staff_token),
        Some(json!({
            "blood_type": "A+",
            "city": "Lisbon",
            "district": "Arroios",
            "units_requested": 1,
            "deadline_at": "next tuesday",
            "notes": ""
        })),
    )
    .await;

    assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
    let message: &str = body["message"].as_str().unwrap();
    assert!(
        message.starts_with("Invalid input for field 'body'"),
        "{message}"
    );
}

#[tokio::test]
async fn test_malformed_login_body_is_bad_request() {
    let app: Router = build_router(create_test_app_state());

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "ana@example.com" })),
    )
    .await;

    assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
}

#[tokio::test]
async fn test_unknown_match_is_not_found() {
    let app_state: AppState = create_test_app_state();
    let app: Router = build_router(app_state.clone());
    let staff_token: String = setup_staff(&app_state, &app).await;

    let (status, _) = send(
        &app,
        "POST",
        "/matches/999/accept",
        Some(&staff_token),
        None,
    )
    .await;

    assert_eq!(status, HttpStatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_full_donation_flow() {
    let app_state: AppState = create_test_app_state();
    let app: Router = build_router(app_state.clone());
    let staff_token: String = setup_staff(&app_state, &app).await;
    let request_id: i64 = open_request(&app, &staff_token, 1).await;

    send(
        &app,
        "POST",
        "/register/donor",
        None,
        Some(donor_body("ana@example.com", "O-")),
    )
    .await;
    let donor_token: String = login(&app, "ana@example.com").await;

    let (status, listing) =
        send(&app, "GET", "/requests/matchable", Some(&donor_token), None).await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(listing["requests"][0]["request_id"], request_id);

    let matches_uri: String = format!("/requests/{request_id}/matches");
    let (status, created) = send(&app, "POST", &matches_uri, Some(&donor_token), None).await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(created["status"], "pending");
    let match_id: i64 = created["match_id"].as_i64().unwrap();

    let (status, duplicate) = send(&app, "POST", &matches_uri, Some(&donor_token), None).await;
    assert_eq!(status, HttpStatusCode::CONFLICT);
    assert_eq!(duplicate["existing_id"], match_id);

    let (status, accepted) = send(
        &app,
        "POST",
        &format!("/matches/{match_id}/accept"),
        Some(&staff_token),
        None,
    )
    .await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(accepted["status"], "accepted");
    assert!(accepted["warnings"].as_array().unwrap().is_empty());
    let appointment_id: i64 = accepted["appointment"]["appointment_id"].as_i64().unwrap();

    let (status, again) = send(
        &app,
        "POST",
        &format!("/matches/{match_id}/accept"),
        Some(&staff_token),
        None,
    )
    .await;
    assert_eq!(status, HttpStatusCode::CONFLICT, "{again}");

    let (status, checked_in) = send(
        &app,
        "POST",
        "/appointments/check_in",
        Some(&staff_token),
        Some(json!({ "payload": accepted["appointment"]["qr_payload"] })),
    )
    .await;
    assert_eq!(status, HttpStatusCode::OK, "{checked_in}");
    assert_eq!(checked_in["status"], "checked_in");

    let (status, completed) = send(
        &app,
        "POST",
        &format!("/appointments/{appointment_id}/complete"),
        Some(&staff_token),
        Some(json!({ "units": 1 })),
    )
    .await;
    assert_eq!(status, HttpStatusCode::OK, "{completed}");
    assert_eq!(completed["request_status"], "fulfilled");

    let serial: &str = completed["certificate_serial"].as_str().unwrap();
    let (status, verified) = send(
        &app,
        "GET",
        &format!("/certificates/verify/{serial}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(verified["donor_name"], "Ana Silva");
    assert_eq!(verified["units"], 1);

    let (status, detail) = send(
        &app,
        "GET",
        &format!("/requests/{request_id}"),
        Some(&staff_token),
        None,
    )
    .await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(detail["request"]["status"], "fulfilled");
    assert_eq!(detail["matches"][0]["status"], "donated");
}

#[tokio::test]
async fn test_incompatible_donor_is_unprocessable() {
    let app_state: AppState = create_test_app_state();
    let app: Router = build_router(app_state.clone());
    let staff_token: String = setup_staff(&app_state, &app).await;
    let request_id: i64 = open_request(&app, &staff_token, 1).await;

    send(
        &app,
        "POST",
        "/register/donor",
        None,
        Some(donor_body("bea@example.com", "B+")),
    )
    .await;
    let donor_token: String = login(&app, "bea@example.com").await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/requests/{request_id}/matches"),
        Some(&donor_token),
        None,
    )
    .await;

    assert_eq!(status, HttpStatusCode::UNPROCESSABLE_ENTITY);
}
