// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    AppointmentWindow, ArtifactKind, ArtifactPayload, DomainError, QrDetails, QrPayload,
    VERIFICATION_CODE_LENGTH, verification_code,
};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

const NOW: OffsetDateTime = datetime!(2026-03-01 10:00 UTC);

fn details() -> QrDetails {
    QrDetails {
        donor_name: String::from("Ana Silva"),
        donor_email: String::from("ana@example.org"),
        blood_type: "O-".parse().unwrap(),
        hospital_name: String::from("City General"),
        window: AppointmentWindow::for_acceptance(NOW).unwrap(),
    }
}

#[test]
fn test_acceptance_window_is_two_hours_one_day_out() {
    let window: AppointmentWindow = AppointmentWindow::for_acceptance(NOW).unwrap();
    assert_eq!(window.start(), datetime!(2026-03-02 10:00 UTC));
    assert_eq!(window.end(), datetime!(2026-03-02 12:00 UTC));
    assert_eq!(window.length(), Duration::hours(2));
}

#[test]
fn test_window_must_start_before_end() {
    assert!(matches!(
        AppointmentWindow::new(NOW, NOW),
        Err(DomainError::InvalidAppointmentWindow { .. })
    ));
    assert!(AppointmentWindow::new(NOW + Duration::hours(1), NOW).is_err());
}

#[test]
fn test_verification_code_is_deterministic_upper_hex() {
    let code: String = verification_code(7, 3);
    assert_eq!(code.len(), VERIFICATION_CODE_LENGTH);
    let allowed = |c: char| c.is_ascii_digit() || c.is_ascii_uppercase();
    assert!(code.chars().all(allowed));
    assert_eq!(code, verification_code(7, 3));
    assert_ne!(code, verification_code(3, 7));
}

#[test]
fn test_payload_verifies_against_its_ids() {
    let payload: QrPayload = QrPayload::new(7, 3, details());
    assert!(payload.verify(7, 3).is_ok());
    assert!(payload.verify(8, 3).is_err());
}

#[test]
fn test_tampered_code_is_rejected() {
    let mut payload: QrPayload = QrPayload::new(7, 3, details());
    payload.verification_code = String::from("000000000000");
    assert_eq!(
        payload.verify(7, 3),
        Err(DomainError::VerificationCodeMismatch { appointment_id: 7 })
    );
}

#[test]
fn test_payload_json_round_trip_keeps_code_valid() {
    let payload: QrPayload = QrPayload::new(11, 5, details());
    let json: String = serde_json::to_string(&payload).unwrap();
    assert!(json.contains("\"window_start\":\"2026-03-02T10:00:00Z\""));
    let scanned: QrPayload = serde_json::from_str(&json).unwrap();
    assert!(scanned.verify(11, 5).is_ok());
}

#[test]
fn test_artifact_payload_contents() {
    let artifact: ArtifactPayload = QrPayload::new(7, 3, details())
        .to_artifact_payload()
        .unwrap();
    assert_eq!(artifact.kind, ArtifactKind::QrCode);
    assert_eq!(artifact.subject, "7");
    assert_eq!(artifact.get("blood_type"), Some("O-"));
    assert_eq!(artifact.get("hospital_name"), Some("City General"));
    assert_eq!(
        artifact.get("verification_code").map(str::to_string),
        Some(verification_code(7, 3))
    );
}
