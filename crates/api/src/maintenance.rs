// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Operator maintenance commands.
//!
//! These run from the command line rather than over HTTP, so they act as a
//! system actor instead of an authenticated account.

use give_pulse::{RequestCommand, RequestTransition, apply_request_command};
use give_pulse_audit::{Actor, Cause};
use give_pulse_domain::{
    AccountKind, Appointment, BloodRequest, CertificatePayload, Hospital, RequestStatus,
    verification_url,
};
use give_pulse_persistence::{CertificateSource, NewAccount, PersistenceError, SqlitePersistence};
use time::{OffsetDateTime, UtcOffset};
use tracing::{info, warn};

use crate::artifacts::{ArtifactRenderer, issue_certificate, issue_qr};
use crate::error::{ApiError, translate_core_error, translate_persistence_error};
use crate::handlers::{AccountFields, record_account_created, translate_account_error};
use crate::request_response::{
    CleanupSessionsResponse, CreateAdminRequest, CreateAdminResponse, ExpireRequestsResponse,
    RegenerationSummary, VerifyAction, VerifyEntitiesRequest, VerifyEntitiesResponse, VerifyTarget,
};

/// Expires every open or partial request whose deadline has passed.
///
/// A request closed by a concurrent change between the listing and the
/// update is reported as skipped.
///
/// # Errors
///
/// Returns an error if a query or write other than the stale-row guard fails.
pub fn expire_requests(
    persistence: &mut SqlitePersistence,
    now: OffsetDateTime,
) -> Result<ExpireRequestsResponse, ApiError> {
    let candidates: Vec<BloodRequest> = persistence
        .list_requests_by_status(&[RequestStatus::Open, RequestStatus::Partial])
        .map_err(translate_persistence_error)?;

    let mut response: ExpireRequestsResponse = ExpireRequestsResponse::default();
    for request in candidates.iter().filter(|r| r.deadline_at <= now) {
        let Some(request_id) = request.request_id else {
            continue;
        };
        let hospital: Hospital = persistence
            .get_hospital(request.hospital_id)
            .map_err(translate_persistence_error)?
            .ok_or_else(|| ApiError::Internal {
                message: format!("Request {request_id} references a missing hospital"),
            })?;

        let transition: RequestTransition = apply_request_command(
            &hospital,
            Some(request),
            RequestCommand::Expire,
            now,
            Actor::system("expire-requests"),
            Cause::new(
                String::from("deadline-sweep"),
                format!("Deadline {} passed", request.deadline_at),
            ),
        )
        .map_err(translate_core_error)?;

        match persistence.persist_request_expired(&transition) {
            Ok(_) => response.expired.push(request_id),
            Err(PersistenceError::Conflict { .. }) => {
                warn!(request_id, "Request changed before it could be expired");
                response.skipped.push(request_id);
            }
            Err(e) => return Err(translate_persistence_error(e)),
        }
    }

    info!(
        expired = response.expired.len(),
        skipped = response.skipped.len(),
        "Expired overdue requests"
    );
    Ok(response)
}

/// Sets or clears hospital and staff verification flags.
///
/// # Errors
///
/// Returns an error if an update fails.
pub fn verify_entities(
    persistence: &mut SqlitePersistence,
    request: &VerifyEntitiesRequest,
) -> Result<VerifyEntitiesResponse, ApiError> {
    let verified: bool = matches!(request.action, VerifyAction::Verify);
    let mut response: VerifyEntitiesResponse = VerifyEntitiesResponse::default();

    match request.target {
        VerifyTarget::Hospital => {
            response.hospitals_changed = persistence
                .set_hospital_verification(request.id, verified)
                .map_err(translate_persistence_error)?;
        }
        VerifyTarget::Staff => {
            response.staff_changed = persistence
                .set_staff_verification(request.id, request.hospital_id, verified)
                .map_err(translate_persistence_error)?;
        }
        VerifyTarget::All => {
            response.hospitals_changed = persistence
                .set_hospital_verification(None, verified)
                .map_err(translate_persistence_error)?;
            response.staff_changed = persistence
                .set_staff_verification(None, None, verified)
                .map_err(translate_persistence_error)?;
        }
    }

    info!(
        verified,
        hospitals_changed = response.hospitals_changed,
        staff_changed = response.staff_changed,
        "Updated verification flags"
    );
    Ok(response)
}

/// Removes expired sessions and sessions whose account is gone.
///
/// # Errors
///
/// Returns an error if a delete fails.
pub fn cleanup_sessions(
    persistence: &mut SqlitePersistence,
    now: OffsetDateTime,
) -> Result<CleanupSessionsResponse, ApiError> {
    let expired_removed: usize = persistence
        .delete_expired_sessions(now)
        .map_err(translate_persistence_error)?;
    let orphaned_removed: usize = persistence
        .delete_orphaned_sessions()
        .map_err(translate_persistence_error)?;

    info!(expired_removed, orphaned_removed, "Cleaned up sessions");
    Ok(CleanupSessionsResponse {
        expired_removed,
        orphaned_removed,
    })
}

/// Creates an administrator account.
///
/// # Errors
///
/// Returns an error if the input or password is invalid, the email is
/// already registered, or a write fails.
pub fn create_admin(
    persistence: &mut SqlitePersistence,
    request: &CreateAdminRequest,
    now: OffsetDateTime,
) -> Result<CreateAdminResponse, ApiError> {
    let account: NewAccount = AccountFields {
        first_name: &request.first_name,
        last_name: &request.last_name,
        email: &request.email,
        phone: None,
        password: &request.password,
        password_confirmation: &request.password,
    }
    .validate(AccountKind::Admin)?;

    let account_id: i64 = persistence
        .create_account(&account, now)
        .map_err(translate_account_error)?;

    record_account_created(
        persistence,
        Actor::system("create-admin"),
        Cause::new(
            String::from("create-admin"),
            String::from("Administrator created from the command line"),
        ),
        "CreateAdmin",
        account_id,
        format!("Created administrator {}", account.email),
    )?;

    Ok(CreateAdminResponse {
        account_id,
        email: account.email,
    })
}

/// Renders QR codes for appointments that lack one, or all with `force`.
///
/// Failures are logged and counted; the run continues.
///
/// # Errors
///
/// Returns an error if the appointments cannot be listed.
pub fn regenerate_qr_codes(
    persistence: &mut SqlitePersistence,
    renderer: &dyn ArtifactRenderer,
    appointment_id: Option<i64>,
    force: bool,
) -> Result<RegenerationSummary, ApiError> {
    let appointments: Vec<Appointment> = persistence
        .appointments_needing_qr(appointment_id, force)
        .map_err(translate_persistence_error)?;

    let mut summary: RegenerationSummary = RegenerationSummary::default();
    for appointment in appointments {
        let Some(payload) = appointment.qr_payload.as_ref() else {
            warn!(
                appointment_id = appointment.appointment_id,
                "Appointment has no QR payload"
            );
            summary.failed += 1;
            continue;
        };
        match issue_qr(persistence, renderer, payload) {
            Ok(_) => summary.rendered += 1,
            Err(e) => {
                warn!(
                    appointment_id = payload.appointment_id,
                    error = %e,
                    "QR code generation failed"
                );
                summary.failed += 1;
            }
        }
    }

    info!(
        rendered = summary.rendered,
        failed = summary.failed,
        "Regenerated QR codes"
    );
    Ok(summary)
}

/// Renders certificates for donations that lack one, or all with `force`.
///
/// # Errors
///
/// Returns an error if the donations cannot be listed.
pub fn regenerate_certificates(
    persistence: &mut SqlitePersistence,
    renderer: &dyn ArtifactRenderer,
    public_base_url: &str,
    donation_id: Option<i64>,
    force: bool,
) -> Result<RegenerationSummary, ApiError> {
    let sources: Vec<CertificateSource> = persistence
        .donations_needing_certificate(donation_id, force)
        .map_err(translate_persistence_error)?;

    let mut summary: RegenerationSummary = RegenerationSummary::default();
    for source in sources {
        let payload: CertificatePayload = CertificatePayload {
            verification_url: verification_url(public_base_url, &source.serial),
            serial: source.serial,
            donor_name: source.donor_name,
            blood_type: source.blood_type,
            hospital_name: source.hospital_name,
            donation_date: source.confirmed_at.to_offset(UtcOffset::UTC).date(),
            units: source.units,
        };
        match issue_certificate(persistence, renderer, source.donation_id, &payload) {
            Ok(_) => summary.rendered += 1,
            Err(e) => {
                warn!(
                    donation_id = source.donation_id,
                    error = %e,
                    "Certificate generation failed"
                );
                summary.failed += 1;
            }
        }
    }

    info!(
        rendered = summary.rendered,
        failed = summary.failed,
        "Regenerated certificates"
    );
    Ok(summary)
}
