// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Request handling for the donation coordination service.
//!
//! Handlers authenticate and authorize the caller, run the pure core
//! transition, persist it, and translate every lower-level error into
//! an `ApiError`.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod artifacts;
mod auth;
mod error;
mod handlers;
mod maintenance;
mod password_policy;
mod request_response;

#[cfg(test)]
mod tests;

pub use artifacts::{
    ArtifactError, ArtifactRenderer, CERTIFICATE_DIRECTORY, FileArtifactRenderer, QR_DIRECTORY,
    issue_certificate, issue_qr,
};
pub use auth::{
    AccountRole, AuthenticatedActor, AuthenticationService, AuthorizationService, SESSION_LIFETIME,
};
pub use error::{
    ApiError, AuthError, translate_core_error, translate_domain_error, translate_persistence_error,
};
pub use handlers::{
    MAX_SERIAL_ATTEMPTS, accept_match, check_in, complete_donation, complete_donation_with_serials,
    create_blood_request, create_match, decline_match, hospitals_by_city, login, logout,
    matchable_requests, register_donor, register_staff, request_detail, verify_certificate, whoami,
};
pub use maintenance::{
    cleanup_sessions, create_admin, expire_requests, regenerate_certificates, regenerate_qr_codes,
    verify_entities,
};
pub use password_policy::{CharacterClass, MissingClasses, PasswordPolicy, PasswordPolicyError};
pub use request_response::{
    AcceptMatchResponse, AppointmentInfo, BloodRequestInfo, CertificateVerificationResponse,
    CheckInRequest, CleanupSessionsResponse, CompleteDonationRequest, CompleteDonationResponse,
    CreateAdminRequest, CreateAdminResponse, CreateBloodRequestRequest, CreateBloodRequestResponse,
    ExpireRequestsResponse, HospitalInfo, ListHospitalsResponse, LoginRequest, LoginResponse,
    MatchInfo, MatchResponse, MatchableRequestsResponse, RegenerationSummary, RegisterDonorRequest,
    RegisterResponse, RegisterStaffRequest, RequestDetailResponse, VerifyAction,
    VerifyEntitiesRequest, VerifyEntitiesResponse, VerifyTarget, WhoAmIResponse,
};
