// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for state-changing and read-only operations.
//!
//! Every handler that acts for an account takes the already resolved
//! `AuthenticatedActor`, runs its authorization check first, and only then
//! touches persistence.

use give_pulse::{
    Command, Matchable, RequestCommand, RequestTransition, State, Transition, TransitionResult,
    apply, apply_request_command, matchable_requests as list_matchable,
};
use give_pulse_audit::{Action, Actor, AuditEvent, AuditSubject, Cause, StateSnapshot};
use give_pulse_domain::{
    AccountKind, Appointment, BloodRequest, BloodRequestDraft, BloodType, CertificatePayload,
    CertificateSerial, DomainError, Donation, Donor, FulfillmentOutcome, Hospital,
    MAX_PLACE_LENGTH, QrPayload, RequestStatus, Staff, normalize_email, validate_city,
    validate_person_name, validate_phone, verification_url,
};
use give_pulse_persistence::{
    CertificateRecord, NewAccount, NewDonorProfile, PersistTransitionResult, PersistenceError,
    SessionData, SqlitePersistence,
};
use std::collections::HashSet;
use time::{Date, OffsetDateTime, UtcOffset};
use tracing::{info, warn};

use crate::artifacts::{ArtifactRenderer, issue_certificate, issue_qr};
use crate::auth::{AccountRole, AuthenticatedActor, AuthenticationService, AuthorizationService};
use crate::error::{
    ApiError, translate_core_error, translate_domain_error, translate_persistence_error,
};
use crate::password_policy::PasswordPolicy;
use crate::request_response::{
    AcceptMatchResponse, AppointmentInfo, BloodRequestInfo, CertificateVerificationResponse,
    CheckInRequest, CompleteDonationRequest, CompleteDonationResponse, CreateBloodRequestRequest,
    CreateBloodRequestResponse, HospitalInfo, ListHospitalsResponse, LoginRequest, LoginResponse,
    MatchInfo, MatchResponse, MatchableRequestsResponse, RegisterDonorRequest, RegisterResponse,
    RegisterStaffRequest, RequestDetailResponse, WhoAmIResponse,
};

/// How many certificate serials are tried before a completion gives up.
pub const MAX_SERIAL_ATTEMPTS: u32 = 5;

fn not_found(resource_type: &str, message: String) -> ApiError {
    ApiError::ResourceNotFound {
        resource_type: resource_type.to_string(),
        message,
    }
}

fn missing_id(what: &str) -> ApiError {
    ApiError::Internal {
        message: format!("{what} has no identifier"),
    }
}

/// Returns the UTC calendar date of `now`.
fn utc_date(now: OffsetDateTime) -> Date {
    now.to_offset(UtcOffset::UTC).date()
}

// ============================================================================
// Authentication
// ============================================================================

/// Authenticates by email and password and opens a session.
///
/// # Errors
///
/// Returns an error if:
/// - The email is unknown or the password is wrong
/// - Database operations fail
pub fn login(
    persistence: &mut SqlitePersistence,
    request: &LoginRequest,
    now: OffsetDateTime,
) -> Result<LoginResponse, ApiError> {
    let (session_token, actor, session): (String, AuthenticatedActor, SessionData) =
        AuthenticationService::login(persistence, &request.email, &request.password, now)?;

    Ok(LoginResponse {
        session_token,
        account_id: actor.account_id,
        role: actor.role.as_str().to_string(),
        expires_at: session.expires_at,
    })
}

/// Logs out by deleting the session.
///
/// # Errors
///
/// Returns an error if the logout fails.
pub fn logout(persistence: &mut SqlitePersistence, session_token: &str) -> Result<(), ApiError> {
    AuthenticationService::logout(persistence, session_token)?;
    Ok(())
}

/// Describes the current account.
#[must_use]
pub fn whoami(actor: &AuthenticatedActor) -> WhoAmIResponse {
    let mut response: WhoAmIResponse = WhoAmIResponse {
        account_id: actor.account_id,
        email: actor.email.clone(),
        first_name: actor.first_name.clone(),
        last_name: actor.last_name.clone(),
        role: actor.role.as_str().to_string(),
        donor_id: None,
        staff_id: None,
        hospital_id: None,
        is_verified: None,
        cooldown_until: None,
    };

    match &actor.role {
        AccountRole::Donor(donor) => {
            response.donor_id = donor.donor_id;
            response.cooldown_until = donor.cooldown_until;
        }
        AccountRole::Staff(staff) => {
            response.staff_id = staff.staff_id;
            response.hospital_id = Some(staff.hospital_id);
            response.is_verified = Some(staff.is_verified);
        }
        AccountRole::Admin | AccountRole::Guest => {}
    }
    response
}

// ============================================================================
// Registration
// ============================================================================

/// Validated account fields shared by every registration path.
pub struct AccountFields<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub password: &'a str,
    pub password_confirmation: &'a str,
}

impl AccountFields<'_> {
    pub(crate) fn validate(&self, role: AccountKind) -> Result<NewAccount, ApiError> {
        let first_name: String =
            validate_person_name("first name", self.first_name).map_err(translate_domain_error)?;
        let last_name: String =
            validate_person_name("last name", self.last_name).map_err(translate_domain_error)?;
        let email: String = normalize_email(self.email).map_err(translate_domain_error)?;
        let phone: Option<String> = match self.phone {
            Some(value) => validate_phone(value).map_err(translate_domain_error)?,
            None => None,
        };

        PasswordPolicy::default().validate(self.password, self.password_confirmation, &email)?;

        Ok(NewAccount {
            first_name,
            last_name,
            email,
            phone,
            password: self.password.to_string(),
            role,
        })
    }
}

fn validate_district(value: &str) -> Result<String, ApiError> {
    let trimmed: &str = value.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_PLACE_LENGTH {
        return Err(ApiError::InvalidInput {
            field: String::from("district"),
            message: format!("district must be between 1 and {MAX_PLACE_LENGTH} characters"),
        });
    }
    Ok(trimmed.to_string())
}

/// Maps a unique email violation to a readable conflict.
pub fn translate_account_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::UniqueViolation(_) => ApiError::Conflict {
            resource: String::from("account"),
            message: String::from("An account with this email already exists"),
            existing_id: None,
        },
        other => translate_persistence_error(other),
    }
}

/// Records the audit event of a new account.
pub fn record_account_created(
    persistence: &mut SqlitePersistence,
    actor: Actor,
    cause: Cause,
    action_name: &str,
    account_id: i64,
    details: String,
) -> Result<i64, ApiError> {
    let event: AuditEvent = AuditEvent::new(
        actor,
        cause,
        Action::new(action_name.to_string(), Some(details)),
        StateSnapshot::absent(),
        StateSnapshot::new(format!("account_id={account_id}")),
        AuditSubject::new("account", Some(account_id)),
    );
    persistence
        .persist_audit_event(&event)
        .map_err(|e| ApiError::Internal {
            message: format!("Failed to persist audit event: {e}"),
        })
}

/// Registers a donor account with its donor profile.
///
/// # Errors
///
/// Returns an error if:
/// - A name, email, phone, city, district or blood type is invalid
/// - The password violates the password policy
/// - The email is already registered
/// - Database operations fail
pub fn register_donor(
    persistence: &mut SqlitePersistence,
    request: RegisterDonorRequest,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<RegisterResponse, ApiError> {
    let account: NewAccount = AccountFields {
        first_name: &request.first_name,
        last_name: &request.last_name,
        email: &request.email,
        phone: request.phone.as_deref(),
        password: &request.password,
        password_confirmation: &request.password_confirmation,
    }
    .validate(AccountKind::Donor)?;

    let profile: NewDonorProfile = NewDonorProfile {
        blood_type: request
            .blood_type
            .parse::<BloodType>()
            .map_err(translate_domain_error)?,
        city: validate_city(&request.city).map_err(translate_domain_error)?,
        district: validate_district(&request.district)?,
        eligibility_consent: request.eligibility_consent,
        public_alias: request
            .public_alias
            .as_deref()
            .map(str::trim)
            .filter(|alias| !alias.is_empty())
            .map(ToString::to_string),
    };

    let (account_id, donor_id): (i64, i64) = persistence
        .register_donor(&account, &profile, now)
        .map_err(translate_account_error)?;

    record_account_created(
        persistence,
        Actor::new(account.email.clone(), String::from("guest")),
        cause,
        "RegisterDonor",
        account_id,
        format!("Registered donor {donor_id} ({})", profile.blood_type),
    )?;

    Ok(RegisterResponse {
        account_id,
        profile_id: donor_id,
        role: AccountKind::Donor.as_str().to_string(),
        message: String::from("Donor registered"),
    })
}

/// Registers a staff account bound to a hospital.
///
/// New staff start unverified and cannot act on requests until verified.
///
/// # Errors
///
/// Returns an error if:
/// - A name, email or phone is invalid
/// - The password violates the password policy
/// - The hospital does not exist or is in a different city
/// - The email is already registered
/// - Database operations fail
pub fn register_staff(
    persistence: &mut SqlitePersistence,
    request: RegisterStaffRequest,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<RegisterResponse, ApiError> {
    let account: NewAccount = AccountFields {
        first_name: &request.first_name,
        last_name: &request.last_name,
        email: &request.email,
        phone: request.phone.as_deref(),
        password: &request.password,
        password_confirmation: &request.password_confirmation,
    }
    .validate(AccountKind::Staff)?;

    let city: String = validate_city(&request.city).map_err(translate_domain_error)?;
    let hospital: Hospital = persistence
        .get_hospital(request.hospital_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| {
            not_found(
                "Hospital",
                format!("Hospital {} does not exist", request.hospital_id),
            )
        })?;
    if !hospital.city.trim().eq_ignore_ascii_case(&city) {
        return Err(translate_domain_error(DomainError::CityMismatch {
            hospital_city: hospital.city,
            requested_city: city,
        }));
    }

    let (account_id, staff_id): (i64, i64) = persistence
        .register_staff(&account, request.hospital_id, now)
        .map_err(translate_account_error)?;

    record_account_created(
        persistence,
        Actor::new(account.email.clone(), String::from("guest")),
        cause,
        "RegisterStaff",
        account_id,
        format!("Registered staff {staff_id} at {}", hospital.name),
    )?;

    Ok(RegisterResponse {
        account_id,
        profile_id: staff_id,
        role: AccountKind::Staff.as_str().to_string(),
        message: String::from("Staff registered; an administrator must verify the account"),
    })
}

// ============================================================================
// Hospitals & Requests
// ============================================================================

/// Lists hospitals in a city, ignoring case.
///
/// # Errors
///
/// Returns an error if the city is empty or the query fails.
pub fn hospitals_by_city(
    persistence: &mut SqlitePersistence,
    city: &str,
) -> Result<ListHospitalsResponse, ApiError> {
    let city: String = validate_city(city).map_err(translate_domain_error)?;
    let hospitals: Vec<Hospital> = persistence
        .list_hospitals_by_city(&city)
        .map_err(translate_persistence_error)?;

    Ok(ListHospitalsResponse {
        hospitals: hospitals
            .into_iter()
            .map(HospitalInfo::from_domain)
            .collect(),
    })
}

/// Opens a blood request for the actor's hospital.
///
/// # Errors
///
/// Returns an error if:
/// - The actor is not verified staff
/// - The blood type, units, deadline, city or notes are invalid
/// - Database operations fail
pub fn create_blood_request(
    persistence: &mut SqlitePersistence,
    request: CreateBloodRequestRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<CreateBloodRequestResponse, ApiError> {
    let staff: &Staff =
        AuthorizationService::authorize_verified_staff(actor, "create_blood_request")?;
    let staff_id: i64 = staff.staff_id.ok_or_else(|| missing_id("Staff profile"))?;

    let hospital: Hospital = persistence
        .get_hospital(staff.hospital_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| {
            not_found(
                "Hospital",
                format!("Hospital {} does not exist", staff.hospital_id),
            )
        })?;

    let draft: BloodRequestDraft = BloodRequestDraft {
        blood_type: request
            .blood_type
            .parse::<BloodType>()
            .map_err(translate_domain_error)?,
        city: request.city,
        district: request.district,
        units_requested: request.units_requested,
        deadline_at: request.deadline_at,
        notes: request.notes,
    };

    let transition: RequestTransition = apply_request_command(
        &hospital,
        None,
        RequestCommand::Open {
            draft,
            created_by_staff_id: staff_id,
        },
        now,
        actor.to_audit_actor(),
        cause,
    )
    .map_err(translate_core_error)?;

    let (request_id, event_id): (i64, i64) = persistence
        .persist_request_opened(&transition)
        .map_err(translate_persistence_error)?;

    let mut created: BloodRequest = transition.request;
    created.request_id = Some(request_id);

    Ok(CreateBloodRequestResponse {
        request: BloodRequestInfo::from_domain(created),
        event_id,
    })
}

/// Lists the requests a donor may respond to.
///
/// A donor in cooldown gets an empty list and the end of the cooldown.
///
/// # Errors
///
/// Returns an error if the actor is not a donor or a query fails.
pub fn matchable_requests(
    persistence: &mut SqlitePersistence,
    actor: &AuthenticatedActor,
    city: Option<&str>,
    now: OffsetDateTime,
) -> Result<MatchableRequestsResponse, ApiError> {
    let donor: &Donor = AuthorizationService::authorize_donor(actor, "list_matchable_requests")?;
    let donor_id: i64 = donor.donor_id.ok_or_else(|| missing_id("Donor profile"))?;

    let candidates: Vec<BloodRequest> = persistence
        .list_requests_by_status(&[RequestStatus::Open, RequestStatus::Partial])
        .map_err(translate_persistence_error)?;
    let already_matched: HashSet<i64> = persistence
        .matched_request_ids(donor_id)
        .map_err(translate_persistence_error)?;

    let response: MatchableRequestsResponse =
        match list_matchable(donor, &candidates, &already_matched, city, now) {
            Matchable::InCooldown { until } => MatchableRequestsResponse {
                cooldown_until: Some(until),
                requests: Vec::new(),
            },
            Matchable::Available(requests) => MatchableRequestsResponse {
                cooldown_until: None,
                requests: requests
                    .into_iter()
                    .map(BloodRequestInfo::from_domain)
                    .collect(),
            },
        };
    Ok(response)
}

/// Shows a request with its matches to staff of the owning hospital.
///
/// # Errors
///
/// Returns an error if the request does not exist, the actor is not
/// verified staff of its hospital, or a query fails.
pub fn request_detail(
    persistence: &mut SqlitePersistence,
    actor: &AuthenticatedActor,
    request_id: i64,
) -> Result<RequestDetailResponse, ApiError> {
    let request: BloodRequest = persistence
        .get_request(request_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| {
            not_found(
                "Blood request",
                format!("Blood request {request_id} does not exist"),
            )
        })?;
    AuthorizationService::authorize_hospital_staff(actor, request.hospital_id, "view_request")?;

    let matches: Vec<MatchInfo> = persistence
        .list_match_summaries(request_id)
        .map_err(translate_persistence_error)?
        .into_iter()
        .map(MatchInfo::from_summary)
        .collect();

    Ok(RequestDetailResponse {
        request: BloodRequestInfo::from_domain(request),
        matches,
    })
}

// ============================================================================
// Match Lifecycle
// ============================================================================

fn match_response(result: &TransitionResult, persisted: &PersistTransitionResult) -> MatchResponse {
    let status: String = result
        .new_state
        .current_match
        .as_ref()
        .map(|m| m.status.to_string())
        .unwrap_or_default();

    MatchResponse {
        match_id: persisted.match_id,
        request_id: result.new_state.request.request_id.unwrap_or_default(),
        donor_id: result.new_state.donor.donor_id.unwrap_or_default(),
        message: format!("Match {} is now {status}", persisted.match_id),
        status,
        event_id: persisted.event_id,
    }
}

fn load_match_scope(persistence: &mut SqlitePersistence, match_id: i64) -> Result<State, ApiError> {
    persistence
        .load_scope_for_match(match_id)
        .map_err(|e| match e {
            PersistenceError::NotFound(_) => {
                not_found("Match", format!("Match {match_id} does not exist"))
            }
            other => translate_persistence_error(other),
        })
}

fn load_appointment(
    persistence: &mut SqlitePersistence,
    appointment_id: i64,
) -> Result<Appointment, ApiError> {
    persistence
        .get_appointment(appointment_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| {
            not_found(
                "Appointment",
                format!("Appointment {appointment_id} does not exist"),
            )
        })
}

/// Applies a command to a loaded scope and persists the transition.
fn apply_and_persist(
    persistence: &mut SqlitePersistence,
    state: &State,
    command: Command,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<(TransitionResult, PersistTransitionResult), ApiError> {
    let result: TransitionResult = apply(state, command, now, actor.to_audit_actor(), cause)
        .map_err(translate_core_error)?;
    let persisted: PersistTransitionResult = persistence
        .persist_transition(&result)
        .map_err(translate_persistence_error)?;
    Ok((result, persisted))
}

/// Records a donor's response to a blood request as a pending match.
///
/// # Errors
///
/// Returns an error if:
/// - The actor is not a donor
/// - The request does not exist or no longer accepts donors
/// - The donor already responded (the conflict carries the existing match)
/// - The donor's blood type is incompatible or the donor is in cooldown
/// - Database operations fail
pub fn create_match(
    persistence: &mut SqlitePersistence,
    actor: &AuthenticatedActor,
    request_id: i64,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<MatchResponse, ApiError> {
    let donor: &Donor = AuthorizationService::authorize_donor(actor, "create_match")?;
    let donor_id: i64 = donor.donor_id.ok_or_else(|| missing_id("Donor profile"))?;

    let state: State = persistence
        .load_scope(request_id, donor_id)
        .map_err(|e| match e {
            PersistenceError::NotFound(_) => not_found(
                "Blood request",
                format!("Blood request {request_id} does not exist"),
            ),
            other => translate_persistence_error(other),
        })?;

    let (result, persisted) =
        apply_and_persist(persistence, &state, Command::CreateMatch, actor, cause, now)?;
    Ok(match_response(&result, &persisted))
}

/// Accepts a pending match, books the appointment and issues its QR code.
///
/// QR rendering runs after the transition commits; a rendering failure is
/// returned as a warning.
///
/// # Errors
///
/// Returns an error if:
/// - The match does not exist
/// - The actor is not verified staff of the request's hospital
/// - The match is not pending
/// - Database operations fail
pub fn accept_match(
    persistence: &mut SqlitePersistence,
    renderer: &dyn ArtifactRenderer,
    actor: &AuthenticatedActor,
    match_id: i64,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<AcceptMatchResponse, ApiError> {
    let state: State = load_match_scope(persistence, match_id)?;
    AuthorizationService::authorize_hospital_staff(
        actor,
        state.request.hospital_id,
        "accept_match",
    )?;

    let (result, persisted) =
        apply_and_persist(persistence, &state, Command::AcceptMatch, actor, cause, now)?;

    let Transition::MatchAccepted { cooldown_until, .. } = result.change else {
        return Err(ApiError::Internal {
            message: String::from("Accepting a match produced a different transition"),
        });
    };
    let mut appointment: Appointment = persisted.appointment.ok_or_else(|| ApiError::Internal {
        message: String::from("Accepted match has no appointment"),
    })?;

    let mut warnings: Vec<String> = Vec::new();
    if let Some(payload) = appointment.qr_payload.as_ref() {
        match issue_qr(persistence, renderer, payload) {
            Ok(reference) => appointment.qr_artifact = Some(reference),
            Err(e) => {
                warn!(
                    match_id,
                    appointment_id = payload.appointment_id,
                    error = %e,
                    "QR code generation failed"
                );
                warnings.push(format!("QR code could not be generated: {e}"));
            }
        }
    }

    info!(match_id, "Match accepted");
    Ok(AcceptMatchResponse {
        match_id,
        status: String::from("accepted"),
        cooldown_until,
        appointment: AppointmentInfo::from_domain(appointment),
        event_id: persisted.event_id,
        warnings,
    })
}

/// Declines a pending match.
///
/// # Errors
///
/// Returns an error if:
/// - The match does not exist
/// - The actor is not verified staff of the request's hospital
/// - The match is not pending
/// - Database operations fail
pub fn decline_match(
    persistence: &mut SqlitePersistence,
    actor: &AuthenticatedActor,
    match_id: i64,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<MatchResponse, ApiError> {
    let state: State = load_match_scope(persistence, match_id)?;
    AuthorizationService::authorize_hospital_staff(
        actor,
        state.request.hospital_id,
        "decline_match",
    )?;

    let (result, persisted) = apply_and_persist(
        persistence,
        &state,
        Command::DeclineMatch,
        actor,
        cause,
        now,
    )?;
    Ok(match_response(&result, &persisted))
}

/// Checks a donor in from a scanned QR payload.
///
/// # Errors
///
/// Returns an error if:
/// - The appointment does not exist
/// - The actor is not verified staff of the appointment's hospital
/// - The payload's verification code or hospital does not match
/// - The match is not accepted
/// - Database operations fail
pub fn check_in(
    persistence: &mut SqlitePersistence,
    actor: &AuthenticatedActor,
    request: CheckInRequest,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<MatchResponse, ApiError> {
    let payload: QrPayload = request.payload;
    let appointment: Appointment = load_appointment(persistence, payload.appointment_id)?;
    let state: State = load_match_scope(persistence, appointment.match_id)?;
    AuthorizationService::authorize_hospital_staff(actor, state.request.hospital_id, "check_in")?;

    if payload.hospital_name != state.hospital.name {
        return Err(ApiError::InvalidInput {
            field: String::from("qr_payload"),
            message: format!(
                "QR code was issued for {}, not {}",
                payload.hospital_name, state.hospital.name
            ),
        });
    }

    let (result, persisted) = apply_and_persist(
        persistence,
        &state,
        Command::CheckInMatch { payload },
        actor,
        cause,
        now,
    )?;
    Ok(match_response(&result, &persisted))
}

/// Confirms a donation for an appointment and issues its certificate.
///
/// Serials are drawn at random; a collision with an existing serial is
/// retried up to `MAX_SERIAL_ATTEMPTS` times.
///
/// # Errors
///
/// Returns an error if:
/// - The appointment does not exist
/// - The actor is not verified staff of the request's hospital
/// - The units are invalid or a donation is already recorded
/// - The match is neither accepted nor checked in
/// - No free serial was found
/// - Database operations fail
#[allow(clippy::too_many_arguments)]
pub fn complete_donation(
    persistence: &mut SqlitePersistence,
    renderer: &dyn ArtifactRenderer,
    public_base_url: &str,
    actor: &AuthenticatedActor,
    appointment_id: i64,
    request: &CompleteDonationRequest,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<CompleteDonationResponse, ApiError> {
    complete_donation_with_serials(
        persistence,
        renderer,
        public_base_url,
        actor,
        appointment_id,
        request,
        cause,
        now,
        |date| CertificateSerial::compose(date, rand::random::<u32>()),
    )
}

/// `complete_donation` with a caller-supplied serial source.
///
/// # Errors
///
/// See `complete_donation`.
#[allow(clippy::too_many_arguments, clippy::too_many_lines)]
pub fn complete_donation_with_serials(
    persistence: &mut SqlitePersistence,
    renderer: &dyn ArtifactRenderer,
    public_base_url: &str,
    actor: &AuthenticatedActor,
    appointment_id: i64,
    request: &CompleteDonationRequest,
    cause: Cause,
    now: OffsetDateTime,
    mut next_serial: impl FnMut(Date) -> CertificateSerial,
) -> Result<CompleteDonationResponse, ApiError> {
    let appointment: Appointment = load_appointment(persistence, appointment_id)?;
    let state: State = load_match_scope(persistence, appointment.match_id)?;
    let staff: &Staff = AuthorizationService::authorize_hospital_staff(
        actor,
        state.request.hospital_id,
        "complete_donation",
    )?;
    let staff_id: Option<i64> = staff.staff_id;
    let donation_date: Date = utc_date(now);

    let mut attempt: u32 = 0;
    let (result, persisted): (TransitionResult, PersistTransitionResult) = loop {
        attempt += 1;
        let command: Command = Command::CompleteDonation {
            units: request.units,
            certificate_serial: next_serial(donation_date),
            confirmed_by_staff_id: staff_id,
        };
        let result: TransitionResult =
            apply(&state, command, now, actor.to_audit_actor(), cause.clone())
                .map_err(translate_core_error)?;

        match persistence.persist_transition(&result) {
            Ok(persisted) => break (result, persisted),
            Err(PersistenceError::Conflict { ref resource, .. })
                if resource == "certificate_serial" && attempt < MAX_SERIAL_ATTEMPTS =>
            {
                warn!(appointment_id, attempt, "Serial collision, retrying");
            }
            Err(e) => return Err(translate_persistence_error(e)),
        }
    };

    let donation: &Donation = result
        .new_state
        .donation
        .as_ref()
        .ok_or_else(|| ApiError::Internal {
            message: String::from("Completed donation carries no donation"),
        })?;
    let donation_id: i64 = persisted.donation_id.ok_or_else(|| missing_id("Donation"))?;
    let fulfillment: FulfillmentOutcome =
        persisted.fulfillment.ok_or_else(|| ApiError::Internal {
            message: String::from("Completed donation carries no fulfillment"),
        })?;

    let url: String = verification_url(public_base_url, &donation.certificate_serial);
    let payload: CertificatePayload = CertificatePayload {
        serial: donation.certificate_serial.clone(),
        donor_name: state.donor.full_name(),
        blood_type: state.donor.blood_type,
        hospital_name: state.hospital.name.clone(),
        donation_date,
        units: donation.units,
        verification_url: url.clone(),
    };

    let mut warnings: Vec<String> = Vec::new();
    let certificate_artifact: Option<String> =
        match issue_certificate(persistence, renderer, donation_id, &payload) {
            Ok(reference) => Some(reference),
            Err(e) => {
                warn!(
                    donation_id,
                    serial = %payload.serial,
                    error = %e,
                    "Certificate generation failed"
                );
                warnings.push(format!("Certificate could not be generated: {e}"));
                None
            }
        };

    info!(
        donation_id,
        match_id = persisted.match_id,
        units = donation.units,
        request_status = %fulfillment.status,
        "Donation completed"
    );
    Ok(CompleteDonationResponse {
        donation_id,
        match_id: persisted.match_id,
        certificate_serial: donation.certificate_serial.to_string(),
        verification_url: url,
        units: donation.units,
        request_status: fulfillment.status.to_string(),
        units_fulfilled: fulfillment.units_fulfilled,
        certificate_artifact,
        event_id: persisted.event_id,
        warnings,
    })
}

/// Looks up a certificate by serial for public verification.
///
/// # Errors
///
/// Returns an error if the serial is malformed or unknown, or the query fails.
pub fn verify_certificate(
    persistence: &mut SqlitePersistence,
    serial: &str,
) -> Result<CertificateVerificationResponse, ApiError> {
    let serial: CertificateSerial =
        CertificateSerial::parse(serial).map_err(translate_domain_error)?;
    let record: CertificateRecord = persistence
        .find_certificate(&serial)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| not_found("Certificate", format!("No certificate {serial}")))?;

    Ok(CertificateVerificationResponse {
        serial: record.serial.to_string(),
        donor_name: record.donor_display_name,
        blood_type: record.blood_type.to_string(),
        hospital_name: record.hospital_name,
        donation_date: record.donation_date.to_string(),
        units: record.units,
    })
}
