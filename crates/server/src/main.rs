// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

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

mod json;
mod session;

#[cfg(test)]
mod tests;

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Parser, Subcommand, ValueEnum};
use give_pulse_api::{
    AcceptMatchResponse, ApiError, CertificateVerificationResponse, CheckInRequest,
    CleanupSessionsResponse, CompleteDonationRequest, CompleteDonationResponse, CreateAdminRequest,
    CreateAdminResponse, CreateBloodRequestRequest, CreateBloodRequestResponse,
    ExpireRequestsResponse, FileArtifactRenderer, ListHospitalsResponse, LoginRequest,
    LoginResponse, MatchResponse, MatchableRequestsResponse, RegenerationSummary,
    RegisterDonorRequest, RegisterResponse, RegisterStaffRequest, RequestDetailResponse,
    VerifyAction, VerifyEntitiesRequest, VerifyEntitiesResponse, VerifyTarget, WhoAmIResponse,
    accept_match, check_in, cleanup_sessions, complete_donation, create_admin,
    create_blood_request, create_match, decline_match, expire_requests, hospitals_by_city, login,
    logout, matchable_requests, regenerate_certificates, regenerate_qr_codes, register_donor,
    register_staff, request_detail, verify_certificate, verify_entities, whoami,
};
use give_pulse_audit::Cause;
use give_pulse_persistence::SqlitePersistence;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::json::ValidatedJson;
use crate::session::SessionActor;

/// `GivePulse` Server - HTTP server for blood donation coordination
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Directory that receives rendered QR codes and certificates
    #[arg(long, default_value = "media")]
    media_root: PathBuf,

    /// Base URL printed on certificates for public verification
    #[arg(long, default_value = "http://localhost:3000")]
    public_base_url: String,

    /// Log filter used when `RUST_LOG` is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Maintenance>,
}

/// Maintenance commands run against the database instead of serving HTTP.
#[derive(Subcommand, Debug)]
enum Maintenance {
    /// Render QR codes for appointments that have none
    RegenerateQrCodes {
        #[arg(long)]
        appointment_id: Option<i64>,
        /// Re-render even if an artifact already exists
        #[arg(long)]
        force: bool,
    },
    /// Render certificates for donations that have none
    RegenerateCertificates {
        #[arg(long)]
        donation_id: Option<i64>,
        /// Re-render even if an artifact already exists
        #[arg(long)]
        force: bool,
    },
    /// Expire open and partial requests whose deadline has passed
    ExpireRequests,
    /// Set or clear hospital and staff verification
    VerifyEntities {
        #[arg(long, value_enum)]
        action: ActionArg,
        #[arg(long = "type", value_enum)]
        target: TargetArg,
        #[arg(long)]
        id: Option<i64>,
        #[arg(long)]
        hospital_id: Option<i64>,
    },
    /// Delete expired sessions and sessions of deleted accounts
    CleanupSessions,
    /// Create an administrator account
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ActionArg {
    Verify,
    Unverify,
}

impl From<ActionArg> for VerifyAction {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Verify => Self::Verify,
            ActionArg::Unverify => Self::Unverify,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TargetArg {
    Hospital,
    Staff,
    All,
}

impl From<TargetArg> for VerifyTarget {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Hospital => Self::Hospital,
            TargetArg::Staff => Self::Staff,
            TargetArg::All => Self::All,
        }
    }
}

/// Application state shared across handlers.
///
/// The persistence layer sits behind a Mutex so each request runs its
/// transition against the connection exclusively.
#[derive(Clone)]
pub struct AppState {
    /// The persistence layer.
    pub persistence: Arc<Mutex<SqlitePersistence>>,
    /// Renders QR codes and certificates after a transition commits.
    pub renderer: FileArtifactRenderer,
    /// Base URL used in certificate verification links.
    pub public_base_url: Arc<str>,
}

/// Query parameters for listing hospitals.
#[derive(Debug, Deserialize)]
struct HospitalsQuery {
    city: String,
}

/// Query parameters for listing matchable requests.
#[derive(Debug, Deserialize)]
struct MatchableQuery {
    city: Option<String>,
}

/// Liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HealthResponse {
    status: String,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error message.
    message: String,
    /// The record a conflict collided with.
    #[serde(skip_serializing_if = "Option::is_none")]
    existing_id: Option<i64>,
}

/// HTTP error wrapper that implements `IntoResponse`.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    message: String,
    existing_id: Option<i64>,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
            existing_id: self.existing_id,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let (status, existing_id): (StatusCode, Option<i64>) = match &err {
            ApiError::AuthenticationFailed { .. } => (StatusCode::UNAUTHORIZED, None),
            ApiError::Unauthorized { .. } => (StatusCode::FORBIDDEN, None),
            ApiError::InvalidInput { .. } | ApiError::PasswordPolicyViolation { .. } => {
                (StatusCode::BAD_REQUEST, None)
            }
            ApiError::Ineligible { .. } => (StatusCode::UNPROCESSABLE_ENTITY, None),
            ApiError::InvalidTransition { .. } => (StatusCode::CONFLICT, None),
            ApiError::Conflict { existing_id, .. } => (StatusCode::CONFLICT, *existing_id),
            ApiError::ResourceNotFound { .. } => (StatusCode::NOT_FOUND, None),
            ApiError::Internal { .. } => {
                error!(error = %err, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };
        Self {
            status,
            message: err.to_string(),
            existing_id,
        }
    }
}

/// Builds the audit cause for an HTTP operation.
fn http_cause(operation: &str) -> Cause {
    Cause::new(
        format!("http:{operation}"),
        format!("HTTP {operation} request"),
    )
}

// ============================================================================
// Authentication & Registration
// ============================================================================

/// Handler for POST `/auth/login`.
async fn handle_login(
    AxumState(app_state): AxumState<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: LoginResponse = login(&mut persistence, &req, OffsetDateTime::now_utc())?;
    Ok(Json(response))
}

/// Handler for POST `/auth/logout`.
async fn handle_logout(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor, token): SessionActor,
) -> Result<StatusCode, HttpError> {
    info!(account_id = actor.account_id, "Handling logout request");
    let mut persistence = app_state.persistence.lock().await;
    logout(&mut persistence, &token)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET `/auth/whoami`.
#[allow(clippy::unused_async)]
async fn handle_whoami(SessionActor(actor, _): SessionActor) -> Json<WhoAmIResponse> {
    Json(whoami(&actor))
}

/// Handler for POST `/register/donor`.
async fn handle_register_donor(
    AxumState(app_state): AxumState<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterDonorRequest>,
) -> Result<Json<RegisterResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: RegisterResponse = register_donor(
        &mut persistence,
        req,
        http_cause("register_donor"),
        OffsetDateTime::now_utc(),
    )?;
    info!(account_id = response.account_id, "Registered donor");
    Ok(Json(response))
}

/// Handler for POST `/register/staff`.
async fn handle_register_staff(
    AxumState(app_state): AxumState<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterStaffRequest>,
) -> Result<Json<RegisterResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: RegisterResponse = register_staff(
        &mut persistence,
        req,
        http_cause("register_staff"),
        OffsetDateTime::now_utc(),
    )?;
    info!(account_id = response.account_id, "Registered staff");
    Ok(Json(response))
}

// ============================================================================
// Hospitals & Requests
// ============================================================================

/// Handler for GET `/hospitals?city=`.
async fn handle_hospitals(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<HospitalsQuery>,
) -> Result<Json<ListHospitalsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(hospitals_by_city(&mut persistence, &query.city)?))
}

/// Handler for POST `/requests`.
async fn handle_create_request(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor, _): SessionActor,
    ValidatedJson(req): ValidatedJson<CreateBloodRequestRequest>,
) -> Result<Json<CreateBloodRequestResponse>, HttpError> {
    info!(
        account_id = actor.account_id,
        blood_type = %req.blood_type,
        units = req.units_requested,
        "Handling create_blood_request request"
    );
    let mut persistence = app_state.persistence.lock().await;
    let response: CreateBloodRequestResponse = create_blood_request(
        &mut persistence,
        req,
        &actor,
        http_cause("create_blood_request"),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(response))
}

/// Handler for GET `/requests/matchable`.
async fn handle_matchable_requests(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor, _): SessionActor,
    Query(query): Query<MatchableQuery>,
) -> Result<Json<MatchableRequestsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: MatchableRequestsResponse = matchable_requests(
        &mut persistence,
        &actor,
        query.city.as_deref(),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(response))
}

/// Handler for GET `/requests/{id}`.
async fn handle_request_detail(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor, _): SessionActor,
    Path(request_id): Path<i64>,
) -> Result<Json<RequestDetailResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(request_detail(&mut persistence, &actor, request_id)?))
}

// ============================================================================
// Match Lifecycle
// ============================================================================

/// Handler for POST `/requests/{id}/matches`.
async fn handle_create_match(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor, _): SessionActor,
    Path(request_id): Path<i64>,
) -> Result<Json<MatchResponse>, HttpError> {
    info!(
        account_id = actor.account_id,
        request_id, "Handling create_match request"
    );
    let mut persistence = app_state.persistence.lock().await;
    let response: MatchResponse = create_match(
        &mut persistence,
        &actor,
        request_id,
        http_cause("create_match"),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(response))
}

/// Handler for POST `/matches/{id}/accept`.
async fn handle_accept_match(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor, _): SessionActor,
    Path(match_id): Path<i64>,
) -> Result<Json<AcceptMatchResponse>, HttpError> {
    info!(
        account_id = actor.account_id,
        match_id, "Handling accept_match request"
    );
    let mut persistence = app_state.persistence.lock().await;
    let response: AcceptMatchResponse = accept_match(
        &mut persistence,
        &app_state.renderer,
        &actor,
        match_id,
        http_cause("accept_match"),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(response))
}

/// Handler for POST `/matches/{id}/decline`.
async fn handle_decline_match(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor, _): SessionActor,
    Path(match_id): Path<i64>,
) -> Result<Json<MatchResponse>, HttpError> {
    info!(
        account_id = actor.account_id,
        match_id, "Handling decline_match request"
    );
    let mut persistence = app_state.persistence.lock().await;
    let response: MatchResponse = decline_match(
        &mut persistence,
        &actor,
        match_id,
        http_cause("decline_match"),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(response))
}

/// Handler for POST `/appointments/check_in`.
async fn handle_check_in(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor, _): SessionActor,
    ValidatedJson(req): ValidatedJson<CheckInRequest>,
) -> Result<Json<MatchResponse>, HttpError> {
    info!(
        account_id = actor.account_id,
        appointment_id = req.payload.appointment_id,
        "Handling check_in request"
    );
    let mut persistence = app_state.persistence.lock().await;
    let response: MatchResponse = check_in(
        &mut persistence,
        &actor,
        req,
        http_cause("check_in"),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(response))
}

/// Handler for POST `/appointments/{id}/complete`.
async fn handle_complete_donation(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor, _): SessionActor,
    Path(appointment_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<CompleteDonationRequest>,
) -> Result<Json<CompleteDonationResponse>, HttpError> {
    info!(
        account_id = actor.account_id,
        appointment_id,
        units = req.units,
        "Handling complete_donation request"
    );
    let mut persistence = app_state.persistence.lock().await;
    let response: CompleteDonationResponse = complete_donation(
        &mut persistence,
        &app_state.renderer,
        &app_state.public_base_url,
        &actor,
        appointment_id,
        &req,
        http_cause("complete_donation"),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(response))
}

/// Handler for GET `/certificates/verify/{serial}`.
async fn handle_verify_certificate(
    AxumState(app_state): AxumState<AppState>,
    Path(serial): Path<String>,
) -> Result<Json<CertificateVerificationResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(verify_certificate(&mut persistence, &serial)?))
}

/// Handler for GET `/health`.
#[allow(clippy::unused_async)]
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: String::from("ok"),
    })
}

fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/auth/login", post(handle_login))
        .route("/auth/logout", post(handle_logout))
        .route("/auth/whoami", get(handle_whoami))
        .route("/register/donor", post(handle_register_donor))
        .route("/register/staff", post(handle_register_staff))
        .route("/hospitals", get(handle_hospitals))
        .route("/requests", post(handle_create_request))
        .route("/requests/matchable", get(handle_matchable_requests))
        .route("/requests/{id}", get(handle_request_detail))
        .route("/requests/{id}/matches", post(handle_create_match))
        .route("/matches/{id}/accept", post(handle_accept_match))
        .route("/matches/{id}/decline", post(handle_decline_match))
        .route("/appointments/check_in", post(handle_check_in))
        .route(
            "/appointments/{id}/complete",
            post(handle_complete_donation),
        )
        .route(
            "/certificates/verify/{serial}",
            get(handle_verify_certificate),
        )
        .with_state(app_state)
}

// ============================================================================
// Maintenance
// ============================================================================

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Runs one maintenance command and prints its result as JSON.
fn run_maintenance(
    command: Maintenance,
    persistence: &mut SqlitePersistence,
    renderer: &FileArtifactRenderer,
    public_base_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let now: OffsetDateTime = OffsetDateTime::now_utc();
    match command {
        Maintenance::RegenerateQrCodes {
            appointment_id,
            force,
        } => {
            let summary: RegenerationSummary =
                regenerate_qr_codes(persistence, renderer, appointment_id, force)?;
            print_json(&summary)
        }
        Maintenance::RegenerateCertificates { donation_id, force } => {
            let summary: RegenerationSummary = regenerate_certificates(
                persistence,
                renderer,
                public_base_url,
                donation_id,
                force,
            )?;
            print_json(&summary)
        }
        Maintenance::ExpireRequests => {
            let response: ExpireRequestsResponse = expire_requests(persistence, now)?;
            print_json(&response)
        }
        Maintenance::VerifyEntities {
            action,
            target,
            id,
            hospital_id,
        } => {
            let response: VerifyEntitiesResponse = verify_entities(
                persistence,
                &VerifyEntitiesRequest {
                    action: action.into(),
                    target: target.into(),
                    id,
                    hospital_id,
                },
            )?;
            print_json(&response)
        }
        Maintenance::CleanupSessions => {
            let response: CleanupSessionsResponse = cleanup_sessions(persistence, now)?;
            print_json(&response)
        }
        Maintenance::CreateAdmin {
            email,
            password,
            first_name,
            last_name,
        } => {
            let response: CreateAdminResponse = create_admin(
                persistence,
                &CreateAdminRequest {
                    email,
                    password,
                    first_name,
                    last_name,
                },
                now,
            )?;
            print_json(&response)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .init();

    info!("Initializing GivePulse Server");

    let mut persistence: SqlitePersistence = if let Some(db_path) = &args.database {
        info!(path = %db_path, "Using file-based database");
        SqlitePersistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        SqlitePersistence::new_in_memory()?
    };
    persistence.verify_foreign_key_enforcement()?;

    let renderer: FileArtifactRenderer = FileArtifactRenderer::new(&args.media_root);

    if let Some(command) = args.command {
        return run_maintenance(command, &mut persistence, &renderer, &args.public_base_url);
    }

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        renderer,
        public_base_url: Arc::from(args.public_base_url.as_str()),
    };

    let app: Router = build_router(app_state);

    let addr: std::net::SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!(%addr, media_root = %args.media_root.display(), "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
