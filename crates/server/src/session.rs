// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Session extraction for the server.
//!
//! The session is resolved once per request; handlers receive the
//! authenticated actor and never look the account up again.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use give_pulse_api::{AuthenticatedActor, AuthenticationService};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::AppState;

/// Extractor for authenticated accounts.
///
/// Validates the `Authorization: Bearer <token>` header and yields the
/// resolved actor together with the raw token (needed for logout).
///
/// # Errors
///
/// Rejects with HTTP 401 if:
/// - The Authorization header is missing or malformed
/// - The session token is unknown or expired
/// - The account or its profile no longer exists
pub struct SessionActor(pub AuthenticatedActor, pub String);

impl FromRequestParts<AppState> for SessionActor {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header: &str = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| {
                debug!("Missing Authorization header");
                SessionError::MissingAuthorizationHeader
            })?
            .to_str()
            .map_err(|_| {
                warn!("Invalid Authorization header encoding");
                SessionError::InvalidAuthorizationHeader
            })?;

        let token: &str = header.strip_prefix("Bearer ").ok_or_else(|| {
            warn!("Authorization header does not start with 'Bearer '");
            SessionError::InvalidAuthorizationHeader
        })?;

        let mut persistence = state.persistence.lock().await;
        let actor: AuthenticatedActor = AuthenticationService::validate_session(
            &mut persistence,
            token,
            OffsetDateTime::now_utc(),
        )
        .map_err(|e| {
            warn!(error = %e, "Session validation failed");
            SessionError::InvalidSession(e.to_string())
        })?;

        debug!(
            account_id = actor.account_id,
            role = actor.role.as_str(),
            "Session validated"
        );
        Ok(Self(actor, token.to_string()))
    }
}

/// Session extraction errors.
#[derive(Debug)]
pub enum SessionError {
    /// Authorization header is missing.
    MissingAuthorizationHeader,
    /// Authorization header format is invalid.
    InvalidAuthorizationHeader,
    /// Session validation failed.
    InvalidSession(String),
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let message: String = match self {
            Self::MissingAuthorizationHeader => String::from("Missing Authorization header"),
            Self::InvalidAuthorizationHeader => String::from(
                "Invalid Authorization header format. Expected: 'Bearer <token>'",
            ),
            Self::InvalidSession(reason) => format!("Session validation failed: {reason}"),
        };

        (StatusCode::UNAUTHORIZED, message).into_response()
    }
}
