// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authentication and authorization types and services.

use give_pulse_audit::Actor;
use give_pulse_domain::{AccountKind, Donor, Staff};
use give_pulse_persistence::{
    AccountData, PersistenceError, SessionData, SqlitePersistence, verify_password,
};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};

use crate::error::AuthError;

/// How long a login session stays valid.
pub const SESSION_LIFETIME: Duration = Duration::days(14);

/// The role of an authenticated account, carrying its profile.
///
/// Every operation matches on this exhaustively; there is no separate
/// lookup of "the current donor" or "the current staff member".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountRole {
    /// A registered donor.
    Donor(Donor),
    /// A hospital staff member. Only verified staff may act on requests.
    Staff(Staff),
    /// A platform administrator.
    Admin,
    /// An account without a donor or staff profile.
    Guest,
}

impl AccountRole {
    /// Returns the role name used in audit records and responses.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Donor(_) => "donor",
            Self::Staff(_) => "staff",
            Self::Admin => "admin",
            Self::Guest => "guest",
        }
    }
}

/// An authenticated account with its resolved role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedActor {
    /// The account identifier.
    pub account_id: i64,
    /// The normalised account email.
    pub email: String,
    /// The account holder's first name.
    pub first_name: String,
    /// The account holder's last name.
    pub last_name: String,
    /// The resolved role.
    pub role: AccountRole,
}

impl AuthenticatedActor {
    /// Converts this authenticated actor into an audit Actor.
    ///
    /// This is used when recording audit events to attribute actions
    /// to the authenticated account.
    #[must_use]
    pub fn to_audit_actor(&self) -> Actor {
        Actor::new(self.account_id.to_string(), self.role.as_str().to_string())
    }
}

fn unauthorized(action: &str, required_role: &str) -> AuthError {
    AuthError::Unauthorized {
        action: action.to_string(),
        required_role: required_role.to_string(),
    }
}

/// Authorization service for enforcing role-based access control.
///
/// Each check runs at the start of an operation and hands back the profile
/// the operation needs.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Checks that the actor is a donor.
    ///
    /// # Arguments
    ///
    /// * `actor` - The authenticated actor
    /// * `action` - The action being attempted
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not a donor.
    pub fn authorize_donor<'a>(
        actor: &'a AuthenticatedActor,
        action: &str,
    ) -> Result<&'a Donor, AuthError> {
        match &actor.role {
            AccountRole::Donor(donor) => Ok(donor),
            AccountRole::Staff(_) | AccountRole::Admin | AccountRole::Guest => {
                Err(unauthorized(action, "donor role"))
            }
        }
    }

    /// Checks that the actor is verified staff of the given hospital.
    ///
    /// # Arguments
    ///
    /// * `actor` - The authenticated actor
    /// * `hospital_id` - The hospital that owns the affected request
    /// * `action` - The action being attempted
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not staff, is unverified, or belongs
    /// to a different hospital.
    pub fn authorize_hospital_staff<'a>(
        actor: &'a AuthenticatedActor,
        hospital_id: i64,
        action: &str,
    ) -> Result<&'a Staff, AuthError> {
        let staff: &Staff = Self::authorize_verified_staff(actor, action)?;
        if staff.hospital_id != hospital_id {
            return Err(unauthorized(action, "staff of the request's hospital"));
        }
        Ok(staff)
    }

    /// Checks that the actor is verified staff of any hospital.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not staff or is unverified.
    pub fn authorize_verified_staff<'a>(
        actor: &'a AuthenticatedActor,
        action: &str,
    ) -> Result<&'a Staff, AuthError> {
        match &actor.role {
            AccountRole::Staff(staff) if staff.is_verified => Ok(staff),
            AccountRole::Staff(_) => Err(unauthorized(action, "verified staff")),
            AccountRole::Donor(_) | AccountRole::Admin | AccountRole::Guest => {
                Err(unauthorized(action, "staff role"))
            }
        }
    }

    /// Checks that the actor is an administrator.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not an admin.
    pub fn authorize_admin(actor: &AuthenticatedActor, action: &str) -> Result<(), AuthError> {
        match actor.role {
            AccountRole::Admin => Ok(()),
            AccountRole::Donor(_) | AccountRole::Staff(_) | AccountRole::Guest => {
                Err(unauthorized(action, "admin role"))
            }
        }
    }
}

/// Authentication service for session-based authentication.
pub struct AuthenticationService;

impl AuthenticationService {
    /// Authenticates an account by email and password and creates a session.
    ///
    /// # Arguments
    ///
    /// * `persistence` - The persistence layer
    /// * `email` - The account email (any case)
    /// * `password` - The plain-text password
    /// * `now` - The login time
    ///
    /// # Returns
    ///
    /// A tuple of (`session_token`, `authenticated_actor`, `session`)
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are wrong or the session cannot
    /// be stored. Unknown emails and wrong passwords are reported the same way.
    pub fn login(
        persistence: &mut SqlitePersistence,
        email: &str,
        password: &str,
        now: OffsetDateTime,
    ) -> Result<(String, AuthenticatedActor, SessionData), AuthError> {
        let invalid = || AuthError::AuthenticationFailed {
            reason: String::from("Invalid email or password"),
        };

        let account: AccountData = persistence
            .get_account_by_email(email)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(invalid)?;

        if !verify_password(password, &account.password_hash)
            .map_err(Self::map_persistence_error)?
        {
            debug!(account_id = account.account_id, "Password mismatch");
            return Err(invalid());
        }

        let actor: AuthenticatedActor = Self::resolve_actor(persistence, account)?;

        let session_token: String = Self::generate_session_token();
        let expires_at: OffsetDateTime = now + SESSION_LIFETIME;
        persistence
            .create_session(&session_token, actor.account_id, now, expires_at)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to create session: {e}"),
            })?;

        let session: SessionData = persistence
            .get_session_by_token(&session_token)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Session not found after creation"),
            })?;

        info!(
            account_id = actor.account_id,
            role = actor.role.as_str(),
            "Account logged in"
        );
        Ok((session_token, actor, session))
    }

    /// Validates a session token and returns the authenticated actor.
    ///
    /// # Arguments
    ///
    /// * `persistence` - The persistence layer
    /// * `session_token` - The session token to validate
    /// * `now` - The current time
    ///
    /// # Errors
    ///
    /// Returns an error if the session is unknown or expired, or its account
    /// no longer exists.
    pub fn validate_session(
        persistence: &mut SqlitePersistence,
        session_token: &str,
        now: OffsetDateTime,
    ) -> Result<AuthenticatedActor, AuthError> {
        let session: SessionData = persistence
            .get_session_by_token(session_token)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Invalid session token"),
            })?;

        if now >= session.expires_at {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Session expired"),
            });
        }

        let account: AccountData = persistence
            .get_account_by_id(session.account_id)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Account not found"),
            })?;

        let actor: AuthenticatedActor = Self::resolve_actor(persistence, account)?;

        persistence
            .update_session_activity(session.session_id, now)
            .map_err(Self::map_persistence_error)?;

        Ok(actor)
    }

    /// Logs out by deleting the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the logout fails.
    pub fn logout(
        persistence: &mut SqlitePersistence,
        session_token: &str,
    ) -> Result<(), AuthError> {
        persistence
            .delete_session(session_token)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to delete session: {e}"),
            })?;

        Ok(())
    }

    /// Loads the profile behind an account's stored role.
    ///
    /// # Errors
    ///
    /// Returns an error if a donor or staff account has lost its profile.
    pub fn resolve_actor(
        persistence: &mut SqlitePersistence,
        account: AccountData,
    ) -> Result<AuthenticatedActor, AuthError> {
        let missing_profile = || AuthError::AuthenticationFailed {
            reason: format!(
                "Account {} has no {} profile",
                account.account_id, account.role
            ),
        };

        let role: AccountRole = match account.role {
            AccountKind::Donor => AccountRole::Donor(
                persistence
                    .get_donor_by_account(account.account_id)
                    .map_err(Self::map_persistence_error)?
                    .ok_or_else(missing_profile)?,
            ),
            AccountKind::Staff => AccountRole::Staff(
                persistence
                    .get_staff_by_account(account.account_id)
                    .map_err(Self::map_persistence_error)?
                    .ok_or_else(missing_profile)?,
            ),
            AccountKind::Admin => AccountRole::Admin,
            AccountKind::Guest => AccountRole::Guest,
        };

        Ok(AuthenticatedActor {
            account_id: account.account_id,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
            role,
        })
    }

    /// Generates an opaque session token from two random 64-bit values.
    fn generate_session_token() -> String {
        format!(
            "{:016x}{:016x}",
            rand::random::<u64>(),
            rand::random::<u64>()
        )
    }

    /// Maps persistence errors to authentication errors.
    fn map_persistence_error(err: PersistenceError) -> AuthError {
        match err {
            PersistenceError::SessionExpired(msg) | PersistenceError::SessionNotFound(msg) => {
                AuthError::AuthenticationFailed { reason: msg }
            }
            _ => AuthError::AuthenticationFailed {
                reason: format!("Database error: {err}"),
            },
        }
    }
}
