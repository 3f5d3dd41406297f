// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use crate::password_policy::PasswordPolicyError;
use give_pulse::CoreError;
use give_pulse_domain::DomainError;
use give_pulse_persistence::PersistenceError;

/// Authentication and authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role}")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
/// Every variant renders a message suitable for showing to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed - the actor does not have permission.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// The donor may not take part in the requested action.
    Ineligible {
        /// The eligibility rule that failed.
        rule: String,
        /// A human-readable description of the failure.
        message: String,
    },
    /// The entity is not in a state that allows the transition.
    InvalidTransition {
        /// The current state.
        from: String,
        /// The requested state.
        to: String,
        /// A human-readable description of the failure.
        message: String,
    },
    /// The operation collides with an existing record.
    Conflict {
        /// The kind of record collided with.
        resource: String,
        /// A human-readable description of the conflict.
        message: String,
        /// The existing record, when known.
        existing_id: Option<i64>,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
    /// Password policy violation.
    PasswordPolicyViolation {
        /// A human-readable description of the policy violation.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::Ineligible { message, .. } => write!(f, "Not eligible: {message}"),
            Self::InvalidTransition { message, .. } => {
                write!(f, "Invalid transition: {message}")
            }
            Self::Conflict {
                message,
                existing_id,
                ..
            } => match existing_id {
                Some(id) => write!(f, "Conflict: {message} (existing record {id})"),
                None => write!(f, "Conflict: {message}"),
            },
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
            Self::PasswordPolicyViolation { message } => {
                write!(f, "Password policy violation: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationFailed { reason } => Self::AuthenticationFailed { reason },
            AuthError::Unauthorized {
                action,
                required_role,
            } => Self::Unauthorized {
                action,
                required_role,
            },
        }
    }
}

impl From<PasswordPolicyError> for ApiError {
    fn from(err: PasswordPolicyError) -> Self {
        Self::PasswordPolicyViolation {
            message: err.to_string(),
        }
    }
}

fn invalid_input(field: &str, err: &DomainError) -> ApiError {
    ApiError::InvalidInput {
        field: field.to_string(),
        message: err.to_string(),
    }
}

fn ineligible(rule: &str, err: &DomainError) -> ApiError {
    ApiError::Ineligible {
        rule: rule.to_string(),
        message: err.to_string(),
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match &err {
        DomainError::InvalidBloodType(_) => invalid_input("blood_type", &err),
        DomainError::InvalidAccountRole(_) => invalid_input("role", &err),
        DomainError::InvalidUnits(_) => invalid_input("units", &err),
        DomainError::InvalidDeadline(_) => invalid_input("deadline_at", &err),
        DomainError::InvalidName(_) => invalid_input("name", &err),
        DomainError::InvalidEmail(_) => invalid_input("email", &err),
        DomainError::InvalidPhone(_) => invalid_input("phone", &err),
        DomainError::InvalidCity(_) | DomainError::CityMismatch { .. } => {
            invalid_input("city", &err)
        }
        DomainError::InvalidNotes(_) => invalid_input("notes", &err),
        DomainError::VerificationCodeMismatch { .. } => invalid_input("qr_payload", &err),
        DomainError::InvalidCertificateSerial(_) => invalid_input("serial", &err),
        DomainError::InvalidAppointmentWindow { .. }
        | DomainError::DateArithmeticOverflow { .. } => invalid_input("date", &err),
        DomainError::IncompatibleBloodType { .. } => ineligible("blood_type_compatibility", &err),
        DomainError::DonorInCooldown { .. } => ineligible("donor_cooldown", &err),
        DomainError::RequestNotAcceptingMatches { .. } => ineligible("request_open", &err),
        DomainError::RequestDeadlinePassed { .. } => ineligible("request_deadline", &err),
        DomainError::InvalidStatusTransition { from, to, .. } => ApiError::InvalidTransition {
            from: from.clone(),
            to: to.clone(),
            message: err.to_string(),
        },
        DomainError::DuplicateMatch {
            existing_match_id, ..
        } => ApiError::Conflict {
            resource: String::from("match"),
            message: err.to_string(),
            existing_id: *existing_match_id,
        },
        DomainError::DonationAlreadyRecorded { .. } => ApiError::Conflict {
            resource: String::from("donation"),
            message: err.to_string(),
            existing_id: None,
        },
        DomainError::MatchNotFound { .. } => ApiError::ResourceNotFound {
            resource_type: String::from("Match"),
            message: err.to_string(),
        },
        DomainError::AppointmentMissing { .. } => ApiError::ResourceNotFound {
            resource_type: String::from("Appointment"),
            message: err.to_string(),
        },
        DomainError::InvalidRequestStatus(_)
        | DomainError::InvalidMatchStatus(_)
        | DomainError::InvalidTimestamp(_) => ApiError::Internal {
            message: format!("Stored data is malformed: {err}"),
        },
    }
}

/// Translates a core error into an API error.
///
/// This translation is explicit and ensures core errors are not leaked directly.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::MissingRequest => ApiError::ResourceNotFound {
            resource_type: String::from("Blood request"),
            message: err.to_string(),
        },
        CoreError::Unpersisted { .. } => ApiError::Internal {
            message: err.to_string(),
        },
    }
}

/// Translates a persistence error into an API error.
///
/// Guard conflicts detected inside the write transaction keep their
/// resource and existing record, and eligibility re-checks map like the
/// domain rule they repeat. Everything else is an internal error.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::Conflict {
            resource,
            message,
            existing_id,
        } => ApiError::Conflict {
            resource,
            message,
            existing_id,
        },
        PersistenceError::Ineligible(domain_err) => translate_domain_error(domain_err),
        PersistenceError::UniqueViolation(message) => ApiError::Conflict {
            resource: String::from("record"),
            message,
            existing_id: None,
        },
        PersistenceError::NotFound(message) => ApiError::ResourceNotFound {
            resource_type: String::from("Record"),
            message,
        },
        PersistenceError::SessionNotFound(reason) | PersistenceError::SessionExpired(reason) => {
            ApiError::AuthenticationFailed { reason }
        }
        other => ApiError::Internal {
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use give_pulse_domain::RequestStatus;
    use time::macros::datetime;

    #[test]
    fn test_eligibility_recheck_is_ineligible() {
        let closed: DomainError = DomainError::RequestNotAcceptingMatches {
            request_id: 4,
            status: RequestStatus::Fulfilled,
        };
        let resting: DomainError = DomainError::DonorInCooldown {
            until: datetime!(2026-05-01 00:00 UTC),
        };

        assert!(matches!(
            translate_persistence_error(PersistenceError::Ineligible(closed)),
            ApiError::Ineligible { ref rule, .. } if rule == "request_open"
        ));
        assert!(matches!(
            translate_persistence_error(PersistenceError::Ineligible(resting)),
            ApiError::Ineligible { ref rule, .. } if rule == "donor_cooldown"
        ));
    }

    #[test]
    fn test_guard_conflict_keeps_existing_id() {
        let err: ApiError = translate_persistence_error(PersistenceError::Conflict {
            resource: String::from("match"),
            message: String::from("donor 2 already responded to request 4"),
            existing_id: Some(9),
        });

        assert_eq!(
            err,
            ApiError::Conflict {
                resource: String::from("match"),
                message: String::from("donor 2 already responded to request 4"),
                existing_id: Some(9),
            }
        );
    }
}
