// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use give_pulse_domain::DomainError;

/// Errors raised while applying a command to a transition scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A domain rule rejected the command.
    DomainViolation(DomainError),
    /// The scope holds an entity that was never stored.
    Unpersisted {
        /// The entity without an identifier.
        entity: &'static str,
    },
    /// A request command needs an existing request and none was given.
    MissingRequest,
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "{err}"),
            Self::Unpersisted { entity } => {
                write!(f, "The {entity} must be stored before it can change")
            }
            Self::MissingRequest => write!(f, "No blood request was given"),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}

/// Returns the stored identifier of `entity`.
///
/// # Errors
///
/// Returns `CoreError::Unpersisted` when `id` is `None`.
pub const fn stored_id(id: Option<i64>, entity: &'static str) -> Result<i64, CoreError> {
    match id {
        Some(id) => Ok(id),
        None => Err(CoreError::Unpersisted { entity }),
    }
}
