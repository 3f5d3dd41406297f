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
    clippy::all
)]

use serde::{Deserialize, Serialize};

#[cfg(test)]
mod tests;

/// Actor type recorded for changes made by an operator command.
pub const SYSTEM_ACTOR_TYPE: &str = "system";

/// Represents the entity performing an action.
///
/// An actor is any identifiable entity that initiates a state change.
/// This could be a donor, a staff member, an admin, or a maintenance command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The unique identifier for this actor.
    pub id: String,
    /// The type of actor (e.g., "donor", "staff", "system").
    pub actor_type: String,
}

impl Actor {
    /// Creates a new Actor.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this actor
    /// * `actor_type` - The type of actor
    #[must_use]
    pub const fn new(id: String, actor_type: String) -> Self {
        Self { id, actor_type }
    }

    /// Creates the actor for a maintenance command.
    #[must_use]
    pub fn system(command: &str) -> Self {
        Self {
            id: command.to_string(),
            actor_type: String::from(SYSTEM_ACTOR_TYPE),
        }
    }

    /// Returns true if this actor is a maintenance command.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.actor_type == SYSTEM_ACTOR_TYPE
    }
}

/// Represents the reason or trigger for an action.
///
/// A cause describes why a state change was initiated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cause {
    /// A unique identifier for this cause (e.g., request ID, command name).
    pub id: String,
    /// A description of the cause.
    pub description: String,
}

impl Cause {
    /// Creates a new Cause.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this cause
    /// * `description` - A description of what triggered this action
    #[must_use]
    pub const fn new(id: String, description: String) -> Self {
        Self { id, description }
    }
}

/// Represents the specific action performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// The name of the action (e.g., "`CreateMatch`", "`AcceptMatch`").
    pub name: String,
    /// Optional additional details about the action.
    pub details: Option<String>,
}

impl Action {
    /// Creates a new Action.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the action
    /// * `details` - Optional additional details
    #[must_use]
    pub const fn new(name: String, details: Option<String>) -> Self {
        Self { name, details }
    }
}

/// A snapshot of the affected entities at a point in time.
///
/// The data is a compact text rendering of the fields the action touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub data: String,
}

impl StateSnapshot {
    /// Creates a new `StateSnapshot`.
    #[must_use]
    pub const fn new(data: String) -> Self {
        Self { data }
    }

    /// A snapshot for an entity that did not exist yet.
    #[must_use]
    pub fn absent() -> Self {
        Self {
            data: String::from("absent"),
        }
    }
}

/// The entity an audit event is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSubject {
    /// The kind of entity (e.g., "match", "blood_request").
    pub entity_type: String,
    /// The entity identifier. `None` when the entity is created by the
    /// same transition and has not been assigned an identifier yet.
    pub entity_id: Option<i64>,
}

impl AuditSubject {
    /// Creates a new `AuditSubject`.
    #[must_use]
    pub fn new(entity_type: &str, entity_id: Option<i64>) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            entity_id,
        }
    }

    /// Returns a copy with the identifier filled in.
    #[must_use]
    pub fn with_id(&self, entity_id: i64) -> Self {
        Self {
            entity_type: self.entity_type.clone(),
            entity_id: Some(entity_id),
        }
    }
}

/// An immutable audit event representing a state transition.
///
/// Every successful state change must produce exactly one audit event.
/// Audit events are immutable once created and capture:
/// - Who performed the action (actor)
/// - Why it was performed (cause)
/// - What action was performed (action)
/// - The state before and after the transition
/// - The entity the change applied to (subject)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// The persisted identifier. `None` until stored.
    pub event_id: Option<i64>,
    /// The actor who initiated this state change.
    pub actor: Actor,
    /// The cause or reason for this state change.
    pub cause: Cause,
    /// The action that was performed.
    pub action: Action,
    /// The state before the transition.
    pub before: StateSnapshot,
    /// The state after the transition.
    pub after: StateSnapshot,
    /// The entity the change applied to.
    pub subject: AuditSubject,
}

impl AuditEvent {
    /// Creates a new `AuditEvent`.
    ///
    /// # Arguments
    ///
    /// * `actor` - The actor who initiated the change
    /// * `cause` - The reason for the change
    /// * `action` - The action that was performed
    /// * `before` - The state before the transition
    /// * `after` - The state after the transition
    /// * `subject` - The entity the change applied to
    #[must_use]
    pub const fn new(
        actor: Actor,
        cause: Cause,
        action: Action,
        before: StateSnapshot,
        after: StateSnapshot,
        subject: AuditSubject,
    ) -> Self {
        Self {
            event_id: None,
            actor,
            cause,
            action,
            before,
            after,
            subject,
        }
    }

    /// Returns a copy whose subject carries the identifier assigned on insert.
    #[must_use]
    pub fn with_subject_id(&self, entity_id: i64) -> Self {
        let mut event: Self = self.clone();
        event.subject = self.subject.with_id(entity_id);
        event
    }
}
