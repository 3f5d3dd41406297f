// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use give_pulse_audit::{AuditEvent, StateSnapshot};
use give_pulse_domain::{
    Appointment, AppointmentWindow, BloodRequest, Donation, Donor, FulfillmentOutcome, Hospital,
    Match, QrDetails,
};
use time::OffsetDateTime;

/// The transition scope for one (request, donor) pair.
///
/// Loaded by the caller before a command is applied. `current_match` is
/// `None` until the donor responds; the appointment and donation follow
/// the match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    /// The blood request.
    pub request: BloodRequest,
    /// The hospital that posted the request.
    pub hospital: Hospital,
    /// The donor.
    pub donor: Donor,
    /// The match between the donor and the request, if any.
    pub current_match: Option<Match>,
    /// The appointment booked for the match, if any.
    pub appointment: Option<Appointment>,
    /// The confirmed donation for the match, if any.
    pub donation: Option<Donation>,
}

impl State {
    /// Creates a scope with no match yet.
    ///
    /// # Arguments
    ///
    /// * `request` - The blood request
    /// * `hospital` - The hospital that posted the request
    /// * `donor` - The responding donor
    #[must_use]
    pub const fn new(request: BloodRequest, hospital: Hospital, donor: Donor) -> Self {
        Self {
            request,
            hospital,
            donor,
            current_match: None,
            appointment: None,
            donation: None,
        }
    }

    /// Converts the state to a snapshot for audit purposes.
    #[must_use]
    pub fn to_snapshot(&self) -> StateSnapshot {
        let cooldown_part: String = match self.donor.cooldown_until {
            Some(until) => until.unix_timestamp().to_string(),
            None => String::from("none"),
        };
        let match_part: String = match &self.current_match {
            Some(m) => format!("{}:{}", id_text(m.match_id), m.status),
            None => String::from("none"),
        };
        let appointment_part: String = match &self.appointment {
            Some(a) => id_text(a.appointment_id),
            None => String::from("none"),
        };
        let donation_part: String = match &self.donation {
            Some(d) => d.certificate_serial.to_string(),
            None => String::from("none"),
        };

        StateSnapshot::new(format!(
            "request={},request_status={},units={}/{},donor={},cooldown_until={},match={},appointment={},donation={}",
            id_text(self.request.request_id),
            self.request.status,
            self.request.units_fulfilled,
            self.request.units_requested,
            id_text(self.donor.donor_id),
            cooldown_part,
            match_part,
            appointment_part,
            donation_part,
        ))
    }
}

fn id_text(id: Option<i64>) -> String {
    id.map_or_else(|| String::from("new"), |id| id.to_string())
}

/// What a successful transition changed, for the persistence layer to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// A pending match was created.
    MatchCreated,
    /// A match was accepted: the donor rests and an appointment is booked.
    MatchAccepted {
        /// The donor's new cooldown end.
        cooldown_until: OffsetDateTime,
        /// The booked slot.
        window: AppointmentWindow,
        /// QR payload content known before the appointment is stored.
        qr_details: QrDetails,
    },
    /// A match was declined.
    MatchDeclined,
    /// The donor arrived and was checked in.
    MatchCheckedIn,
    /// A donation was confirmed and counted against the request.
    DonationCompleted {
        /// The request's counts and status after the donation.
        fulfillment: FulfillmentOutcome,
    },
}

/// The result of a successful state transition.
///
/// Transitions are atomic: they either succeed completely or fail without side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// The new state after the transition.
    pub new_state: State,
    /// What changed.
    pub change: Transition,
    /// The audit event recording this transition.
    pub audit_event: AuditEvent,
}

/// The result of a request-level command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTransition {
    /// The request after the command.
    pub request: BloodRequest,
    /// The audit event recording this transition.
    pub audit_event: AuditEvent,
}
