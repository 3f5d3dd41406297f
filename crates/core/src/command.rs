// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use give_pulse_domain::{BloodRequestDraft, CertificateSerial, QrPayload};

/// A command represents donor or staff intent on a single match as data only.
///
/// Commands are the only way to request match state changes. Each command
/// is applied to the transition scope loaded for one (request, donor) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Donor responds to a blood request.
    CreateMatch,
    /// Staff approve a pending match.
    AcceptMatch,
    /// Staff turn down a pending match.
    DeclineMatch,
    /// Staff scan the donor's appointment code on arrival.
    CheckInMatch {
        /// The scanned QR payload.
        payload: QrPayload,
    },
    /// Staff confirm the donation.
    CompleteDonation {
        /// Units donated.
        units: i32,
        /// A freshly generated certificate serial.
        certificate_serial: CertificateSerial,
        /// The confirming staff member.
        confirmed_by_staff_id: Option<i64>,
    },
}

impl Command {
    /// Returns the audit action name for this command.
    #[must_use]
    pub const fn action_name(&self) -> &'static str {
        match self {
            Self::CreateMatch => "CreateMatch",
            Self::AcceptMatch => "AcceptMatch",
            Self::DeclineMatch => "DeclineMatch",
            Self::CheckInMatch { .. } => "CheckInMatch",
            Self::CompleteDonation { .. } => "CompleteDonation",
        }
    }
}

/// A command on a blood request as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestCommand {
    /// Staff post a new request for their hospital.
    Open {
        /// The unvalidated request input.
        draft: BloodRequestDraft,
        /// The creating staff member.
        created_by_staff_id: i64,
    },
    /// The deadline sweep closes an overdue request.
    Expire,
}
