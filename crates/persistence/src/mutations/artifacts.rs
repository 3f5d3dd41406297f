// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Artifact reference updates.
//!
//! Rendering happens after the transition commits; these writes only touch
//! the reference columns.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::debug;

use crate::diesel_schema::{donation_appointments, donations};
use crate::error::PersistenceError;

/// Stores the rendered QR artifact reference for an appointment.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the appointment does not exist.
pub fn set_qr_artifact(
    conn: &mut SqliteConnection,
    appointment_id: i64,
    reference: &str,
) -> Result<(), PersistenceError> {
    let updated: usize = diesel::update(donation_appointments::table)
        .filter(donation_appointments::appointment_id.eq(appointment_id))
        .set(donation_appointments::qr_artifact.eq(reference))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Appointment {appointment_id}"
        )));
    }
    debug!(appointment_id, reference, "Stored QR artifact");
    Ok(())
}

/// Stores the rendered certificate reference for a donation.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the donation does not exist.
pub fn set_certificate_artifact(
    conn: &mut SqliteConnection,
    donation_id: i64,
    reference: &str,
) -> Result<(), PersistenceError> {
    let updated: usize = diesel::update(donations::table)
        .filter(donations::donation_id.eq(donation_id))
        .set(donations::certificate_artifact.eq(reference))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!("Donation {donation_id}")));
    }
    debug!(donation_id, reference, "Stored certificate artifact");
    Ok(())
}
