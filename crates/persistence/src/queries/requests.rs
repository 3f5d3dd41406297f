// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Blood request queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use give_pulse_domain::{BloodRequest, RequestStatus};

use crate::diesel_schema::blood_requests;
use crate::error::PersistenceError;
use crate::queries::rows::BloodRequestRow;

/// Retrieves a blood request by ID.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is malformed.
/// Returns `Ok(None)` if the request is not found.
pub fn get_request(
    conn: &mut SqliteConnection,
    request_id: i64,
) -> Result<Option<BloodRequest>, PersistenceError> {
    blood_requests::table
        .filter(blood_requests::request_id.eq(request_id))
        .select(BloodRequestRow::as_select())
        .first::<BloodRequestRow>(conn)
        .optional()?
        .map(BloodRequestRow::into_domain)
        .transpose()
}

/// Lists requests in any of the given statuses, soonest deadline first.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `statuses` - The statuses to include
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn list_requests_by_status(
    conn: &mut SqliteConnection,
    statuses: &[RequestStatus],
) -> Result<Vec<BloodRequest>, PersistenceError> {
    let names: Vec<&'static str> = statuses.iter().map(RequestStatus::as_str).collect();

    let rows: Vec<BloodRequestRow> = blood_requests::table
        .filter(blood_requests::status.eq_any(names))
        .order((
            blood_requests::deadline_at.asc(),
            blood_requests::request_id.asc(),
        ))
        .select(BloodRequestRow::as_select())
        .load(conn)?;

    rows.into_iter().map(BloodRequestRow::into_domain).collect()
}

/// Lists a hospital's requests, newest first.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn list_requests_for_hospital(
    conn: &mut SqliteConnection,
    hospital_id: i64,
) -> Result<Vec<BloodRequest>, PersistenceError> {
    let rows: Vec<BloodRequestRow> = blood_requests::table
        .filter(blood_requests::hospital_id.eq(hospital_id))
        .order(blood_requests::request_id.desc())
        .select(BloodRequestRow::as_select())
        .load(conn)?;

    rows.into_iter().map(BloodRequestRow::into_domain).collect()
}
