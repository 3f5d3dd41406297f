// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Hospital queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use give_pulse_domain::Hospital;

use crate::diesel_schema::hospitals;
use crate::error::PersistenceError;
use crate::queries::rows::HospitalRow;

/// Retrieves a hospital by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the hospital is not found.
pub fn get_hospital(
    conn: &mut SqliteConnection,
    hospital_id: i64,
) -> Result<Option<Hospital>, PersistenceError> {
    Ok(hospitals::table
        .filter(hospitals::hospital_id.eq(hospital_id))
        .select(HospitalRow::as_select())
        .first::<HospitalRow>(conn)
        .optional()?
        .map(HospitalRow::into_domain))
}

/// Lists the hospitals in a city, ordered by name.
///
/// The city is compared case-insensitively.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_hospitals_by_city(
    conn: &mut SqliteConnection,
    city: &str,
) -> Result<Vec<Hospital>, PersistenceError> {
    let rows: Vec<HospitalRow> = hospitals::table
        .filter(
            diesel::dsl::sql::<diesel::sql_types::Bool>("lower(city) = lower(")
                .bind::<diesel::sql_types::Text, _>(city.trim())
                .sql(")"),
        )
        .order((hospitals::name.asc(), hospitals::hospital_id.asc()))
        .select(HospitalRow::as_select())
        .load(conn)?;

    Ok(rows.into_iter().map(HospitalRow::into_domain).collect())
}

/// Lists every hospital, ordered by city then name.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_hospitals(conn: &mut SqliteConnection) -> Result<Vec<Hospital>, PersistenceError> {
    let rows: Vec<HospitalRow> = hospitals::table
        .order((hospitals::city.asc(), hospitals::name.asc()))
        .select(HospitalRow::as_select())
        .load(conn)?;

    Ok(rows.into_iter().map(HospitalRow::into_domain).collect())
}
