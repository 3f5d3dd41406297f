// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Hospital mutations.

use diesel::SqliteConnection;
use diesel::prelude::*;
use give_pulse_domain::Hospital;
use tracing::info;

use crate::backend::sqlite::get_last_insert_rowid;
use crate::diesel_schema::hospitals;
use crate::error::PersistenceError;

/// Creates a hospital.
///
/// # Errors
///
/// Returns `PersistenceError::UniqueViolation` if a hospital with the same
/// name already exists in the city.
pub fn create_hospital(
    conn: &mut SqliteConnection,
    hospital: &Hospital,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(hospitals::table)
        .values((
            hospitals::name.eq(&hospital.name),
            hospitals::city.eq(&hospital.city),
            hospitals::district.eq(&hospital.district),
            hospitals::is_verified.eq(i32::from(hospital.is_verified)),
        ))
        .execute(conn)?;

    let hospital_id: i64 = get_last_insert_rowid(conn)?;
    info!(hospital_id, name = %hospital.name, city = %hospital.city, "Hospital created");
    Ok(hospital_id)
}

/// Marks one hospital, or every hospital, verified or unverified.
///
/// # Returns
///
/// The number of hospital rows changed.
///
/// # Errors
///
/// Returns an error if the database update fails.
pub fn set_hospital_verification(
    conn: &mut SqliteConnection,
    hospital_id: Option<i64>,
    verified: bool,
) -> Result<usize, PersistenceError> {
    let flag: i32 = i32::from(verified);
    let rows_affected: usize = match hospital_id {
        Some(id) => diesel::update(hospitals::table)
            .filter(hospitals::hospital_id.eq(id))
            .filter(hospitals::is_verified.ne(flag))
            .set(hospitals::is_verified.eq(flag))
            .execute(conn)?,
        None => diesel::update(hospitals::table)
            .filter(hospitals::is_verified.ne(flag))
            .set(hospitals::is_verified.eq(flag))
            .execute(conn)?,
    };

    info!(rows_affected, verified, "Updated hospital verification");
    Ok(rows_affected)
}
