// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Account, profile and session queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use give_pulse_domain::{AccountKind, Donor, Staff};
use tracing::debug;

use crate::data_models::{AccountData, SessionData};
use crate::diesel_schema::{accounts, donors, sessions, staff};
use crate::error::PersistenceError;
use crate::queries::rows::{AccountRow, DonorRow, SessionRow, StaffRow};

/// Retrieves an account by email.
///
/// The email is compared in lower case.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `email` - The email to search for
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the account is not found.
pub fn get_account_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> Result<Option<AccountData>, PersistenceError> {
    let normalized: String = email.trim().to_lowercase();
    debug!("Looking up account by email");

    accounts::table
        .filter(accounts::email.eq(&normalized))
        .select(AccountRow::as_select())
        .first::<AccountRow>(conn)
        .optional()?
        .map(AccountRow::into_data)
        .transpose()
}

/// Retrieves an account by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the account is not found.
pub fn get_account_by_id(
    conn: &mut SqliteConnection,
    account_id: i64,
) -> Result<Option<AccountData>, PersistenceError> {
    accounts::table
        .filter(accounts::account_id.eq(account_id))
        .select(AccountRow::as_select())
        .first::<AccountRow>(conn)
        .optional()?
        .map(AccountRow::into_data)
        .transpose()
}

/// Counts accounts holding the admin role.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_admin_accounts(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    Ok(accounts::table
        .filter(accounts::role.eq(AccountKind::Admin.as_str()))
        .count()
        .get_result(conn)?)
}

/// Retrieves the donor profile attached to an account.
///
/// # Errors
///
/// Returns an error if the query fails or the stored profile is malformed.
pub fn get_donor_by_account(
    conn: &mut SqliteConnection,
    account_id: i64,
) -> Result<Option<Donor>, PersistenceError> {
    let found: Option<(DonorRow, AccountRow)> = donors::table
        .inner_join(accounts::table)
        .filter(donors::account_id.eq(account_id))
        .select((DonorRow::as_select(), AccountRow::as_select()))
        .first(conn)
        .optional()?;

    found
        .map(|(donor, account)| donor.into_domain(&account))
        .transpose()
}

/// Retrieves a donor by donor ID.
///
/// # Errors
///
/// Returns an error if the query fails or the stored profile is malformed.
pub fn get_donor(
    conn: &mut SqliteConnection,
    donor_id: i64,
) -> Result<Option<Donor>, PersistenceError> {
    let found: Option<(DonorRow, AccountRow)> = donors::table
        .inner_join(accounts::table)
        .filter(donors::donor_id.eq(donor_id))
        .select((DonorRow::as_select(), AccountRow::as_select()))
        .first(conn)
        .optional()?;

    found
        .map(|(donor, account)| donor.into_domain(&account))
        .transpose()
}

/// Retrieves the staff profile attached to an account.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_staff_by_account(
    conn: &mut SqliteConnection,
    account_id: i64,
) -> Result<Option<Staff>, PersistenceError> {
    let found: Option<(StaffRow, AccountRow)> = staff::table
        .inner_join(accounts::table)
        .filter(staff::account_id.eq(account_id))
        .select((StaffRow::as_select(), AccountRow::as_select()))
        .first(conn)
        .optional()?;

    Ok(found.map(|(member, account)| member.into_domain(&account)))
}

/// Retrieves a session by token.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `session_token` - The session token
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the session is not found.
pub fn get_session_by_token(
    conn: &mut SqliteConnection,
    session_token: &str,
) -> Result<Option<SessionData>, PersistenceError> {
    debug!("Looking up session by token");

    sessions::table
        .filter(sessions::session_token.eq(session_token))
        .select(SessionRow::as_select())
        .first::<SessionRow>(conn)
        .optional()?
        .map(SessionRow::into_data)
        .transpose()
}

/// Verifies a password against a stored hash.
///
/// # Arguments
///
/// * `password` - The plain text password to verify
/// * `password_hash` - The stored bcrypt hash
///
/// # Errors
///
/// Returns an error if password verification fails.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PersistenceError> {
    bcrypt::verify(password, password_hash)
        .map_err(|e| PersistenceError::Other(format!("Failed to verify password: {e}")))
}
