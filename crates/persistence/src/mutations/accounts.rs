// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Account, profile and session mutations.
//!
//! Registration writes the account and its profile in one transaction so a
//! rejected profile never leaves an orphaned account behind.

use diesel::SqliteConnection;
use diesel::prelude::*;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::backend::sqlite::{get_last_insert_rowid, timestamp_text};
use crate::data_models::{NewAccount, NewDonorProfile};
use crate::diesel_schema::{accounts, donors, sessions, staff};
use crate::error::PersistenceError;

/// Creates a new account.
///
/// The email is stored in lower case and the password is hashed with bcrypt.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `account` - The account to create
/// * `now` - The creation time
///
/// # Errors
///
/// Returns `PersistenceError::UniqueViolation` if the email is taken, or an
/// error if hashing or the insert fails.
pub fn create_account(
    conn: &mut SqliteConnection,
    account: &NewAccount,
    now: OffsetDateTime,
) -> Result<i64, PersistenceError> {
    let email: String = account.email.trim().to_lowercase();

    info!(
        "Creating account with email: {}, role: {}",
        email, account.role
    );

    let password_hash: String = bcrypt::hash(&account.password, bcrypt::DEFAULT_COST)
        .map_err(|e| PersistenceError::Other(format!("Failed to hash password: {e}")))?;
    let stamp: String = timestamp_text(now)?;

    diesel::insert_into(accounts::table)
        .values((
            accounts::first_name.eq(&account.first_name),
            accounts::last_name.eq(&account.last_name),
            accounts::email.eq(&email),
            accounts::phone.eq(account.phone.as_deref()),
            accounts::password_hash.eq(&password_hash),
            accounts::role.eq(account.role.as_str()),
            accounts::created_at.eq(&stamp),
            accounts::updated_at.eq(&stamp),
        ))
        .execute(conn)?;

    let account_id: i64 = get_last_insert_rowid(conn)?;
    info!(account_id, "Account created successfully");

    Ok(account_id)
}

/// Registers a donor: an account plus its donor profile.
///
/// # Returns
///
/// `(account_id, donor_id)`.
///
/// # Errors
///
/// Returns `PersistenceError::UniqueViolation` if the email is taken, or an
/// error if either insert fails. Nothing is written on failure.
pub fn register_donor(
    conn: &mut SqliteConnection,
    account: &NewAccount,
    profile: &NewDonorProfile,
    now: OffsetDateTime,
) -> Result<(i64, i64), PersistenceError> {
    conn.immediate_transaction(|conn| {
        let account_id: i64 = create_account(conn, account, now)?;

        diesel::insert_into(donors::table)
            .values((
                donors::account_id.eq(account_id),
                donors::abo_type.eq(profile.blood_type.abo().as_str()),
                donors::rh_type.eq(profile.blood_type.rh().as_str()),
                donors::city.eq(&profile.city),
                donors::district.eq(&profile.district),
                donors::eligibility_consent.eq(i32::from(profile.eligibility_consent)),
                donors::public_alias.eq(profile.public_alias.as_deref()),
            ))
            .execute(conn)?;

        let donor_id: i64 = get_last_insert_rowid(conn)?;
        info!(account_id, donor_id, "Donor registered");
        Ok((account_id, donor_id))
    })
}

/// Registers a staff member: an account plus an unverified staff profile.
///
/// # Returns
///
/// `(account_id, staff_id)`.
///
/// # Errors
///
/// Returns `PersistenceError::UniqueViolation` if the email is taken, or an
/// error if either insert fails. Nothing is written on failure.
pub fn register_staff(
    conn: &mut SqliteConnection,
    account: &NewAccount,
    hospital_id: i64,
    now: OffsetDateTime,
) -> Result<(i64, i64), PersistenceError> {
    conn.immediate_transaction(|conn| {
        let account_id: i64 = create_account(conn, account, now)?;

        diesel::insert_into(staff::table)
            .values((
                staff::account_id.eq(account_id),
                staff::hospital_id.eq(hospital_id),
                staff::is_verified.eq(0),
            ))
            .execute(conn)?;

        let staff_id: i64 = get_last_insert_rowid(conn)?;
        info!(account_id, staff_id, hospital_id, "Staff registered");
        Ok((account_id, staff_id))
    })
}

/// Marks staff members verified or unverified.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `staff_id` - Restrict to one staff member
/// * `hospital_id` - Restrict to one hospital's staff
/// * `verified` - The new flag value
///
/// # Returns
///
/// The number of staff rows changed.
///
/// # Errors
///
/// Returns an error if the database update fails.
pub fn set_staff_verification(
    conn: &mut SqliteConnection,
    staff_id: Option<i64>,
    hospital_id: Option<i64>,
    verified: bool,
) -> Result<usize, PersistenceError> {
    let flag: i32 = i32::from(verified);
    let rows_affected: usize = match (staff_id, hospital_id) {
        (Some(id), Some(hospital)) => diesel::update(staff::table)
            .filter(staff::staff_id.eq(id))
            .filter(staff::hospital_id.eq(hospital))
            .filter(staff::is_verified.ne(flag))
            .set(staff::is_verified.eq(flag))
            .execute(conn)?,
        (Some(id), None) => diesel::update(staff::table)
            .filter(staff::staff_id.eq(id))
            .filter(staff::is_verified.ne(flag))
            .set(staff::is_verified.eq(flag))
            .execute(conn)?,
        (None, Some(hospital)) => diesel::update(staff::table)
            .filter(staff::hospital_id.eq(hospital))
            .filter(staff::is_verified.ne(flag))
            .set(staff::is_verified.eq(flag))
            .execute(conn)?,
        (None, None) => diesel::update(staff::table)
            .filter(staff::is_verified.ne(flag))
            .set(staff::is_verified.eq(flag))
            .execute(conn)?,
    };

    info!(rows_affected, verified, "Updated staff verification");
    Ok(rows_affected)
}

/// Creates a new session for an account.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `session_token` - The unique session token
/// * `account_id` - The account ID
/// * `now` - The creation time
/// * `expires_at` - The expiration time
///
/// # Errors
///
/// Returns an error if the session cannot be created.
pub fn create_session(
    conn: &mut SqliteConnection,
    session_token: &str,
    account_id: i64,
    now: OffsetDateTime,
    expires_at: OffsetDateTime,
) -> Result<i64, PersistenceError> {
    let created: String = timestamp_text(now)?;
    let expires: String = timestamp_text(expires_at)?;
    debug!(
        "Creating session for account ID: {} with expiration: {}",
        account_id, expires
    );

    diesel::insert_into(sessions::table)
        .values((
            sessions::session_token.eq(session_token),
            sessions::account_id.eq(account_id),
            sessions::created_at.eq(&created),
            sessions::last_activity_at.eq(&created),
            sessions::expires_at.eq(&expires),
        ))
        .execute(conn)?;

    let session_id: i64 = get_last_insert_rowid(conn)?;

    debug!(session_id, account_id, "Session created");
    Ok(session_id)
}

/// Updates the last activity timestamp for a session.
///
/// # Errors
///
/// Returns an error if the database update fails.
pub fn update_session_activity(
    conn: &mut SqliteConnection,
    session_id: i64,
    now: OffsetDateTime,
) -> Result<(), PersistenceError> {
    debug!("Updating last_activity_at for session ID: {}", session_id);

    diesel::update(sessions::table)
        .filter(sessions::session_id.eq(session_id))
        .set(sessions::last_activity_at.eq(timestamp_text(now)?))
        .execute(conn)?;

    Ok(())
}

/// Deletes a session by token.
///
/// This is used for logout operations.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_session(
    conn: &mut SqliteConnection,
    session_token: &str,
) -> Result<usize, PersistenceError> {
    debug!("Deleting session by token");

    Ok(diesel::delete(sessions::table)
        .filter(sessions::session_token.eq(session_token))
        .execute(conn)?)
}

/// Deletes all sessions that expired before `now`.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_expired_sessions(
    conn: &mut SqliteConnection,
    now: OffsetDateTime,
) -> Result<usize, PersistenceError> {
    debug!("Deleting expired sessions");

    let rows_affected: usize = diesel::delete(sessions::table)
        .filter(sessions::expires_at.le(timestamp_text(now)?))
        .execute(conn)?;

    info!("Deleted {} expired sessions", rows_affected);
    Ok(rows_affected)
}

/// Deletes sessions whose account no longer exists.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_orphaned_sessions(conn: &mut SqliteConnection) -> Result<usize, PersistenceError> {
    let rows_affected: usize = diesel::delete(sessions::table)
        .filter(diesel::dsl::not(diesel::dsl::exists(
            accounts::table.filter(accounts::account_id.eq(sessions::account_id)),
        )))
        .execute(conn)?;

    info!("Deleted {} orphaned sessions", rows_affected);
    Ok(rows_affected)
}

/// Deletes an account.
///
/// Donor and staff profiles cascade with the account.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_account(
    conn: &mut SqliteConnection,
    account_id: i64,
) -> Result<usize, PersistenceError> {
    info!(account_id, "Deleting account");

    Ok(diesel::delete(accounts::table)
        .filter(accounts::account_id.eq(account_id))
        .execute(conn)?)
}
