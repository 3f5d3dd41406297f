// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Match queries and transition scope loading.
//!
//! A transition scope is everything `give_pulse::apply` needs for one
//! (request, donor) pair: the request, its hospital, the donor, and the
//! match with its appointment and donation when they exist.

use diesel::SqliteConnection;
use diesel::prelude::*;
use give_pulse::State;
use give_pulse_domain::{Appointment, BloodRequest, BloodType, Donation, Donor, Hospital, Match};
use std::collections::HashSet;

use crate::data_models::MatchSummary;
use crate::diesel_schema::{accounts, donation_appointments, donations, donors, matches};
use crate::error::PersistenceError;
use crate::queries::accounts::get_donor;
use crate::queries::hospitals::get_hospital;
use crate::queries::requests::get_request;
use crate::queries::rows::{AccountRow, AppointmentRow, DonationRow, DonorRow, MatchRow};

/// Retrieves a match by ID.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is malformed.
/// Returns `Ok(None)` if the match is not found.
pub fn get_match(
    conn: &mut SqliteConnection,
    match_id: i64,
) -> Result<Option<Match>, PersistenceError> {
    matches::table
        .filter(matches::match_id.eq(match_id))
        .select(MatchRow::as_select())
        .first::<MatchRow>(conn)
        .optional()?
        .map(MatchRow::into_domain)
        .transpose()
}

/// Finds the match for a (request, donor) pair.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is malformed.
pub fn find_match(
    conn: &mut SqliteConnection,
    request_id: i64,
    donor_id: i64,
) -> Result<Option<Match>, PersistenceError> {
    matches::table
        .filter(matches::request_id.eq(request_id))
        .filter(matches::donor_id.eq(donor_id))
        .select(MatchRow::as_select())
        .first::<MatchRow>(conn)
        .optional()?
        .map(MatchRow::into_domain)
        .transpose()
}

/// Returns the IDs of every request the donor has a match for.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn matched_request_ids(
    conn: &mut SqliteConnection,
    donor_id: i64,
) -> Result<HashSet<i64>, PersistenceError> {
    let ids: Vec<i64> = matches::table
        .filter(matches::donor_id.eq(donor_id))
        .select(matches::request_id)
        .load(conn)?;
    Ok(ids.into_iter().collect())
}

/// Lists a request's matches with the responding donors, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn list_match_summaries(
    conn: &mut SqliteConnection,
    request_id: i64,
) -> Result<Vec<MatchSummary>, PersistenceError> {
    let rows: Vec<(MatchRow, DonorRow, AccountRow, Option<i64>)> = matches::table
        .inner_join(donors::table.inner_join(accounts::table))
        .left_join(donation_appointments::table)
        .filter(matches::request_id.eq(request_id))
        .order(matches::match_id.asc())
        .select((
            MatchRow::as_select(),
            DonorRow::as_select(),
            AccountRow::as_select(),
            donation_appointments::appointment_id.nullable(),
        ))
        .load(conn)?;

    rows.into_iter()
        .map(|(record, donor, account, appointment_id)| {
            let donor_blood_type: BloodType =
                BloodType::from_parts(&donor.abo_type, &donor.rh_type)?;
            Ok(MatchSummary {
                record: record.into_domain()?,
                donor_name: format!("{} {}", account.first_name, account.last_name),
                donor_blood_type,
                appointment_id,
            })
        })
        .collect()
}

/// Retrieves the appointment booked for a match.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is malformed.
pub fn get_appointment_for_match(
    conn: &mut SqliteConnection,
    match_id: i64,
) -> Result<Option<Appointment>, PersistenceError> {
    donation_appointments::table
        .filter(donation_appointments::match_id.eq(match_id))
        .select(AppointmentRow::as_select())
        .first::<AppointmentRow>(conn)
        .optional()?
        .map(AppointmentRow::into_domain)
        .transpose()
}

/// Retrieves the donation recorded for a match.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is malformed.
pub fn get_donation_for_match(
    conn: &mut SqliteConnection,
    match_id: i64,
) -> Result<Option<Donation>, PersistenceError> {
    donations::table
        .filter(donations::match_id.eq(match_id))
        .select(DonationRow::as_select())
        .first::<DonationRow>(conn)
        .optional()?
        .map(DonationRow::into_domain)
        .transpose()
}

/// Loads the transition scope for a (request, donor) pair.
///
/// The match, appointment and donation are filled in when they exist.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `request_id` - The blood request
/// * `donor_id` - The donor
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the request, its hospital or the
/// donor does not exist, or an error if a query fails.
pub fn load_scope(
    conn: &mut SqliteConnection,
    request_id: i64,
    donor_id: i64,
) -> Result<State, PersistenceError> {
    let request: BloodRequest = get_request(conn, request_id)?
        .ok_or_else(|| PersistenceError::NotFound(format!("Blood request {request_id}")))?;
    let hospital: Hospital = get_hospital(conn, request.hospital_id)?.ok_or_else(|| {
        PersistenceError::NotFound(format!("Hospital {}", request.hospital_id))
    })?;
    let donor: Donor = get_donor(conn, donor_id)?
        .ok_or_else(|| PersistenceError::NotFound(format!("Donor {donor_id}")))?;

    let mut state: State = State::new(request, hospital, donor);
    state.current_match = find_match(conn, request_id, donor_id)?;
    if let Some(match_id) = state.current_match.as_ref().and_then(|m| m.match_id) {
        state.appointment = get_appointment_for_match(conn, match_id)?;
        state.donation = get_donation_for_match(conn, match_id)?;
    }
    Ok(state)
}

/// Loads the transition scope that contains a match.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the match does not exist, or any
/// error from [`load_scope`].
pub fn load_scope_for_match(
    conn: &mut SqliteConnection,
    match_id: i64,
) -> Result<State, PersistenceError> {
    let record: Match = get_match(conn, match_id)?
        .ok_or_else(|| PersistenceError::NotFound(format!("Match {match_id}")))?;
    load_scope(conn, record.request_id, record.donor_id)
}
