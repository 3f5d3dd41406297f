// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Appointment, donation and certificate queries.
//!
//! These back the public certificate lookup and the artifact repair
//! commands, which scan for rows whose rendered artifact is missing.

use diesel::SqliteConnection;
use diesel::prelude::*;
use give_pulse::State;
use give_pulse_domain::{Appointment, CertificateSerial, Donation};

use crate::data_models::{CertificateRecord, CertificateSource};
use crate::diesel_schema::{donation_appointments, donations};
use crate::error::PersistenceError;
use crate::queries::matches::load_scope_for_match;
use crate::queries::rows::{AppointmentRow, DonationRow};

/// Retrieves an appointment by ID.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is malformed.
/// Returns `Ok(None)` if the appointment is not found.
pub fn get_appointment(
    conn: &mut SqliteConnection,
    appointment_id: i64,
) -> Result<Option<Appointment>, PersistenceError> {
    donation_appointments::table
        .filter(donation_appointments::appointment_id.eq(appointment_id))
        .select(AppointmentRow::as_select())
        .first::<AppointmentRow>(conn)
        .optional()?
        .map(AppointmentRow::into_domain)
        .transpose()
}

/// Retrieves a donation by ID.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is malformed.
/// Returns `Ok(None)` if the donation is not found.
pub fn get_donation(
    conn: &mut SqliteConnection,
    donation_id: i64,
) -> Result<Option<Donation>, PersistenceError> {
    donations::table
        .filter(donations::donation_id.eq(donation_id))
        .select(DonationRow::as_select())
        .first::<DonationRow>(conn)
        .optional()?
        .map(DonationRow::into_domain)
        .transpose()
}

/// Looks up a certificate by serial for public verification.
///
/// # Errors
///
/// Returns an error if a query fails or a stored row is malformed.
/// Returns `Ok(None)` if no donation carries the serial.
pub fn find_certificate(
    conn: &mut SqliteConnection,
    serial: &CertificateSerial,
) -> Result<Option<CertificateRecord>, PersistenceError> {
    let Some(row) = donations::table
        .filter(donations::certificate_serial.eq(serial.as_str()))
        .select(DonationRow::as_select())
        .first::<DonationRow>(conn)
        .optional()?
    else {
        return Ok(None);
    };

    let donation: Donation = row.into_domain()?;
    let scope: State = load_scope_for_match(conn, donation.match_id)?;

    Ok(Some(CertificateRecord {
        serial: donation.certificate_serial,
        donor_display_name: scope.donor.display_name(),
        blood_type: scope.donor.blood_type,
        hospital_name: scope.hospital.name,
        donation_date: donation.confirmed_at.date(),
        units: donation.units,
    }))
}

/// Lists appointments whose QR code should be rendered.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `appointment_id` - Restrict to one appointment
/// * `force` - Include appointments that already have an artifact
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn appointments_needing_qr(
    conn: &mut SqliteConnection,
    appointment_id: Option<i64>,
    force: bool,
) -> Result<Vec<Appointment>, PersistenceError> {
    let mut query = donation_appointments::table
        .select(AppointmentRow::as_select())
        .order(donation_appointments::appointment_id.asc())
        .into_boxed();
    if let Some(id) = appointment_id {
        query = query.filter(donation_appointments::appointment_id.eq(id));
    }
    if !force {
        query = query.filter(
            donation_appointments::qr_artifact
                .is_null()
                .or(donation_appointments::qr_artifact.eq("")),
        );
    }

    let rows: Vec<AppointmentRow> = query.load(conn)?;
    rows.into_iter().map(AppointmentRow::into_domain).collect()
}

/// Lists donations whose certificate should be rendered, with the facts
/// the certificate shows.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `donation_id` - Restrict to one donation
/// * `force` - Include donations that already have an artifact
///
/// # Errors
///
/// Returns an error if a query fails or a stored row is malformed.
pub fn donations_needing_certificate(
    conn: &mut SqliteConnection,
    donation_id: Option<i64>,
    force: bool,
) -> Result<Vec<CertificateSource>, PersistenceError> {
    let mut query = donations::table
        .select(DonationRow::as_select())
        .order(donations::donation_id.asc())
        .into_boxed();
    if let Some(id) = donation_id {
        query = query.filter(donations::donation_id.eq(id));
    }
    if !force {
        query = query.filter(
            donations::certificate_artifact
                .is_null()
                .or(donations::certificate_artifact.eq("")),
        );
    }

    let rows: Vec<DonationRow> = query.load(conn)?;
    let mut sources: Vec<CertificateSource> = Vec::with_capacity(rows.len());
    for row in rows {
        let donation: Donation = row.into_domain()?;
        let scope: State = load_scope_for_match(conn, donation.match_id)?;
        sources.push(CertificateSource {
            donation_id: donation.donation_id.unwrap_or_default(),
            serial: donation.certificate_serial,
            donor_name: scope.donor.full_name(),
            blood_type: scope.donor.blood_type,
            hospital_name: scope.hospital.name,
            confirmed_at: donation.confirmed_at,
            units: donation.units,
            certificate_artifact: donation.certificate_artifact,
        });
    }
    Ok(sources)
}
