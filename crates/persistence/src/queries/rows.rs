// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Diesel row structs and their conversion into domain values.
//!
//! Rows mirror the stored columns exactly. Conversion is fallible because
//! stored text (blood types, statuses, timestamps) is parsed back through
//! the domain constructors.

use diesel::prelude::*;
use give_pulse_domain::{
    AccountKind, Appointment, AppointmentWindow, BloodRequest, BloodType, CertificateSerial,
    Donation, Donor, Hospital, Match, MatchStatus, QrPayload, RequestStatus, Staff,
};
use std::str::FromStr;

use crate::backend::sqlite::{optional_stored_timestamp, stored_timestamp};
use crate::data_models::{AccountData, SessionData};
use crate::diesel_schema::{
    accounts, blood_requests, donation_appointments, donations, donors, hospitals, matches,
    sessions, staff,
};
use crate::error::PersistenceError;

#[derive(Queryable, Selectable)]
#[diesel(table_name = hospitals)]
pub struct HospitalRow {
    pub hospital_id: i64,
    pub name: String,
    pub city: String,
    pub district: String,
    pub is_verified: i32,
}

impl HospitalRow {
    pub fn into_domain(self) -> Hospital {
        Hospital {
            hospital_id: Some(self.hospital_id),
            name: self.name,
            city: self.city,
            district: self.district,
            is_verified: self.is_verified != 0,
        }
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = accounts)]
pub struct AccountRow {
    pub account_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: String,
    pub created_at: String,
    pub updated_at: String,
}

impl AccountRow {
    pub fn into_data(self) -> Result<AccountData, PersistenceError> {
        Ok(AccountData {
            account_id: self.account_id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            password_hash: self.password_hash,
            role: AccountKind::from_str(&self.role)?,
            created_at: stored_timestamp(&self.created_at)?,
            updated_at: stored_timestamp(&self.updated_at)?,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = sessions)]
pub struct SessionRow {
    pub session_id: i64,
    pub session_token: String,
    pub account_id: i64,
    pub created_at: String,
    pub last_activity_at: String,
    pub expires_at: String,
}

impl SessionRow {
    pub fn into_data(self) -> Result<SessionData, PersistenceError> {
        Ok(SessionData {
            session_id: self.session_id,
            session_token: self.session_token,
            account_id: self.account_id,
            created_at: stored_timestamp(&self.created_at)?,
            last_activity_at: stored_timestamp(&self.last_activity_at)?,
            expires_at: stored_timestamp(&self.expires_at)?,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = donors)]
pub struct DonorRow {
    pub donor_id: i64,
    pub account_id: i64,
    pub abo_type: String,
    pub rh_type: String,
    pub city: String,
    pub district: String,
    pub eligibility_consent: i32,
    pub public_alias: Option<String>,
    pub cooldown_until: Option<String>,
}

impl DonorRow {
    /// Combines the donor row with the name and email held on its account.
    pub fn into_domain(self, account: &AccountRow) -> Result<Donor, PersistenceError> {
        Ok(Donor {
            donor_id: Some(self.donor_id),
            account_id: self.account_id,
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            email: account.email.clone(),
            blood_type: BloodType::from_parts(&self.abo_type, &self.rh_type)?,
            city: self.city,
            district: self.district,
            eligibility_consent: self.eligibility_consent != 0,
            public_alias: self.public_alias,
            cooldown_until: optional_stored_timestamp(self.cooldown_until.as_deref())?,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = staff)]
pub struct StaffRow {
    pub staff_id: i64,
    pub account_id: i64,
    pub hospital_id: i64,
    pub is_verified: i32,
}

impl StaffRow {
    pub fn into_domain(self, account: &AccountRow) -> Staff {
        Staff {
            staff_id: Some(self.staff_id),
            account_id: self.account_id,
            hospital_id: self.hospital_id,
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            is_verified: self.is_verified != 0,
        }
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = blood_requests)]
pub struct BloodRequestRow {
    pub request_id: i64,
    pub hospital_id: i64,
    pub created_by_staff_id: Option<i64>,
    pub abo_type: String,
    pub rh_type: String,
    pub city: String,
    pub district: String,
    pub units_requested: i32,
    pub units_fulfilled: i32,
    pub status: String,
    pub deadline_at: String,
    pub notes: String,
    pub created_at: String,
}

impl BloodRequestRow {
    pub fn into_domain(self) -> Result<BloodRequest, PersistenceError> {
        Ok(BloodRequest {
            request_id: Some(self.request_id),
            hospital_id: self.hospital_id,
            created_by_staff_id: self.created_by_staff_id,
            blood_type: BloodType::from_parts(&self.abo_type, &self.rh_type)?,
            city: self.city,
            district: self.district,
            units_requested: self.units_requested,
            units_fulfilled: self.units_fulfilled,
            status: RequestStatus::from_str(&self.status)?,
            deadline_at: stored_timestamp(&self.deadline_at)?,
            notes: self.notes,
            created_at: stored_timestamp(&self.created_at)?,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = matches)]
pub struct MatchRow {
    pub match_id: i64,
    pub request_id: i64,
    pub donor_id: i64,
    pub status: String,
    pub created_at: String,
    pub accepted_at: Option<String>,
    pub declined_at: Option<String>,
    pub checked_in_at: Option<String>,
    pub donated_at: Option<String>,
}

impl MatchRow {
    pub fn into_domain(self) -> Result<Match, PersistenceError> {
        Ok(Match {
            match_id: Some(self.match_id),
            request_id: self.request_id,
            donor_id: self.donor_id,
            status: MatchStatus::from_str(&self.status)?,
            created_at: stored_timestamp(&self.created_at)?,
            accepted_at: optional_stored_timestamp(self.accepted_at.as_deref())?,
            declined_at: optional_stored_timestamp(self.declined_at.as_deref())?,
            checked_in_at: optional_stored_timestamp(self.checked_in_at.as_deref())?,
            donated_at: optional_stored_timestamp(self.donated_at.as_deref())?,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = donation_appointments)]
pub struct AppointmentRow {
    pub appointment_id: i64,
    pub match_id: i64,
    pub window_start: String,
    pub window_end: String,
    pub qr_payload: Option<String>,
    pub qr_artifact: Option<String>,
}

impl AppointmentRow {
    pub fn into_domain(self) -> Result<Appointment, PersistenceError> {
        let window: AppointmentWindow = AppointmentWindow::new(
            stored_timestamp(&self.window_start)?,
            stored_timestamp(&self.window_end)?,
        )?;
        let qr_payload: Option<QrPayload> = self
            .qr_payload
            .as_deref()
            .map(serde_json::from_str::<QrPayload>)
            .transpose()?;

        Ok(Appointment {
            appointment_id: Some(self.appointment_id),
            match_id: self.match_id,
            window,
            qr_payload,
            qr_artifact: self.qr_artifact,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = donations)]
pub struct DonationRow {
    pub donation_id: i64,
    pub match_id: i64,
    pub units: i32,
    pub certificate_serial: String,
    pub confirmed_by_staff_id: Option<i64>,
    pub confirmed_at: String,
    pub certificate_artifact: Option<String>,
}

impl DonationRow {
    pub fn into_domain(self) -> Result<Donation, PersistenceError> {
        Ok(Donation {
            donation_id: Some(self.donation_id),
            match_id: self.match_id,
            units: self.units,
            certificate_serial: CertificateSerial::parse(&self.certificate_serial)?,
            confirmed_by_staff_id: self.confirmed_by_staff_id,
            confirmed_at: stored_timestamp(&self.confirmed_at)?,
            certificate_artifact: self.certificate_artifact,
        })
    }
}
