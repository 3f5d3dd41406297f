// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Donation certificate serials and payloads.

use crate::artifact::{ArtifactKind, ArtifactPayload};
use crate::blood_type::BloodType;
use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{Date, Month};

/// Prefix of every certificate serial.
pub const SERIAL_PREFIX: &str = "GP";

/// A certificate serial of the form `GP-YYYYMMDD-XXXXXXXX`.
///
/// The date is the confirmation date. The suffix is eight random upper-case
/// hex digits supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CertificateSerial(String);

impl CertificateSerial {
    /// Composes a serial from the confirmation date and a random value.
    #[must_use]
    pub fn compose(date: Date, random: u32) -> Self {
        Self(format!(
            "{SERIAL_PREFIX}-{:04}{:02}{:02}-{random:08X}",
            date.year(),
            u8::from(date.month()),
            date.day()
        ))
    }

    /// Parses and validates a serial.
    ///
    /// Lower-case input is accepted and normalised.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCertificateSerial` if the text does not
    /// have the expected shape or the date part is not a calendar date.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let normalised: String = value.trim().to_ascii_uppercase();
        let invalid = || DomainError::InvalidCertificateSerial(value.to_string());

        let mut parts = normalised.split('-');
        let (Some(prefix), Some(date), Some(suffix), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        if prefix != SERIAL_PREFIX
            || date.len() != 8
            || !date.bytes().all(|b| b.is_ascii_digit())
            || suffix.len() != 8
            || !suffix.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(invalid());
        }

        let year: i32 = date[0..4].parse().map_err(|_| invalid())?;
        let month: u8 = date[4..6].parse().map_err(|_| invalid())?;
        let day: u8 = date[6..8].parse().map_err(|_| invalid())?;
        let month: Month = Month::try_from(month).map_err(|_| invalid())?;
        Date::from_calendar_date(year, month, day).map_err(|_| invalid())?;

        Ok(Self(normalised))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CertificateSerial {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CertificateSerial {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CertificateSerial> for String {
    fn from(value: CertificateSerial) -> Self {
        value.0
    }
}

impl std::fmt::Display for CertificateSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returns the public verification URL for a serial.
#[must_use]
pub fn verification_url(public_base_url: &str, serial: &CertificateSerial) -> String {
    format!(
        "{}/certificates/verify/{serial}",
        public_base_url.trim_end_matches('/')
    )
}

/// The content of a donation certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificatePayload {
    pub serial: CertificateSerial,
    pub donor_name: String,
    pub blood_type: BloodType,
    pub hospital_name: String,
    pub donation_date: Date,
    pub units: i32,
    pub verification_url: String,
}

impl CertificatePayload {
    /// Converts the payload into renderer input.
    #[must_use]
    pub fn to_artifact_payload(&self) -> ArtifactPayload {
        ArtifactPayload::new(ArtifactKind::Certificate, self.serial.as_str())
            .with("serial", &self.serial)
            .with("donor_name", &self.donor_name)
            .with("blood_type", self.blood_type)
            .with("hospital_name", &self.hospital_name)
            .with("donation_date", self.donation_date)
            .with("units", self.units)
            .with("verification_url", &self.verification_url)
    }
}
