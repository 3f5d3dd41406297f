// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Blood groups and donation compatibility.
//!
//! A blood type is an ABO group plus an Rh factor. Both halves must permit
//! the donation for a donor to be compatible with a request.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// ABO blood group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AboGroup {
    O,
    A,
    B,
    #[serde(rename = "AB")]
    Ab,
}

impl AboGroup {
    /// All ABO groups in display order.
    pub const ALL: [Self; 4] = [Self::O, Self::A, Self::B, Self::Ab];

    /// Returns the string representation of the group.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::O => "O",
            Self::A => "A",
            Self::B => "B",
            Self::Ab => "AB",
        }
    }

    /// Returns true if red cells of this group can be given to `recipient`.
    #[must_use]
    pub const fn can_donate_to(self, recipient: Self) -> bool {
        match self {
            Self::O => true,
            Self::A => matches!(recipient, Self::A | Self::Ab),
            Self::B => matches!(recipient, Self::B | Self::Ab),
            Self::Ab => matches!(recipient, Self::Ab),
        }
    }
}

impl FromStr for AboGroup {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "O" => Ok(Self::O),
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "AB" => Ok(Self::Ab),
            _ => Err(DomainError::InvalidBloodType(s.to_string())),
        }
    }
}

impl std::fmt::Display for AboGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rh factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhFactor {
    #[serde(rename = "+")]
    Positive,
    #[serde(rename = "-")]
    Negative,
}

impl RhFactor {
    /// Both Rh factors.
    pub const ALL: [Self; 2] = [Self::Positive, Self::Negative];

    /// Returns the string representation of the factor (`+` or `-`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "+",
            Self::Negative => "-",
        }
    }

    /// Rh negative blood may go to anyone; Rh positive only to Rh positive.
    #[must_use]
    pub const fn can_donate_to(self, recipient: Self) -> bool {
        match self {
            Self::Negative => true,
            Self::Positive => matches!(recipient, Self::Positive),
        }
    }
}

impl FromStr for RhFactor {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "+" | "pos" | "positive" => Ok(Self::Positive),
            "-" | "neg" | "negative" => Ok(Self::Negative),
            _ => Err(DomainError::InvalidBloodType(s.to_string())),
        }
    }
}

impl std::fmt::Display for RhFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A full blood type such as `O-` or `AB+`.
///
/// Values can only be built from valid parts, so compatibility checks are
/// total. Parsing text is the fallible step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BloodType {
    abo: AboGroup,
    rh: RhFactor,
}

impl BloodType {
    /// All eight blood types.
    pub const ALL: [Self; 8] = [
        Self::new(AboGroup::O, RhFactor::Negative),
        Self::new(AboGroup::O, RhFactor::Positive),
        Self::new(AboGroup::A, RhFactor::Negative),
        Self::new(AboGroup::A, RhFactor::Positive),
        Self::new(AboGroup::B, RhFactor::Negative),
        Self::new(AboGroup::B, RhFactor::Positive),
        Self::new(AboGroup::Ab, RhFactor::Negative),
        Self::new(AboGroup::Ab, RhFactor::Positive),
    ];

    /// Creates a blood type from its parts.
    #[must_use]
    pub const fn new(abo: AboGroup, rh: RhFactor) -> Self {
        Self { abo, rh }
    }

    /// Parses separately stored ABO and Rh columns.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidBloodType` if either part is unknown.
    pub fn from_parts(abo: &str, rh: &str) -> Result<Self, DomainError> {
        let abo: AboGroup = abo
            .parse()
            .map_err(|_| DomainError::InvalidBloodType(format!("{abo}{rh}")))?;
        let rh: RhFactor = rh
            .parse()
            .map_err(|_| DomainError::InvalidBloodType(format!("{abo}{rh}")))?;
        Ok(Self::new(abo, rh))
    }

    /// Returns the ABO group.
    #[must_use]
    pub const fn abo(&self) -> AboGroup {
        self.abo
    }

    /// Returns the Rh factor.
    #[must_use]
    pub const fn rh(&self) -> RhFactor {
        self.rh
    }
}

impl FromStr for BloodType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed: &str = s.trim();
        let split_at: usize = trimmed
            .find(['+', '-'])
            .ok_or_else(|| DomainError::InvalidBloodType(s.to_string()))?;
        let (abo, rh) = trimmed.split_at(split_at);
        if abo.is_empty() || rh.len() != 1 {
            return Err(DomainError::InvalidBloodType(s.to_string()));
        }
        Self::from_parts(abo, rh).map_err(|_| DomainError::InvalidBloodType(s.to_string()))
    }
}

impl TryFrom<String> for BloodType {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BloodType> for String {
    fn from(value: BloodType) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for BloodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.abo.as_str(), self.rh.as_str())
    }
}

/// Returns true if a donor of `donor` blood can give to a request for `requested`.
///
/// Both the ABO rule and the Rh rule must hold.
#[must_use]
pub const fn is_compatible(donor: BloodType, requested: BloodType) -> bool {
    donor.abo.can_donate_to(requested.abo) && donor.rh.can_donate_to(requested.rh)
}

/// Checks compatibility, returning an eligibility error when it fails.
///
/// # Errors
///
/// Returns `DomainError::IncompatibleBloodType` if the donor cannot give to
/// the requested type.
pub const fn ensure_compatible(donor: BloodType, requested: BloodType) -> Result<(), DomainError> {
    if is_compatible(donor, requested) {
        Ok(())
    } else {
        Err(DomainError::IncompatibleBloodType { donor, requested })
    }
}
