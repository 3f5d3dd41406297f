// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! RFC 3339 timestamp text, the stored and wire form of every instant.

use crate::error::DomainError;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Formats a timestamp as RFC 3339.
///
/// # Errors
///
/// Returns `DomainError::InvalidTimestamp` if the value cannot be formatted.
pub fn format_timestamp(value: OffsetDateTime) -> Result<String, DomainError> {
    value
        .format(&Rfc3339)
        .map_err(|e| DomainError::InvalidTimestamp(e.to_string()))
}

/// Parses an RFC 3339 timestamp.
///
/// # Errors
///
/// Returns `DomainError::InvalidTimestamp` if the text is not RFC 3339.
pub fn parse_timestamp(value: &str) -> Result<OffsetDateTime, DomainError> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|e| DomainError::InvalidTimestamp(format!("'{value}': {e}")))
}
