// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Donor cooldown policy.
//!
//! A donor rests for a fixed period after a match is accepted. The rest is
//! checked live against the current time; nothing resets it.

use crate::error::DomainError;
use time::{Duration, OffsetDateTime};

/// Days a donor rests after a match is accepted.
pub const DEFAULT_COOLDOWN_DAYS: i64 = 56;

/// Returns true if `cooldown_until` is set and still in the future.
#[must_use]
pub fn is_in_cooldown(cooldown_until: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
    cooldown_until.is_some_and(|until| now < until)
}

/// Computes the end of the rest period starting at `now`.
///
/// # Arguments
///
/// * `now` - The acceptance time
/// * `duration_days` - Length of the rest period in days
///
/// # Errors
///
/// Returns `DomainError::DateArithmeticOverflow` if the result is out of range.
pub fn apply_cooldown(
    now: OffsetDateTime,
    duration_days: i64,
) -> Result<OffsetDateTime, DomainError> {
    now.checked_add(Duration::days(duration_days))
        .ok_or_else(|| DomainError::DateArithmeticOverflow {
            operation: format!("adding {duration_days} cooldown days"),
        })
}

/// Fails with an eligibility error if the donor is still resting.
///
/// # Errors
///
/// Returns `DomainError::DonorInCooldown` carrying the end of the rest period.
pub fn ensure_not_in_cooldown(
    cooldown_until: Option<OffsetDateTime>,
    now: OffsetDateTime,
) -> Result<(), DomainError> {
    match cooldown_until {
        Some(until) if now < until => Err(DomainError::DonorInCooldown { until }),
        _ => Ok(()),
    }
}
