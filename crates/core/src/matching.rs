// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use give_pulse_domain::{BloodRequest, Donor, is_compatible};
use std::collections::HashSet;
use time::OffsetDateTime;

/// The requests a donor may respond to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matchable {
    /// The donor is resting; nothing is listed.
    InCooldown {
        /// When the donor becomes eligible again.
        until: OffsetDateTime,
    },
    /// Requests the donor can respond to, soonest deadline first.
    Available(Vec<BloodRequest>),
}

/// Filters candidate requests down to those a donor may respond to.
///
/// A request is listed when it is open or partial, its deadline has not
/// passed, the donor's blood is compatible, and the donor has not already
/// responded to it. A city filter, when given, is compared case-insensitively.
///
/// # Arguments
///
/// * `donor` - The donor browsing requests
/// * `candidates` - Requests to consider
/// * `already_matched` - Request ids the donor already has a match for
/// * `city` - Optional city filter
/// * `now` - The current time
#[must_use]
pub fn matchable_requests(
    donor: &Donor,
    candidates: &[BloodRequest],
    already_matched: &HashSet<i64>,
    city: Option<&str>,
    now: OffsetDateTime,
) -> Matchable {
    if let Some(until) = donor.cooldown_until.filter(|until| now < *until) {
        return Matchable::InCooldown { until };
    }

    let city: Option<&str> = city.map(str::trim).filter(|c| !c.is_empty());

    let mut listed: Vec<BloodRequest> = candidates
        .iter()
        .filter(|r| r.is_matchable_at(now))
        .filter(|r| is_compatible(donor.blood_type, r.blood_type))
        .filter(|r| r.request_id.is_none_or(|id| !already_matched.contains(&id)))
        .filter(|r| city.is_none_or(|c| r.city.eq_ignore_ascii_case(c)))
        .cloned()
        .collect();
    listed.sort_by_key(|r| (r.deadline_at, r.request_id));

    Matchable::Available(listed)
}
