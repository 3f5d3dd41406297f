// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Request fulfillment tracking.
//!
//! Donated units are added to a request and its status is derived from the
//! counts. A request never moves back from `fulfilled`.

use crate::error::DomainError;
use crate::request::RequestStatus;
use serde::{Deserialize, Serialize};

/// The result of recording donated units against a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentOutcome {
    /// Units fulfilled after the donation, capped at the requested amount.
    pub units_fulfilled: i32,
    /// Status after the donation.
    pub status: RequestStatus,
    /// Status before the donation.
    pub previous_status: RequestStatus,
}

impl FulfillmentOutcome {
    /// Returns true if the donation changed the request status.
    #[must_use]
    pub fn status_changed(&self) -> bool {
        self.status != self.previous_status
    }
}

/// Derives a request status from its unit counts.
///
/// `fulfilled` wins once the requested units are reached. Otherwise the
/// request is `partial` once any unit is donated. With no units the current
/// status is kept, and `fulfilled` is never left.
#[must_use]
pub const fn classify(
    current: RequestStatus,
    units_fulfilled: i32,
    units_requested: i32,
) -> RequestStatus {
    if units_fulfilled >= units_requested {
        return RequestStatus::Fulfilled;
    }
    match current {
        RequestStatus::Fulfilled | RequestStatus::Expired => current,
        RequestStatus::Open | RequestStatus::Partial => {
            if units_fulfilled > 0 {
                RequestStatus::Partial
            } else {
                current
            }
        }
    }
}

/// Records `units` donated against a request.
///
/// # Arguments
///
/// * `status` - The request's current status
/// * `units_fulfilled` - Units already fulfilled
/// * `units_requested` - Units the request needs
/// * `units` - Units donated now
///
/// # Errors
///
/// Returns `DomainError::InvalidUnits` if `units` is not positive.
pub fn record_donation(
    status: RequestStatus,
    units_fulfilled: i32,
    units_requested: i32,
    units: i32,
) -> Result<FulfillmentOutcome, DomainError> {
    if units < 1 {
        return Err(DomainError::InvalidUnits(format!(
            "a donation must be at least one unit, got {units}"
        )));
    }

    let total: i32 = units_fulfilled.saturating_add(units).min(units_requested);
    let total: i32 = total.max(units_fulfilled);

    Ok(FulfillmentOutcome {
        units_fulfilled: total,
        status: classify(status, total, units_requested),
        previous_status: status,
    })
}
