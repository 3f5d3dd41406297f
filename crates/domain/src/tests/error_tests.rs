// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{DomainError, RequestStatus};

#[test]
fn test_duplicate_match_message_names_existing_match() {
    let err: DomainError = DomainError::DuplicateMatch {
        request_id: 4,
        donor_id: 9,
        existing_match_id: Some(12),
    };
    assert_eq!(
        err.to_string(),
        "Donor 9 already responded to request 4 (match 12)"
    );
}

#[test]
fn test_request_not_accepting_message() {
    let err: DomainError = DomainError::RequestNotAcceptingMatches {
        request_id: 4,
        status: RequestStatus::Fulfilled,
    };
    assert_eq!(
        err.to_string(),
        "Blood request 4 is fulfilled and no longer accepts donors"
    );
}

#[test]
fn test_domain_error_is_std_error() {
    let err: Box<dyn std::error::Error> = Box::new(DomainError::InvalidUnits(String::from("x")));
    assert_eq!(err.to_string(), "Invalid units: x");
}
