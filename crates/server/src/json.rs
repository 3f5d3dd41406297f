// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! JSON body extraction for the server.
//!
//! Bodies that cannot be parsed are reported as invalid input in the
//! standard error envelope instead of axum's plain-text rejection.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use give_pulse_api::ApiError;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::HttpError;

/// Extractor for JSON request bodies.
///
/// # Errors
///
/// Rejects with HTTP 400 if the body is not JSON, is missing the JSON
/// content type, or does not deserialize into `T`.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!(error = %rejection, "Rejected request body");
                Err(body_rejection(&rejection))
            }
        }
    }
}

fn body_rejection(rejection: &JsonRejection) -> HttpError {
    HttpError::from(ApiError::InvalidInput {
        field: String::from("body"),
        message: rejection.body_text(),
    })
}
