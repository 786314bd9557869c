/*
 * Copyright 2025 Vijaykumar Singh
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Mapping of domain errors onto HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::requests::ErrorEnvelope;
use crate::core::{ErrorKind, IndexError};

/// Error returned by every handler
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError(pub IndexError);

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        self.0.kind()
    }

    pub fn status(&self) -> StatusCode {
        status_for(self.kind())
    }
}

impl From<IndexError> for ApiError {
    fn from(err: IndexError) -> Self {
        Self(err)
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::BadRequest
        | ErrorKind::DimensionMismatch
        | ErrorKind::DuplicateId
        | ErrorKind::LengthMismatch
        | ErrorKind::InvalidEmbedding => StatusCode::BAD_REQUEST,
        ErrorKind::UnknownTenant => StatusCode::NOT_FOUND,
        ErrorKind::CapacityExceeded => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorKind::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorEnvelope::from(&self.0))).into_response()
    }
}
