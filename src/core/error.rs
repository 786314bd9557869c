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

use serde::Serialize;
use thiserror::Error;

use super::types::TenantId;

/// Stable error classification reported on the wire as `error.kind`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadRequest,
    UnknownTenant,
    DimensionMismatch,
    DuplicateId,
    LengthMismatch,
    InvalidEmbedding,
    CapacityExceeded,
    DeadlineExceeded,
    NotFound,
    MethodNotAllowed,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::UnknownTenant => "unknown_tenant",
            ErrorKind::DimensionMismatch => "dimension_mismatch",
            ErrorKind::DuplicateId => "duplicate_id",
            ErrorKind::LengthMismatch => "length_mismatch",
            ErrorKind::InvalidEmbedding => "invalid_embedding",
            ErrorKind::CapacityExceeded => "capacity_exceeded",
            ErrorKind::DeadlineExceeded => "deadline_exceeded",
            ErrorKind::NotFound => "not_found",
            ErrorKind::MethodNotAllowed => "method_not_allowed",
            ErrorKind::Internal => "internal",
        }
    }

    /// Whether the same request may succeed if re-sent unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Internal | ErrorKind::DeadlineExceeded)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the vector store, tenant registry and index coordinator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unknown tenant: {0}")]
    UnknownTenant(TenantId),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Duplicate image id: {0}")]
    DuplicateId(String),

    #[error("Length mismatch: {ids} image hashes but {vectors} embeddings")]
    LengthMismatch { ids: usize, vectors: usize },

    #[error("Invalid embedding: {0}")]
    InvalidEmbedding(String),

    #[error("Row {row} out of range for store of size {size}")]
    OutOfRange { row: usize, size: usize },

    #[error("Capacity exceeded: {requested} rows exceeds the per-tenant limit of {limit}")]
    CapacityExceeded { requested: usize, limit: usize },

    #[error("Deadline exceeded during {0}")]
    DeadlineExceeded(&'static str),

    #[error("No route for {method} {path}")]
    RouteNotFound { method: String, path: String },

    #[error("Method {method} not allowed on {path}")]
    MethodNotAllowed { method: String, path: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IndexError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IndexError::BadRequest(_) => ErrorKind::BadRequest,
            IndexError::UnknownTenant(_) => ErrorKind::UnknownTenant,
            IndexError::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            IndexError::DuplicateId(_) => ErrorKind::DuplicateId,
            IndexError::LengthMismatch { .. } => ErrorKind::LengthMismatch,
            IndexError::InvalidEmbedding(_) => ErrorKind::InvalidEmbedding,
            IndexError::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            IndexError::DeadlineExceeded(_) => ErrorKind::DeadlineExceeded,
            IndexError::RouteNotFound { .. } => ErrorKind::NotFound,
            IndexError::MethodNotAllowed { .. } => ErrorKind::MethodNotAllowed,
            // A row index that does not resolve means the store and its id
            // map disagree.
            IndexError::OutOfRange { .. } | IndexError::Internal(_) => ErrorKind::Internal,
        }
    }
}

pub type IndexResult<T> = std::result::Result<T, IndexError>;

/// Startup configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse environment variable '{key}': {details}")]
    Parse { key: String, details: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
