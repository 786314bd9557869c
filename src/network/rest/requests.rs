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

//! Request and response bodies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Embedding, ErrorKind, ImageId, IndexError, TenantId};
use crate::index::{HealthReport, TenantSummary};

/// `POST /build`
#[derive(Debug, Clone, Deserialize)]
pub struct BuildRequest {
    pub user_id: TenantId,
    pub image_hashes: Vec<ImageId>,
    pub image_embeddings: Vec<Embedding>,
}

/// `POST /search`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub user_id: TenantId,
    pub image_embedding: Embedding,
    #[serde(default)]
    pub n: Option<u64>,
    #[serde(default)]
    pub threshold: Option<f32>,
}

/// `POST /drop`
#[derive(Debug, Clone, Deserialize)]
pub struct DropRequest {
    pub user_id: TenantId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildResponse {
    pub ok: bool,
    pub size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResponse {
    pub ok: bool,
    pub result: Vec<ImageId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DropResponse {
    pub ok: bool,
    pub removed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub ok: bool,
    pub tenants: usize,
    pub total_vectors: usize,
    pub embedding_dim: usize,
    pub last_request_ts: Option<DateTime<Utc>>,
}

impl From<HealthReport> for HealthResponse {
    fn from(report: HealthReport) -> Self {
        Self {
            ok: true,
            tenants: report.tenants,
            total_vectors: report.total_vectors,
            embedding_dim: report.embedding_dim,
            last_request_ts: report.last_request_ts,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TenantEntry {
    pub user_id: String,
    pub size: usize,
    pub builds: u64,
    pub created_at: DateTime<Utc>,
}

impl From<TenantSummary> for TenantEntry {
    fn from(summary: TenantSummary) -> Self {
        Self {
            user_id: summary.user_id.to_string(),
            size: summary.size,
            builds: summary.builds,
            created_at: summary.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TenantsResponse {
    pub ok: bool,
    pub tenants: Vec<TenantEntry>,
}

/// Body of every non-2xx response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub ok: bool,
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
}

/// Message shown to callers in place of internal error details
pub const INTERNAL_ERROR_MESSAGE: &str = "internal error";

impl From<&IndexError> for ErrorEnvelope {
    fn from(err: &IndexError) -> Self {
        let kind = err.kind();
        let message = match kind {
            ErrorKind::Internal => INTERNAL_ERROR_MESSAGE.to_string(),
            _ => err.to_string(),
        };
        Self {
            ok: false,
            error: ErrorBody {
                kind,
                message,
                retryable: kind.is_retryable(),
            },
        }
    }
}
