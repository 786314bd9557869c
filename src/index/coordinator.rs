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

//! Index Coordinator - build / search / drop over per-user stores
//!
//! ## Atomicity
//! A build constructs its store off to the side and only then swaps it into
//! the tenant slot under the slot's writer lock. A failed or cancelled build
//! leaves the previously bound store untouched, and a search observes either
//! the whole old store or the whole new one.
//!
//! ## Scheduling
//! Construction and scans are CPU bound and run on the blocking pool. Each
//! tenant bounds its in-flight scans with a semaphore; extra searches queue
//! until a permit frees up or their deadline passes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use super::deadline::Deadline;
use super::flat::{VectorStore, SCAN_BATCH_ROWS};
use super::registry::{InMemoryTenantRegistry, TenantRegistry};
use crate::compute::first_non_finite;
use crate::core::{Embedding, ImageId, IndexConfig, IndexError, IndexResult, TenantId};
use crate::monitoring::ActivityTracker;

/// Result count used when a search does not specify `n`
pub const DEFAULT_RESULT_COUNT: usize = 100;

/// L2 distance threshold used when a search does not specify one
pub const DEFAULT_THRESHOLD: f32 = 27.0;

/// Search tuning parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    /// Maximum number of results
    pub n: usize,
    /// Maximum L2 (not squared) distance of a returned result
    pub threshold: f32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            n: DEFAULT_RESULT_COUNT,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl SearchParams {
    pub fn new(n: usize, threshold: f32) -> Self {
        Self { n, threshold }
    }

    fn squared_threshold(&self) -> IndexResult<f32> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(IndexError::BadRequest(format!(
                "threshold must be a finite non-negative number, got {}",
                self.threshold
            )));
        }
        Ok(self.threshold * self.threshold)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildOutcome {
    pub size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DropOutcome {
    pub removed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantSummary {
    pub user_id: TenantId,
    pub size: usize,
    pub builds: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub tenants: usize,
    pub total_vectors: usize,
    pub embedding_dim: usize,
    pub last_request_ts: Option<DateTime<Utc>>,
}

/// Public verbs of the similarity service
pub struct IndexCoordinator {
    config: IndexConfig,
    registry: Arc<dyn TenantRegistry>,
    activity: ActivityTracker,
}

impl IndexCoordinator {
    pub fn new(config: IndexConfig, registry: Arc<dyn TenantRegistry>) -> Self {
        Self {
            config,
            registry,
            activity: ActivityTracker::new(),
        }
    }

    /// Coordinator over a fresh process-local registry
    pub fn in_memory(config: IndexConfig) -> Self {
        let registry = InMemoryTenantRegistry::new(config.embedding_dim, config.max_concurrent_searches);
        Self::new(config, Arc::new(registry))
    }

    pub fn registry(&self) -> &Arc<dyn TenantRegistry> {
        &self.registry
    }

    /// Record an incoming request for `/health`
    pub fn touch(&self) {
        self.activity.touch();
    }

    /// Validate a build request and populate a new store from it.
    ///
    /// Runs without any lock held; nothing is published.
    pub fn construct_store(
        config: &IndexConfig,
        image_hashes: Vec<ImageId>,
        image_embeddings: Vec<Embedding>,
        deadline: &Deadline,
    ) -> IndexResult<VectorStore> {
        if image_hashes.len() != image_embeddings.len() {
            return Err(IndexError::LengthMismatch {
                ids: image_hashes.len(),
                vectors: image_embeddings.len(),
            });
        }
        if image_hashes.len() > config.max_tenant_size {
            return Err(IndexError::CapacityExceeded {
                requested: image_hashes.len(),
                limit: config.max_tenant_size,
            });
        }

        let mut store = VectorStore::with_capacity(config.embedding_dim, image_hashes.len());
        for (row, (id, embedding)) in image_hashes.into_iter().zip(image_embeddings).enumerate() {
            if row % SCAN_BATCH_ROWS == 0 {
                deadline.check("index build")?;
            }
            if embedding.len() == config.embedding_dim {
                if let Some(component) = first_non_finite(&embedding) {
                    return Err(IndexError::InvalidEmbedding(format!(
                        "embedding for {id} has a non-finite component at position {component}"
                    )));
                }
            }
            store.add(id, &embedding)?;
        }
        Ok(store)
    }

    /// Replace the tenant's store with one built from the given rows
    pub async fn build(
        &self,
        user_id: &TenantId,
        image_hashes: Vec<ImageId>,
        image_embeddings: Vec<Embedding>,
        deadline: Deadline,
    ) -> IndexResult<BuildOutcome> {
        deadline.check("index build")?;

        let rows = image_hashes.len();
        info!(
            user_id = %user_id,
            rows,
            "building index for user - got {} photos to process",
            rows
        );
        let started = Instant::now();

        let config = self.config;
        let store = tokio::task::spawn_blocking(move || {
            Self::construct_store(&config, image_hashes, image_embeddings, &deadline)
        })
        .await
        .map_err(|e| IndexError::Internal(format!("index build task failed: {e}")))??;

        // Last chance to abandon the build; the prior store stays bound.
        deadline.check("index swap")?;

        let size = store.size();
        let slot = self.registry.get_or_create(user_id);
        let previous = slot.replace(store);

        info!(
            user_id = %user_id,
            size,
            previous_size = previous.size(),
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "finished building index for user"
        );
        Ok(BuildOutcome { size })
    }

    /// Image ids of the nearest stored embeddings within `params.threshold`,
    /// nearest first.
    pub async fn search(
        &self,
        user_id: &TenantId,
        query: Embedding,
        params: SearchParams,
        deadline: Deadline,
    ) -> IndexResult<Vec<ImageId>> {
        deadline.check("search")?;

        let slot = self.registry.get(user_id)?;

        if query.len() != self.config.embedding_dim {
            return Err(IndexError::DimensionMismatch {
                expected: self.config.embedding_dim,
                actual: query.len(),
            });
        }
        if let Some(component) = first_non_finite(&query) {
            return Err(IndexError::InvalidEmbedding(format!(
                "query has a non-finite component at position {component}"
            )));
        }
        let squared_threshold = params.squared_threshold()?;
        if params.n == 0 {
            return Ok(Vec::new());
        }

        let permits = slot.search_permits();
        let permit = match deadline.remaining() {
            Some(remaining) => tokio::time::timeout(remaining, permits.acquire_owned())
                .await
                .map_err(|_| IndexError::DeadlineExceeded("search queue"))?,
            None => permits.acquire_owned().await,
        }
        .map_err(|e| IndexError::Internal(format!("search permits closed: {e}")))?;

        deadline.check("search")?;
        let store = slot.snapshot();

        let started = Instant::now();
        let ids = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let hits = store.search_with_deadline(&query, params.n, &deadline)?;
            hits.into_iter()
                .filter(|hit| hit.distance <= squared_threshold)
                .map(|hit| store.id_of(hit.row).map(str::to_owned))
                .collect::<IndexResult<Vec<ImageId>>>()
        })
        .await
        .map_err(|e| IndexError::Internal(format!("search task failed: {e}")))??;

        info!(
            user_id = %user_id,
            n = params.n,
            results = ids.len(),
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "searched for similar images"
        );
        Ok(ids)
    }

    /// Forget a tenant. Dropping an unknown tenant is not an error.
    pub fn drop_tenant(&self, user_id: &TenantId) -> DropOutcome {
        let removed = self.registry.remove(user_id);
        if removed {
            info!(user_id = %user_id, "dropped tenant index");
        }
        DropOutcome { removed }
    }

    pub fn tenants(&self) -> Vec<TenantSummary> {
        self.registry
            .list()
            .into_iter()
            // A tenant dropped between list and get is skipped.
            .filter_map(|user_id| self.registry.get(&user_id).ok())
            .map(|slot| TenantSummary {
                user_id: slot.user_id().clone(),
                size: slot.size(),
                builds: slot.generation(),
                created_at: slot.created_at(),
            })
            .collect()
    }

    pub fn health(&self) -> HealthReport {
        let tenants = self.tenants();
        HealthReport {
            tenants: tenants.len(),
            total_vectors: tenants.iter().map(|t| t.size).sum(),
            embedding_dim: self.config.embedding_dim,
            last_request_ts: self.activity.last_request(),
        }
    }
}
