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

//! Tenant registry: one slot per user, each slot owning its own store lock
//!
//! Lock ordering: the registry map lock is always released before a slot lock
//! is taken. Callers receive an `Arc<TenantSlot>` and synchronise on the slot
//! from then on.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::flat::VectorStore;
use crate::core::{IndexError, IndexResult, TenantId};

/// Data and locks owned by a single tenant
pub struct TenantSlot {
    user_id: TenantId,
    store: RwLock<Arc<VectorStore>>,
    search_permits: Arc<Semaphore>,
    created_at: DateTime<Utc>,
    generation: AtomicU64,
}

impl TenantSlot {
    /// `max_concurrent_searches` is clamped to `1..=Semaphore::MAX_PERMITS`
    pub fn new(user_id: TenantId, dimension: usize, max_concurrent_searches: usize) -> Self {
        let permits = max_concurrent_searches.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            user_id,
            store: RwLock::new(Arc::new(VectorStore::new(dimension))),
            search_permits: Arc::new(Semaphore::new(permits)),
            created_at: Utc::now(),
            generation: AtomicU64::new(0),
        }
    }

    pub fn user_id(&self) -> &TenantId {
        &self.user_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The currently bound store.
    ///
    /// Taken under the slot's reader lock; the returned `Arc` keeps that
    /// store alive for the caller even if a build swaps it out afterwards.
    pub fn snapshot(&self) -> Arc<VectorStore> {
        Arc::clone(&*self.store.read())
    }

    /// Swap in a fully built store under the writer lock, returning the one
    /// it replaced.
    pub fn replace(&self, store: VectorStore) -> Arc<VectorStore> {
        let store = Arc::new(store);
        let mut guard = self.store.write();
        self.generation.fetch_add(1, Ordering::AcqRel);
        std::mem::replace(&mut *guard, store)
    }

    pub fn size(&self) -> usize {
        self.store.read().size()
    }

    /// Number of completed swaps since the slot was created
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn search_permits(&self) -> Arc<Semaphore> {
        Arc::clone(&self.search_permits)
    }
}

impl std::fmt::Debug for TenantSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantSlot")
            .field("user_id", &self.user_id)
            .field("size", &self.size())
            .field("generation", &self.generation())
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Owner of the per-user slots.
///
/// Constructed in `main` and handed to the coordinator so tests can
/// substitute their own implementation.
pub trait TenantRegistry: Send + Sync {
    /// Returns the slot for `user_id`, creating an empty one if absent
    fn get_or_create(&self, user_id: &TenantId) -> Arc<TenantSlot>;

    fn get(&self, user_id: &TenantId) -> IndexResult<Arc<TenantSlot>>;

    /// Removes the slot; `false` if there was none
    fn remove(&self, user_id: &TenantId) -> bool;

    /// Snapshot of known tenants, sorted
    fn list(&self) -> Vec<TenantId>;

    fn len(&self) -> usize {
        self.list().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local registry backed by a reader/writer-locked map
pub struct InMemoryTenantRegistry {
    slots: RwLock<HashMap<TenantId, Arc<TenantSlot>>>,
    dimension: usize,
    max_concurrent_searches: usize,
}

impl InMemoryTenantRegistry {
    pub fn new(dimension: usize, max_concurrent_searches: usize) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            dimension,
            max_concurrent_searches,
        }
    }
}

impl TenantRegistry for InMemoryTenantRegistry {
    fn get_or_create(&self, user_id: &TenantId) -> Arc<TenantSlot> {
        if let Some(slot) = self.slots.read().get(user_id) {
            return Arc::clone(slot);
        }

        let mut slots = self.slots.write();
        let slot = slots.entry(user_id.clone()).or_insert_with(|| {
            tracing::debug!(user_id = %user_id, "creating tenant slot");
            Arc::new(TenantSlot::new(
                user_id.clone(),
                self.dimension,
                self.max_concurrent_searches,
            ))
        });
        Arc::clone(slot)
    }

    fn get(&self, user_id: &TenantId) -> IndexResult<Arc<TenantSlot>> {
        self.slots
            .read()
            .get(user_id)
            .cloned()
            .ok_or_else(|| IndexError::UnknownTenant(user_id.clone()))
    }

    fn remove(&self, user_id: &TenantId) -> bool {
        self.slots.write().remove(user_id).is_some()
    }

    fn list(&self) -> Vec<TenantId> {
        let mut ids: Vec<TenantId> = self.slots.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn len(&self) -> usize {
        self.slots.read().len()
    }
}
