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

//! Per-user vector indexes: flat stores, the tenant registry and the
//! coordinator that exposes build, search and drop.

pub mod coordinator;
pub mod deadline;
pub mod flat;
pub mod registry;

pub use coordinator::{
    BuildOutcome, DropOutcome, HealthReport, IndexCoordinator, SearchParams, TenantSummary,
    DEFAULT_RESULT_COUNT, DEFAULT_THRESHOLD,
};
pub use deadline::Deadline;
pub use flat::{Neighbor, VectorStore, SCAN_BATCH_ROWS};
pub use registry::{InMemoryTenantRegistry, TenantRegistry, TenantSlot};
