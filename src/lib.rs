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

//! # Image Similarity - Per-User Embedding Search
//!
//! An in-memory, per-user vector index answering "which of my photos look
//! like this one" for a photo-management backend.
//!
//! ## Key Features
//!
//! - **Exact Search**: Brute-force squared Euclidean k-NN with a distance threshold
//! - **Tenant Isolation**: One store per user, each behind its own reader/writer lock
//! - **Atomic Rebuilds**: A build replaces the whole store in one swap
//! - **Bounded Work**: Request deadlines and per-user search permits
//!
//! The HTTP surface lives in [`network::rest`]; the verbs themselves in
//! [`index::IndexCoordinator`].

pub mod compute;
pub mod core;
pub mod index;
pub mod monitoring;
pub mod network;

pub use crate::core::{Config, ErrorKind, IndexConfig, IndexError, IndexResult, TenantId};
pub use crate::index::{Deadline, IndexCoordinator, InMemoryTenantRegistry, SearchParams, TenantRegistry, VectorStore};
pub use crate::network::{AppState, RestServer};
