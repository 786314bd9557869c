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

//! JSON-over-HTTP interface: `/build`, `/search`, `/drop`, `/health`, `/tenants`

pub mod error;
pub mod handlers;
pub mod requests;
pub mod server;

pub use error::ApiError;
pub use handlers::{create_router, AppState, REQUEST_TIMEOUT_HEADER};
pub use requests::*;
pub use server::{shutdown_signal, RestServer};
