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

//! REST API handlers that delegate to the index coordinator
//!
//! Every verb emits one structured log record through [`RequestTimer`] and
//! answers failures with the JSON error envelope. Bodies that fail to parse
//! never reach the coordinator.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{HeaderMap, Method, Uri},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use super::error::ApiError;
use super::requests::{
    BuildRequest, BuildResponse, DropRequest, DropResponse, HealthResponse, SearchRequest,
    SearchResponse, TenantEntry, TenantsResponse,
};
use crate::core::{ImageId, IndexError, IndexResult, TenantId};
use crate::index::{BuildOutcome, Deadline, DropOutcome, IndexCoordinator, SearchParams};
use crate::monitoring::{InputSizes, RequestTimer, Verb};

/// Header carrying a caller-supplied per-request budget in milliseconds
pub const REQUEST_TIMEOUT_HEADER: &str = "x-request-timeout-ms";

/// Shared application state for REST handlers
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<IndexCoordinator>,
    /// Upper bound on any request's deadline
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(coordinator: Arc<IndexCoordinator>, request_timeout: Duration) -> Self {
        Self {
            coordinator,
            request_timeout,
        }
    }

    /// Deadline for a request: the configured timeout, shortened by the
    /// caller's header when present.
    fn deadline(&self, headers: &HeaderMap) -> IndexResult<Deadline> {
        let budget = match headers.get(REQUEST_TIMEOUT_HEADER) {
            None => self.request_timeout,
            Some(value) => {
                let millis = value
                    .to_str()
                    .ok()
                    .and_then(|raw| raw.trim().parse::<u64>().ok())
                    .ok_or_else(|| {
                        IndexError::BadRequest(format!(
                            "{REQUEST_TIMEOUT_HEADER} must be a non-negative integer"
                        ))
                    })?;
                Duration::from_millis(millis).min(self.request_timeout)
            }
        };
        Ok(Deadline::after(budget))
    }
}

/// What the request log needs to know about a request once it is parsed
#[derive(Debug, Default)]
struct RequestContext {
    user_id: Option<TenantId>,
    sizes: InputSizes,
}

fn parse_body<T: DeserializeOwned>(body: Result<Bytes, BytesRejection>) -> IndexResult<T> {
    let bytes = body
        .map_err(|rejection| IndexError::BadRequest(format!("could not read request body: {rejection}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| IndexError::BadRequest(format!("invalid request body: {e}")))
}

/// Create REST router with all endpoints
pub fn create_router(state: AppState, max_request_bytes: usize) -> Router {
    Router::new()
        // Index verbs; the photo backend calls the trailing-slash forms
        .route("/build", post(build_index).fallback(method_not_allowed))
        .route("/build/", post(build_index).fallback(method_not_allowed))
        .route("/search", post(search_index).fallback(method_not_allowed))
        .route("/search/", post(search_index).fallback(method_not_allowed))
        .route("/drop", post(drop_index).fallback(method_not_allowed))
        .route("/drop/", post(drop_index).fallback(method_not_allowed))
        // Observability
        .route("/health", get(health_check).fallback(method_not_allowed))
        .route("/health/", get(health_check).fallback(method_not_allowed))
        .route("/tenants", get(list_tenants).fallback(method_not_allowed))
        .route("/tenants/", get(list_tenants).fallback(method_not_allowed))
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .with_state(state)
}

/// Envelope for paths with no route
pub async fn route_not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::from(IndexError::RouteNotFound {
        method: method.to_string(),
        path: uri.path().to_string(),
    })
}

/// Envelope for a routed path called with the wrong verb
pub async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::from(IndexError::MethodNotAllowed {
        method: method.to_string(),
        path: uri.path().to_string(),
    })
}

/// Build (or rebuild) a user's index
pub async fn build_index(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<BuildResponse>, ApiError> {
    let timer = RequestTimer::start(Verb::Build);

    let mut ctx = RequestContext::default();
    let result = run_build(&state, &headers, body, &mut ctx).await;
    timer.finish(ctx.user_id.as_ref(), ctx.sizes, &result);

    let outcome = result?;
    Ok(Json(BuildResponse {
        ok: true,
        size: outcome.size,
    }))
}

async fn run_build(
    state: &AppState,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
    ctx: &mut RequestContext,
) -> IndexResult<BuildOutcome> {
    let deadline = state.deadline(headers)?;
    let request: BuildRequest = parse_body(body)?;
    state.coordinator.touch();

    ctx.user_id = Some(request.user_id.clone());
    ctx.sizes.ids = Some(request.image_hashes.len());
    ctx.sizes.dim = request.image_embeddings.first().map(Vec::len);

    state
        .coordinator
        .build(
            &request.user_id,
            request.image_hashes,
            request.image_embeddings,
            deadline,
        )
        .await
}

/// Nearest images to a query embedding
pub async fn search_index(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let timer = RequestTimer::start(Verb::Search);

    let mut ctx = RequestContext::default();
    let result = run_search(&state, &headers, body, &mut ctx).await;
    timer.finish(ctx.user_id.as_ref(), ctx.sizes, &result);

    Ok(Json(SearchResponse {
        ok: true,
        result: result?,
    }))
}

async fn run_search(
    state: &AppState,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
    ctx: &mut RequestContext,
) -> IndexResult<Vec<ImageId>> {
    let deadline = state.deadline(headers)?;
    let request: SearchRequest = parse_body(body)?;
    state.coordinator.touch();

    let defaults = SearchParams::default();
    let params = SearchParams {
        n: request
            .n
            .map_or(defaults.n, |n| usize::try_from(n).unwrap_or(usize::MAX)),
        threshold: request.threshold.unwrap_or(defaults.threshold),
    };

    ctx.user_id = Some(request.user_id.clone());
    ctx.sizes.dim = Some(request.image_embedding.len());
    ctx.sizes.n = Some(params.n);

    state
        .coordinator
        .search(&request.user_id, request.image_embedding, params, deadline)
        .await
}

/// Forget a user's index
pub async fn drop_index(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<DropResponse>, ApiError> {
    let timer = RequestTimer::start(Verb::Drop);

    let mut ctx = RequestContext::default();
    let result = run_drop(&state, &headers, body, &mut ctx);
    timer.finish(ctx.user_id.as_ref(), ctx.sizes, &result);

    let outcome = result?;
    Ok(Json(DropResponse {
        ok: true,
        removed: outcome.removed,
    }))
}

fn run_drop(
    state: &AppState,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
    ctx: &mut RequestContext,
) -> IndexResult<DropOutcome> {
    state.deadline(headers)?.check("drop")?;
    let request: DropRequest = parse_body(body)?;
    state.coordinator.touch();
    ctx.user_id = Some(request.user_id.clone());
    Ok(state.coordinator.drop_tenant(&request.user_id))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let timer = RequestTimer::start(Verb::Health);
    let report = state.coordinator.health();
    timer.finish(None, InputSizes::default(), &Ok::<_, IndexError>(()));
    Json(HealthResponse::from(report))
}

/// Known tenants and their sizes, sorted by user id
pub async fn list_tenants(State(state): State<AppState>) -> Json<TenantsResponse> {
    let timer = RequestTimer::start(Verb::Tenants);
    let tenants: Vec<TenantEntry> = state
        .coordinator
        .tenants()
        .into_iter()
        .map(TenantEntry::from)
        .collect();
    timer.finish(
        None,
        InputSizes {
            ids: Some(tenants.len()),
            ..InputSizes::default()
        },
        &Ok::<_, IndexError>(()),
    );
    Json(TenantsResponse { ok: true, tenants })
}
