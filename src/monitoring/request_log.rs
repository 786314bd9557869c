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

//! One structured log record per request

use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::core::{ErrorKind, IndexError, TenantId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Build,
    Search,
    Drop,
    Health,
    Tenants,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Build => "build",
            Verb::Search => "search",
            Verb::Drop => "drop",
            Verb::Health => "health",
            Verb::Tenants => "tenants",
        }
    }

    /// Probes are logged at debug so they do not drown real traffic
    fn is_probe(&self) -> bool {
        matches!(self, Verb::Health | Verb::Tenants)
    }
}

/// Sizes of the request inputs; absent fields are not recorded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSizes {
    pub ids: Option<usize>,
    pub dim: Option<usize>,
    pub n: Option<usize>,
}

/// Measures a request from receipt to response
#[derive(Debug)]
pub struct RequestTimer {
    verb: Verb,
    started: Instant,
}

impl RequestTimer {
    pub fn start(verb: Verb) -> Self {
        Self {
            verb,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Emit the request record and return the error kind, if any
    pub fn finish<T>(
        self,
        user_id: Option<&TenantId>,
        sizes: InputSizes,
        result: &Result<T, IndexError>,
    ) -> Option<ErrorKind> {
        let verb = self.verb.as_str();
        let user_id = user_id.map(TenantId::as_str).unwrap_or("-");
        let elapsed_ms = self.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(_) if self.verb.is_probe() => {
                debug!(verb, elapsed_ms, outcome = "ok", "request completed");
                None
            }
            Ok(_) => {
                info!(
                    verb,
                    user_id,
                    ids = sizes.ids,
                    dim = sizes.dim,
                    n = sizes.n,
                    elapsed_ms,
                    outcome = "ok",
                    "request completed"
                );
                None
            }
            Err(err) => {
                let kind = err.kind();
                if kind == ErrorKind::Internal {
                    error!(
                        verb,
                        user_id,
                        ids = sizes.ids,
                        dim = sizes.dim,
                        n = sizes.n,
                        elapsed_ms,
                        outcome = "error",
                        error_kind = kind.as_str(),
                        error = %err,
                        "request failed"
                    );
                } else {
                    warn!(
                        verb,
                        user_id,
                        ids = sizes.ids,
                        dim = sizes.dim,
                        n = sizes.n,
                        elapsed_ms,
                        outcome = "error",
                        error_kind = kind.as_str(),
                        error = %err,
                        "request failed"
                    );
                }
                Some(kind)
            }
        }
    }
}
