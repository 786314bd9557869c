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

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Semaphore;

use super::error::ConfigError;

pub const ENV_LISTEN_ADDR: &str = "LISTEN_ADDR";
pub const ENV_EMBEDDING_DIM: &str = "EMBEDDING_DIM";
pub const ENV_MAX_TENANT_SIZE: &str = "MAX_TENANT_SIZE";
pub const ENV_MAX_CONCURRENT_SEARCHES: &str = "MAX_CONCURRENT_SEARCHES_PER_TENANT";
pub const ENV_LOG_DIR: &str = "LOG_DIR";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "REQUEST_TIMEOUT_MS";
pub const ENV_MAX_REQUEST_BYTES: &str = "MAX_REQUEST_BYTES";

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8002";
pub const DEFAULT_EMBEDDING_DIM: usize = 1024;
pub const DEFAULT_MAX_TENANT_SIZE: usize = 1_000_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 1024 * 1024 * 1024;

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub embedding_dim: usize,
    /// Builds with more rows than this are rejected
    pub max_tenant_size: usize,
    /// Searches beyond this many per tenant wait for a permit
    pub max_concurrent_searches_per_tenant: usize,
    /// Optional directory for the rolling log file
    pub log_dir: Option<PathBuf>,
    pub request_timeout: Duration,
    pub max_request_bytes: usize,
}

/// The subset of [`Config`] the index coordinator needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexConfig {
    pub embedding_dim: usize,
    pub max_tenant_size: usize,
    pub max_concurrent_searches: usize,
}

impl IndexConfig {
    pub fn new(embedding_dim: usize) -> Self {
        Self {
            embedding_dim,
            max_tenant_size: DEFAULT_MAX_TENANT_SIZE,
            max_concurrent_searches: num_cpus::get().max(1),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8002)),
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            max_tenant_size: DEFAULT_MAX_TENANT_SIZE,
            max_concurrent_searches_per_tenant: num_cpus::get().max(1),
            log_dir: None,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
        }
    }
}

impl Config {
    /// Load from environment variables, falling back to the documented
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let listen_addr = parse_env(ENV_LISTEN_ADDR, defaults.listen_addr)?;
        let embedding_dim = parse_env(ENV_EMBEDDING_DIM, defaults.embedding_dim)?;
        let max_tenant_size = parse_env(ENV_MAX_TENANT_SIZE, defaults.max_tenant_size)?;
        let max_concurrent_searches_per_tenant = parse_env(
            ENV_MAX_CONCURRENT_SEARCHES,
            defaults.max_concurrent_searches_per_tenant,
        )?;
        let request_timeout_ms = parse_env(ENV_REQUEST_TIMEOUT_MS, DEFAULT_REQUEST_TIMEOUT_MS)?;
        let max_request_bytes = parse_env(ENV_MAX_REQUEST_BYTES, defaults.max_request_bytes)?;

        let log_dir = env::var(ENV_LOG_DIR)
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        let config = Self {
            listen_addr,
            embedding_dim,
            max_tenant_size,
            max_concurrent_searches_per_tenant,
            log_dir,
            request_timeout: Duration::from_millis(request_timeout_ms),
            max_request_bytes,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding_dim == 0 {
            return Err(ConfigError::Invalid(format!("{ENV_EMBEDDING_DIM} must be at least 1")));
        }
        if self.max_tenant_size == 0 {
            return Err(ConfigError::Invalid(format!("{ENV_MAX_TENANT_SIZE} must be at least 1")));
        }
        if self.max_concurrent_searches_per_tenant == 0
            || self.max_concurrent_searches_per_tenant > Semaphore::MAX_PERMITS
        {
            return Err(ConfigError::Invalid(format!(
                "{ENV_MAX_CONCURRENT_SEARCHES} must be between 1 and {}",
                Semaphore::MAX_PERMITS
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid(format!("{ENV_REQUEST_TIMEOUT_MS} must be at least 1")));
        }
        Ok(())
    }

    pub fn index_config(&self) -> IndexConfig {
        IndexConfig {
            embedding_dim: self.embedding_dim,
            max_tenant_size: self.max_tenant_size,
            max_concurrent_searches: self.max_concurrent_searches_per_tenant,
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Parse {
            key: key.to_string(),
            details: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
