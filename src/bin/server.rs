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

//! Image similarity server - serves per-user embedding search over HTTP

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use image_similarity::monitoring::init_logging;
use image_similarity::network::shutdown_signal;
use image_similarity::{AppState, Config, InMemoryTenantRegistry, IndexCoordinator, RestServer};

#[derive(Parser)]
#[command(name = "image-similarity-server")]
#[command(about = "Per-user image embedding similarity service")]
struct Args {
    /// Overrides LISTEN_ADDR
    #[arg(short, long)]
    listen_addr: Option<SocketAddr>,

    /// Overrides EMBEDDING_DIM
    #[arg(short, long)]
    embedding_dim: Option<usize>,

    /// Overrides LOG_DIR
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::from_env().context("failed to load configuration")?;

    // Override with CLI arguments
    if let Some(listen_addr) = args.listen_addr {
        config.listen_addr = listen_addr;
    }
    if let Some(embedding_dim) = args.embedding_dim {
        config.embedding_dim = embedding_dim;
    }
    if let Some(log_dir) = args.log_dir {
        config.log_dir = Some(log_dir);
    }
    config.validate().context("invalid configuration")?;

    // Held until exit so the file writer flushes
    let _log_guard = init_logging(config.log_dir.as_deref())?;

    info!("Starting image similarity server with config: {:?}", config);

    let index_config = config.index_config();
    let registry = Arc::new(InMemoryTenantRegistry::new(
        index_config.embedding_dim,
        index_config.max_concurrent_searches,
    ));
    let coordinator = Arc::new(IndexCoordinator::new(index_config, registry));
    let state = AppState::new(coordinator, config.request_timeout);

    RestServer::new(config.listen_addr, state, config.max_request_bytes)
        .serve(shutdown_signal())
        .await?;

    info!("Image similarity server stopped");
    Ok(())
}
