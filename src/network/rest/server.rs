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

//! REST server implementation using axum

use axum::Router;
use std::future::Future;
use std::net::{SocketAddr, TcpListener};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::handlers::{create_router, AppState};

/// REST server for the similarity service
pub struct RestServer {
    router: Router,
    bind_addr: SocketAddr,
}

impl RestServer {
    pub fn new(bind_addr: SocketAddr, state: AppState, max_request_bytes: usize) -> Self {
        let router = create_router(state, max_request_bytes).layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        );

        Self { router, bind_addr }
    }

    /// The fully layered router, for in-process callers
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.bind_addr)?;
        self.serve_listener(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve_listener<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        info!("🌐 REST server listening on {}", local_addr);
        info!("📋 Available endpoints:");
        info!("   POST   /build     - Build a user's index");
        info!("   POST   /search    - Search a user's index");
        info!("   POST   /drop      - Drop a user's index");
        info!("   GET    /health    - Health check");
        info!("   GET    /tenants   - List indexed users");

        axum::Server::from_tcp(listener)?
            .serve(self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("REST server stopped");
        Ok(())
    }
}

/// Resolves on SIGINT or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
