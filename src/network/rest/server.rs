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
use std::net::{SocketAddr, TcpListener};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::instrument::WithSubscriber;

use super::handlers::{create_router, AppState};
use crate::core::NetworkError;
use crate::monitoring::LogSink;

/// REST server for ProximaDB
pub struct RestServer {
    router: Router,
    bind_addr: SocketAddr,
}

impl RestServer {
    /// Create new REST server
    pub fn new(bind_addr: SocketAddr, rest_api_path: &str, state: AppState) -> Self {
        let router = create_router(rest_api_path, state)
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

        Self { router, bind_addr }
    }

    /// Bind the listener and serve in a background task.
    ///
    /// The socket is bound before this returns, so the returned address is
    /// reachable immediately. Must be called from within a tokio runtime.
    pub fn start(self, log_sink: &LogSink) -> Result<RunningRestServer, NetworkError> {
        let listener = TcpListener::bind(self.bind_addr).map_err(|source| NetworkError::Bind {
            address: self.bind_addr,
            source,
        })?;
        listener
            .set_nonblocking(true)
            .map_err(|source| NetworkError::Bind {
                address: self.bind_addr,
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| NetworkError::Bind {
            address: self.bind_addr,
            source,
        })?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = axum::Server::from_tcp(listener)
            .map_err(|e| NetworkError::Http(e.to_string()))?
            .serve(self.router.into_make_service())
            .with_graceful_shutdown(async {
                // A dropped sender also shuts the listener down
                let _ = shutdown_rx.await;
            });

        let handle = tokio::spawn(
            async move {
                tracing::info!("🌐 REST server listening on {}", local_addr);
                let result = server.await.map_err(|e| NetworkError::Http(e.to_string()));
                tracing::info!("🌐 REST server on {} shut down", local_addr);
                result
            }
            .with_subscriber(log_sink.dispatch().clone()),
        );

        Ok(RunningRestServer {
            local_addr,
            shutdown: Some(shutdown_tx),
            handle,
        })
    }
}

/// Handle to a serving REST listener
pub struct RunningRestServer {
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), NetworkError>>,
}

impl RunningRestServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections, let in-flight requests finish and wait
    /// for the serving task to exit.
    pub async fn shutdown(mut self) -> Result<(), NetworkError> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.handle.await?
    }
}

impl std::fmt::Debug for RunningRestServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunningRestServer")
            .field("local_addr", &self.local_addr)
            .finish()
    }
}
