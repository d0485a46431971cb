// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! The database server: storage engine, request actions and REST listener.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument::WithSubscriber;
use tracing::{debug, error, info};

use super::actions::{ActionsProvider, DatabaseActions};
use super::dependencies::Dependencies;
use crate::core::{Config, ServerError, ServerResult};
use crate::monitoring::LogSink;
use crate::network::rest::{AppState, RestServer, RunningRestServer};
use crate::storage::StorageEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edition {
    Community,
    Enterprise,
}

impl std::fmt::Display for Edition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Edition::Community => write!(f, "community"),
            Edition::Enterprise => write!(f, "enterprise"),
        }
    }
}

struct RunningServices {
    storage: Arc<StorageEngine>,
    actions: Arc<dyn DatabaseActions>,
    rest: RunningRestServer,
}

pub struct DatabaseServer {
    edition: Edition,
    config: Config,
    config_file: Option<PathBuf>,
    actions_provider: Arc<dyn ActionsProvider>,
    log_sink: LogSink,
    running: Option<RunningServices>,
}

impl DatabaseServer {
    /// Assemble a server from resolved configuration and its dependencies.
    /// Nothing is opened or bound until [`start`](Self::start).
    pub fn new(
        edition: Edition,
        config_file: Option<&Path>,
        config: Config,
        dependencies: Dependencies,
    ) -> ServerResult<Self> {
        config.validate()?;
        let actions_provider = dependencies
            .actions_provider
            .ok_or(ServerError::MissingDependency("actions provider"))?;

        Ok(Self {
            edition,
            config,
            config_file: config_file.map(Path::to_path_buf),
            actions_provider,
            log_sink: dependencies.log_sink,
            running: None,
        })
    }

    /// Open storage, create the request actions and start serving.
    /// Returns the address the REST listener is bound to.
    pub async fn start(&mut self) -> ServerResult<SocketAddr> {
        if self.running.is_some() {
            return Err(ServerError::AlreadyRunning);
        }
        let dispatch = self.log_sink.dispatch().clone();

        async {
            info!(
                "🚀 Starting ProximaDB {} server (node {})",
                self.edition, self.config.server.node_id
            );
            if let Some(config_file) = &self.config_file {
                debug!("Configuration file: {}", config_file.display());
            }

            let storage = Arc::new(StorageEngine::open(
                &self.config.server.data_dir,
                &self.config.storage,
            )?);
            let actions = match self
                .actions_provider
                .create_actions(storage.clone(), &self.config)
            {
                Ok(actions) => actions,
                Err(e) => {
                    error!("Failed to create database actions: {:#}", e);
                    close_after_failed_start(&storage);
                    return Err(ServerError::Actions(e));
                }
            };
            debug!("Database actions: {}", actions.name());

            let state = AppState {
                actions: actions.clone(),
            };
            let rest = RestServer::new(
                self.config.bind_socket_addr(),
                &self.config.api.rest_api_path,
                state,
            );
            let rest = match rest.start(&self.log_sink) {
                Ok(rest) => rest,
                Err(e) => {
                    error!("Failed to start REST server: {}", e);
                    close_after_failed_start(&storage);
                    return Err(e.into());
                }
            };

            let address = rest.local_addr();
            info!("✅ ProximaDB {} server started on {}", self.edition, address);
            self.running = Some(RunningServices {
                storage,
                actions,
                rest,
            });
            Ok::<_, ServerError>(address)
        }
        .with_subscriber(dispatch)
        .await
    }

    /// Shut the listener down, then close storage. Stopping a server that
    /// is not running is a no-op.
    pub async fn stop(&mut self) -> ServerResult<()> {
        let dispatch = self.log_sink.dispatch().clone();
        let edition = self.edition;
        let Some(services) = self.running.take() else {
            self.log_sink.in_scope(|| debug!("Server already stopped"));
            return Ok(());
        };

        async move {
            info!("🛑 Stopping ProximaDB {} server", edition);
            let RunningServices { storage, rest, .. } = services;

            let network = rest.shutdown().await;
            if let Err(e) = &network {
                error!("REST server did not shut down cleanly: {}", e);
            }
            let storage = storage.close();
            if let Err(e) = &storage {
                error!("Failed to close storage: {}", e);
            }

            network?;
            storage?;
            info!("ProximaDB {} server stopped", edition);
            Ok::<_, ServerError>(())
        }
        .with_subscriber(dispatch)
        .await
    }

    pub fn edition(&self) -> Edition {
        self.edition
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.server.data_dir
    }

    pub fn log_sink(&self) -> &LogSink {
        &self.log_sink
    }

    /// Request-handling actions, available while the server is running
    pub fn database_actions(&self) -> Option<Arc<dyn DatabaseActions>> {
        self.running.as_ref().map(|services| services.actions.clone())
    }

    pub fn storage(&self) -> Option<Arc<StorageEngine>> {
        self.running.as_ref().map(|services| services.storage.clone())
    }

    pub fn http_address(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|services| services.rest.local_addr())
    }

    /// Base URL of the REST API, e.g. `http://127.0.0.1:40123/db/data`
    pub fn base_url(&self) -> Option<String> {
        let address = self.http_address()?;
        let path = match self.config.api.rest_api_path.as_str() {
            "/" => "",
            path => path,
        };
        Some(format!("http://{}{}", address, path))
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }
}

fn close_after_failed_start(storage: &StorageEngine) {
    if let Err(e) = storage.close() {
        error!("Failed to close storage after start failure: {}", e);
    }
}

impl std::fmt::Debug for DatabaseServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseServer")
            .field("edition", &self.edition)
            .field("node_id", &self.config.server.node_id)
            .field("data_dir", &self.config.server.data_dir)
            .field("http_address", &self.http_address())
            .finish()
    }
}
