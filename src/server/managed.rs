// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Test server that owns the temporary resources its fixture generated.
//!
//! A [`ManagedServer`] behaves exactly like the [`DatabaseServer`] it wraps
//! (all accessors are reachable through `Deref`). The only addition is
//! [`stop`](ManagedServer::stop): after the base server has shut down, every
//! resource the fixture generated for this instance is removed, once.
//! Resources supplied by the caller are never touched.

use std::io::{self, ErrorKind};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::instance::DatabaseServer;
use crate::core::ServerResult;
use crate::monitoring::LogSink;

/// A temporary artifact created on behalf of a test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedResource {
    ConfigFile(PathBuf),
    DataDir(PathBuf),
}

impl GeneratedResource {
    pub fn path(&self) -> &Path {
        match self {
            GeneratedResource::ConfigFile(path) | GeneratedResource::DataDir(path) => path,
        }
    }

    /// Remove the resource. A resource that is already gone counts as removed.
    pub fn release(&self) -> io::Result<()> {
        let result = match self {
            GeneratedResource::ConfigFile(path) => std::fs::remove_file(path),
            GeneratedResource::DataDir(path) => std::fs::remove_dir_all(path),
        };
        match result {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Release resources in order, logging failures instead of returning them.
/// Returns how many could not be removed.
pub(crate) fn release_all(resources: impl IntoIterator<Item = GeneratedResource>) -> usize {
    let mut failures = 0;
    for resource in resources {
        match resource.release() {
            Ok(()) => debug!("🧹 Removed generated {}", describe(&resource)),
            Err(e) => {
                failures += 1;
                warn!(
                    "Failed to remove generated {}: {}",
                    describe(&resource),
                    e
                );
            }
        }
    }
    failures
}

fn describe(resource: &GeneratedResource) -> String {
    match resource {
        GeneratedResource::ConfigFile(path) => format!("config file {}", path.display()),
        GeneratedResource::DataDir(path) => format!("data directory {}", path.display()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Running,
    Stopped,
}

pub struct ManagedServer {
    server: DatabaseServer,
    generated: Vec<GeneratedResource>,
    log_sink: LogSink,
    state: ServerState,
}

impl ManagedServer {
    /// Wrap a started server. `generated` lists the resources this instance
    /// now owns, in release order.
    pub(crate) fn new(
        server: DatabaseServer,
        generated: Vec<GeneratedResource>,
        log_sink: LogSink,
    ) -> Self {
        Self {
            server,
            generated,
            log_sink,
            state: ServerState::Running,
        }
    }

    /// Stop the server, then remove the generated resources.
    ///
    /// The base server finishes its own shutdown (listener closed, storage
    /// flushed and unlocked) before anything is deleted. Removal failures
    /// are logged through the fixture's log sink and do not affect the
    /// result, which is the base server's shutdown result. Calling `stop`
    /// again finds nothing left to remove.
    pub async fn stop(&mut self) -> ServerResult<()> {
        let result = self.server.stop().await;
        self.state = ServerState::Stopped;

        let generated = std::mem::take(&mut self.generated);
        self.log_sink.in_scope(|| {
            let failures = release_all(generated);
            if failures > 0 {
                warn!("{} generated resource(s) left behind", failures);
            }
        });

        result
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn is_stopped(&self) -> bool {
        self.state == ServerState::Stopped
    }

    /// Resources still owned by this instance; empty once stopped
    pub fn generated_resources(&self) -> &[GeneratedResource] {
        &self.generated
    }

    pub fn generated_config_file(&self) -> Option<&Path> {
        self.generated.iter().find_map(|resource| match resource {
            GeneratedResource::ConfigFile(path) => Some(path.as_path()),
            GeneratedResource::DataDir(_) => None,
        })
    }

    /// True when the data directory was generated for this instance and
    /// will be removed on stop
    pub fn owns_data_dir(&self) -> bool {
        self.generated
            .iter()
            .any(|resource| matches!(resource, GeneratedResource::DataDir(_)))
    }
}

impl Deref for ManagedServer {
    type Target = DatabaseServer;

    fn deref(&self) -> &Self::Target {
        &self.server
    }
}

impl std::fmt::Debug for ManagedServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedServer")
            .field("server", &self.server)
            .field("generated", &self.generated)
            .field("state", &self.state)
            .finish()
    }
}
