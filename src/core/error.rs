// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Error types for the server and its test fixtures

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Invalid or unreadable configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {option}: {reason}")]
    InvalidOption {
        option: &'static str,
        reason: String,
    },

    #[error("Failed to read configuration file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl ConfigError {
    pub fn invalid(option: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option,
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Data directory is locked by another server: {}", .lock_file.display())]
    Locked { lock_file: PathBuf },

    #[error("Storage engine is closed")]
    Closed,

    #[error("Disk I/O error: {0}")]
    DiskIO(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Listener task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Errors raised by the database server itself
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Database actions error: {0}")]
    Actions(#[from] anyhow::Error),

    #[error("Missing dependency: {0}")]
    MissingDependency(&'static str),

    #[error("Server is already running")]
    AlreadyRunning,
}

/// Errors surfaced to test code by the fixture builder.
///
/// `Config` is reported by the configuring call (or by `build()` when a
/// caller-supplied config file cannot be read), `Io` when a generated
/// resource cannot be created and `Construction` when the server cannot be
/// assembled or started. Cleanup failures during `stop()` never show up here.
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Fixture configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to create test resource: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to construct test server: {0}")]
    Construction(#[from] ServerError),
}

pub type ServerResult<T> = std::result::Result<T, ServerError>;
pub type FixtureResult<T> = std::result::Result<T, FixtureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_option_message() {
        let error = ConfigError::invalid("data directory", "path is empty");
        assert_eq!(error.to_string(), "Invalid data directory: path is empty");
    }

    #[test]
    fn test_storage_error_converts_into_construction_error() {
        let error: FixtureError = ServerError::from(StorageError::Locked {
            lock_file: PathBuf::from("/tmp/data/storage/store.lock"),
        })
        .into();

        assert!(matches!(
            error,
            FixtureError::Construction(ServerError::Storage(StorageError::Locked { .. }))
        ));
        assert!(error.to_string().contains("store.lock"));
    }

    #[test]
    fn test_io_error_is_resource_error() {
        let error: FixtureError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into();
        assert!(matches!(error, FixtureError::Io(_)));
    }
}
