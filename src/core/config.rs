// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Server configuration, stored on disk as TOML.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use super::error::ConfigError;

pub const DEFAULT_REST_API_PATH: &str = "/db/data";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub monitoring: MonitoringConfig,
    /// Free-form settings, carried through to the server untouched
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub node_id: String,
    pub bind_address: IpAddr,
    /// Port 0 lets the OS pick a free port
    pub port: u16,
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub rest_api_path: String,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub store_file: String,
    pub lock_file: String,
    pub sync_on_close: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            api: ApiConfig::default(),
            storage: StorageConfig::default(),
            monitoring: MonitoringConfig::default(),
            properties: BTreeMap::new(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            node_id: "node-1".to_string(),
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            rest_api_path: DEFAULT_REST_API_PATH.to_string(),
            request_timeout_seconds: 30,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_file: "records.json".to_string(),
            lock_file: "store.lock".to_string(),
            sync_on_close: true,
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml(&Self::read_file(path)?)
    }

    pub fn read_file(path: impl AsRef<Path>) -> Result<String, ConfigError> {
        let path = path.as_ref();
        std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    /// True when the TOML document sets `[server] data_dir` itself rather
    /// than relying on the default
    pub fn declares_data_dir(contents: &str) -> Result<bool, ConfigError> {
        let table: toml::Table = toml::from_str(contents)?;
        Ok(table
            .get("server")
            .and_then(|server| server.get("data_dir"))
            .is_some())
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Serialize into `writer`. I/O failures are returned as-is so callers
    /// creating files can report them as resource errors.
    pub fn write_to<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        let contents = self
            .to_toml()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.node_id.trim().is_empty() {
            return Err(ConfigError::invalid("node id", "must not be empty"));
        }
        validate_path("data directory", &self.server.data_dir)?;
        validate_rest_api_path(&self.api.rest_api_path)?;
        for file in [&self.storage.store_file, &self.storage.lock_file] {
            if file.is_empty() || file.contains('/') || file.contains('\\') {
                return Err(ConfigError::invalid(
                    "storage file name",
                    format!("'{}' must be a plain file name", file),
                ));
            }
        }
        for key in self.properties.keys() {
            validate_property_key(key)?;
        }
        Ok(())
    }

    pub fn bind_socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.bind_address, self.server.port)
    }
}

/// Check that `path` is a usable file system path: non-empty and free of NUL bytes.
pub fn validate_path(option: &'static str, path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::invalid(option, "path is empty"));
    }
    if path.to_string_lossy().contains('\0') {
        return Err(ConfigError::invalid(option, "path contains a NUL byte"));
    }
    Ok(())
}

pub fn validate_rest_api_path(path: &str) -> Result<(), ConfigError> {
    if !path.starts_with('/') {
        return Err(ConfigError::invalid(
            "REST API path",
            format!("'{}' must start with '/'", path),
        ));
    }
    if path.len() > 1 && path.ends_with('/') {
        return Err(ConfigError::invalid(
            "REST API path",
            format!("'{}' must not end with '/'", path),
        ));
    }
    if path.contains("//") || path.chars().any(char::is_whitespace) {
        return Err(ConfigError::invalid(
            "REST API path",
            format!("'{}' is not a valid URI path", path),
        ));
    }
    Ok(())
}

/// Property keys are dotted names such as `dbms.security.auth_enabled`.
pub fn validate_property_key(key: &str) -> Result<(), ConfigError> {
    if key.is_empty() {
        return Err(ConfigError::invalid("property key", "must not be empty"));
    }
    if key.chars().any(|c| c.is_whitespace() || c == '=') {
        return Err(ConfigError::invalid(
            "property key",
            format!("'{}' must not contain whitespace or '='", key),
        ));
    }
    if key.split('.').any(str::is_empty) {
        return Err(ConfigError::invalid(
            "property key",
            format!("'{}' has an empty segment", key),
        ));
    }
    Ok(())
}
