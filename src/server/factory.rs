// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Server factory: configuration resolution and construction strategies.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::actions::{CommunityActionsProvider, EnterpriseActionsProvider};
use super::dependencies::Dependencies;
use super::instance::{DatabaseServer, Edition};
use super::managed::{release_all, GeneratedResource};
use crate::core::{Config, FixtureError, FixtureResult, ServerResult};
use crate::monitoring::LogSink;

pub const CONFIG_FILE_PREFIX: &str = "proximadb-";
pub const CONFIG_FILE_SUFFIX: &str = ".toml";
pub const DATA_DIR_PREFIX: &str = "proximadb-fixture-";

/// Final construction step: resolved configuration in, unstarted server out.
pub type ConstructionStrategy =
    fn(Option<&Path>, Config, Dependencies) -> ServerResult<DatabaseServer>;

pub fn construct_community(
    config_file: Option<&Path>,
    config: Config,
    dependencies: Dependencies,
) -> ServerResult<DatabaseServer> {
    let dependencies =
        dependencies.with_default_actions_provider(|| Arc::new(CommunityActionsProvider));
    DatabaseServer::new(Edition::Community, config_file, config, dependencies)
}

pub fn construct_enterprise(
    config_file: Option<&Path>,
    config: Config,
    dependencies: Dependencies,
) -> ServerResult<DatabaseServer> {
    let dependencies =
        dependencies.with_default_actions_provider(|| Arc::new(EnterpriseActionsProvider));
    DatabaseServer::new(Edition::Enterprise, config_file, config, dependencies)
}

/// Options explicitly set by the caller. `None` leaves the value to the
/// config file (when one is supplied) or to [`Config::default`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionRequest {
    pub data_dir: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub bind_address: Option<IpAddr>,
    pub port: Option<u16>,
    pub rest_api_path: Option<String>,
    pub properties: BTreeMap<String, String>,
}

impl ResolutionRequest {
    /// Overlay the explicit options onto `config`
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(data_dir) = &self.data_dir {
            config.server.data_dir = data_dir.clone();
        }
        if let Some(bind_address) = self.bind_address {
            config.server.bind_address = bind_address;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(rest_api_path) = &self.rest_api_path {
            config.api.rest_api_path = rest_api_path.clone();
        }
        config.properties.extend(
            self.properties
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
    }
}

#[derive(Debug)]
pub struct ResolvedConfig {
    pub config: Config,
    pub config_file: Option<PathBuf>,
    /// Resources created during resolution, in release order
    pub generated: Vec<GeneratedResource>,
}

/// Produce the configuration a server will run with.
///
/// With a caller-supplied config file, the file is loaded and the explicit
/// options are applied on top. The file itself is never generated, but a
/// temporary data directory is when neither the file nor the request names
/// one. Otherwise the config
/// is written to a fresh `proximadb-*.toml` file inside the data directory,
/// and a temporary data directory is created first when none was given.
/// If anything fails, whatever was already generated is removed again.
pub fn resolve_config(
    request: &ResolutionRequest,
    log_sink: &LogSink,
) -> FixtureResult<ResolvedConfig> {
    log_sink.in_scope(|| -> FixtureResult<ResolvedConfig> {
        if let Some(config_file) = &request.config_file {
            let contents = Config::read_file(config_file)?;
            let mut config = Config::from_toml(&contents)?;
            request.apply_to(&mut config);

            let mut generated = Vec::new();
            if request.data_dir.is_none() && !Config::declares_data_dir(&contents)? {
                let data_dir = create_temp_data_dir()?;
                config.server.data_dir = data_dir.clone();
                generated.push(GeneratedResource::DataDir(data_dir));
            }

            info!("📋 Using configuration file {}", config_file.display());
            return Ok(ResolvedConfig {
                config,
                config_file: Some(config_file.clone()),
                generated,
            });
        }

        let mut generated = Vec::new();
        let result = generate_config(request, &mut generated);
        if result.is_err() {
            release_all(std::mem::take(&mut generated));
        }
        let (config, config_file) = result?;

        Ok(ResolvedConfig {
            config,
            config_file: Some(config_file),
            generated,
        })
    })
}

fn generate_config(
    request: &ResolutionRequest,
    generated: &mut Vec<GeneratedResource>,
) -> FixtureResult<(Config, PathBuf)> {
    let data_dir = match &request.data_dir {
        Some(data_dir) => {
            fs::create_dir_all(data_dir)?;
            data_dir.clone()
        }
        None => {
            let data_dir = create_temp_data_dir()?;
            generated.push(GeneratedResource::DataDir(data_dir.clone()));
            data_dir
        }
    };

    let mut config = Config::default();
    request.apply_to(&mut config);
    config.server.data_dir = data_dir;
    config.validate()?;

    let config_file = write_temp_config_file(&config)?;
    // Config file goes before the data directory that may contain it
    generated.insert(0, GeneratedResource::ConfigFile(config_file.clone()));
    Ok((config, config_file))
}

fn create_temp_data_dir() -> std::io::Result<PathBuf> {
    let data_dir = tempfile::Builder::new()
        .prefix(DATA_DIR_PREFIX)
        .tempdir()?
        .keep();
    debug!("Generated data directory {}", data_dir.display());
    Ok(data_dir)
}

fn write_temp_config_file(config: &Config) -> FixtureResult<PathBuf> {
    let mut file = tempfile::Builder::new()
        .prefix(CONFIG_FILE_PREFIX)
        .suffix(CONFIG_FILE_SUFFIX)
        .tempfile_in(&config.server.data_dir)?;
    let contents = config.to_toml()?;
    file.write_all(contents.as_bytes())?;
    file.as_file().sync_all()?;

    let path = file
        .into_temp_path()
        .keep()
        .map_err(|e| FixtureError::Io(e.into()))?;
    debug!("Generated config file {}", path.display());
    Ok(path)
}
