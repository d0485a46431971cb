// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Fixture builder for in-process test servers
//!
//! Tests configure a [`FixtureBuilder`] with chained calls and get a started
//! [`ManagedServer`] back from [`build`](FixtureBuilder::build). Options the
//! test leaves unset fall back to [`Config::default`]; resources the server
//! needs but the test did not supply (the config file, and the data
//! directory if none was given) are generated and owned by the instance
//! until it is stopped.
//!
//! ```no_run
//! # async fn example() -> proximadb_testkit::FixtureResult<()> {
//! use proximadb_testkit::FixtureBuilder;
//!
//! let mut server = FixtureBuilder::community()
//!     .using_data_dir("/tmp/proximadb-t1")?
//!     .with_property("dbms.security.auth_enabled", "false")?
//!     .build()
//!     .await?;
//!
//! println!("REST API at {}", server.base_url().unwrap_or_default());
//! server.stop().await?;
//! # Ok(())
//! # }
//! ```
//!
//! The edition is chosen when the builder is created. `community()` and
//! `enterprise()` share every configuration method and differ only in the
//! [`ConstructionStrategy`] that turns the resolved configuration into a
//! server; [`with_strategy`](FixtureBuilder::with_strategy) accepts any other.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::instrument::WithSubscriber;
use tracing::{debug, error, info};

use super::actions::ActionsProvider;
use super::dependencies::Dependencies;
use super::factory::{
    construct_community, construct_enterprise, resolve_config, ConstructionStrategy,
    ResolutionRequest, ResolvedConfig,
};
use super::managed::{release_all, ManagedServer};
use crate::core::config::{validate_path, validate_property_key, validate_rest_api_path};
use crate::core::{FixtureError, FixtureResult};
use crate::monitoring::LogSink;

#[derive(Clone)]
pub struct FixtureBuilder {
    strategy: ConstructionStrategy,
    log_sink: LogSink,
    request: ResolutionRequest,
    actions_override: Option<Arc<dyn ActionsProvider>>,
}

impl FixtureBuilder {
    /// Builder for community servers, logging nowhere
    pub fn community() -> Self {
        Self::community_with_log(LogSink::null())
    }

    pub fn community_with_log(log_sink: LogSink) -> Self {
        Self::with_strategy(construct_community, log_sink)
    }

    /// Builder for enterprise servers, logging nowhere
    pub fn enterprise() -> Self {
        Self::enterprise_with_log(LogSink::null())
    }

    pub fn enterprise_with_log(log_sink: LogSink) -> Self {
        Self::with_strategy(construct_enterprise, log_sink)
    }

    pub fn with_strategy(strategy: ConstructionStrategy, log_sink: LogSink) -> Self {
        Self {
            strategy,
            log_sink,
            request: ResolutionRequest::default(),
            actions_override: None,
        }
    }

    // === Configuration ===

    /// Data directory for the server. The directory belongs to the caller
    /// and is left in place on stop.
    pub fn using_data_dir(mut self, data_dir: impl AsRef<Path>) -> FixtureResult<Self> {
        let data_dir = data_dir.as_ref();
        validate_path("data directory", data_dir)?;
        self.request.data_dir = Some(data_dir.to_path_buf());
        Ok(self)
    }

    /// Run with an existing config file instead of a generated one. The file
    /// belongs to the caller and is never deleted by the fixture.
    pub fn using_config_file(mut self, config_file: impl AsRef<Path>) -> FixtureResult<Self> {
        let config_file = config_file.as_ref();
        validate_path("config file", config_file)?;
        self.request.config_file = Some(config_file.to_path_buf());
        Ok(self)
    }

    pub fn with_log_sink(mut self, log_sink: LogSink) -> Self {
        self.log_sink = log_sink;
        self
    }

    pub fn on_address(mut self, address: IpAddr) -> Self {
        self.request.bind_address = Some(address);
        self
    }

    pub fn on_port(mut self, port: u16) -> Self {
        self.request.port = Some(port);
        self
    }

    pub fn with_rest_api_path(mut self, path: impl Into<String>) -> FixtureResult<Self> {
        let path = path.into();
        validate_rest_api_path(&path)?;
        self.request.rest_api_path = Some(path);
        Ok(self)
    }

    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> FixtureResult<Self> {
        let key = key.into();
        validate_property_key(&key)?;
        self.request.properties.insert(key, value.into());
        Ok(self)
    }

    /// Replace the edition's default request-handling actions
    pub fn with_actions_provider(mut self, provider: Arc<dyn ActionsProvider>) -> Self {
        self.actions_override = Some(provider);
        self
    }

    pub fn without_actions_override(mut self) -> Self {
        self.actions_override = None;
        self
    }

    // === Inspection ===

    pub fn data_dir(&self) -> Option<&Path> {
        self.request.data_dir.as_deref()
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.request.config_file.as_deref()
    }

    pub fn log_sink(&self) -> &LogSink {
        &self.log_sink
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.request.properties
    }

    pub fn has_actions_override(&self) -> bool {
        self.actions_override.is_some()
    }

    // === Build ===

    /// Resolve configuration, construct the server through the builder's
    /// strategy and start it.
    ///
    /// Every call produces a new, independent instance with its own
    /// generated resources. A failure leaves nothing generated behind.
    pub async fn build(&self) -> FixtureResult<ManagedServer> {
        let dispatch = self.log_sink.dispatch().clone();

        async {
            info!("🔧 Building test server");
            let ResolvedConfig {
                config,
                config_file,
                generated,
            } = resolve_config(&self.request, &self.log_sink)?;

            let mut dependencies = Dependencies::new(self.log_sink.clone());
            if let Some(provider) = &self.actions_override {
                debug!("Using overridden database actions provider");
                dependencies = dependencies.with_actions_provider(provider.clone());
            }

            let mut server = match (self.strategy)(config_file.as_deref(), config, dependencies) {
                Ok(server) => server,
                Err(e) => {
                    error!("Failed to construct test server: {}", e);
                    release_all(generated);
                    return Err(FixtureError::Construction(e));
                }
            };

            if let Err(e) = server.start().await {
                error!("Failed to start test server: {}", e);
                release_all(generated);
                return Err(FixtureError::Construction(e));
            }

            info!(
                "🎉 Test server ready ({} edition, {} generated resource(s))",
                server.edition(),
                generated.len()
            );
            Ok(ManagedServer::new(server, generated, self.log_sink.clone()))
        }
        .with_subscriber(dispatch)
        .await
    }
}

impl std::fmt::Debug for FixtureBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixtureBuilder")
            .field("log_sink", &self.log_sink)
            .field("request", &self.request)
            .field("actions_override", &self.actions_override.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Config, ConfigError};
    use crate::server::actions::CommunityActionsProvider;
    use proptest::prelude::*;
    use std::path::PathBuf;

    fn preview(builder: &FixtureBuilder) -> Config {
        let mut config = Config::default();
        builder.request.apply_to(&mut config);
        config
    }

    #[test]
    fn test_builder_chaining() {
        let builder = FixtureBuilder::community()
            .using_data_dir("/tmp/t1")
            .unwrap()
            .on_port(7474)
            .with_rest_api_path("/api")
            .unwrap()
            .with_property("dbms.mode", "SINGLE")
            .unwrap();

        assert_eq!(builder.data_dir(), Some(Path::new("/tmp/t1")));
        assert_eq!(builder.config_file(), None);
        assert_eq!(builder.properties()["dbms.mode"], "SINGLE");
        assert!(builder.log_sink().is_null());

        let config = preview(&builder);
        assert_eq!(config.server.port, 7474);
        assert_eq!(config.api.rest_api_path, "/api");
    }

    #[test]
    fn test_invalid_options_fail_at_the_configuring_call() {
        let empty_dir = FixtureBuilder::community().using_data_dir("");
        assert!(matches!(
            empty_dir,
            Err(FixtureError::Config(ConfigError::InvalidOption {
                option: "data directory",
                ..
            }))
        ));

        assert!(FixtureBuilder::community().using_config_file("").is_err());
        assert!(FixtureBuilder::community().with_rest_api_path("api").is_err());
        assert!(FixtureBuilder::community().with_property("", "x").is_err());
        assert!(FixtureBuilder::community()
            .with_property("a b", "x")
            .is_err());
    }

    #[test]
    fn test_actions_override_can_be_cleared() {
        let builder = FixtureBuilder::enterprise()
            .with_actions_provider(Arc::new(CommunityActionsProvider));
        assert!(builder.has_actions_override());
        assert!(!builder.without_actions_override().has_actions_override());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Port(u16),
        Address(IpAddr),
        RestPath(String),
        Property(String),
        DataDir(String),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<u16>().prop_map(Op::Port),
            any::<IpAddr>().prop_map(Op::Address),
            "/[a-z]{1,8}(/[a-z]{1,8})?".prop_map(Op::RestPath),
            "[a-z0-9]{0,6}".prop_map(Op::Property),
            "/tmp/[a-z]{1,8}".prop_map(Op::DataDir),
        ]
    }

    proptest! {
        #[test]
        fn test_last_set_value_wins(ops in proptest::collection::vec(op_strategy(), 1..24)) {
            let mut builder = FixtureBuilder::community();
            for op in &ops {
                builder = match op.clone() {
                    Op::Port(port) => builder.on_port(port),
                    Op::Address(address) => builder.on_address(address),
                    Op::RestPath(path) => builder.with_rest_api_path(path).unwrap(),
                    Op::Property(value) => builder.with_property("test.value", value).unwrap(),
                    Op::DataDir(dir) => builder.using_data_dir(dir).unwrap(),
                };
            }

            let config = preview(&builder);
            let defaults = Config::default();

            let last_port = ops.iter().rev().find_map(|op| match op { Op::Port(p) => Some(*p), _ => None });
            prop_assert_eq!(config.server.port, last_port.unwrap_or(defaults.server.port));

            let last_address = ops.iter().rev().find_map(|op| match op { Op::Address(a) => Some(*a), _ => None });
            prop_assert_eq!(config.server.bind_address, last_address.unwrap_or(defaults.server.bind_address));

            let last_path = ops.iter().rev().find_map(|op| match op { Op::RestPath(p) => Some(p.clone()), _ => None });
            prop_assert_eq!(config.api.rest_api_path, last_path.unwrap_or(defaults.api.rest_api_path));

            let last_property = ops.iter().rev().find_map(|op| match op { Op::Property(v) => Some(v.clone()), _ => None });
            prop_assert_eq!(config.properties.get("test.value").cloned(), last_property);

            let last_dir = ops.iter().rev().find_map(|op| match op { Op::DataDir(d) => Some(PathBuf::from(d)), _ => None });
            prop_assert_eq!(config.server.data_dir, last_dir.unwrap_or(defaults.server.data_dir));
        }
    }
}
