// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! ProximaDB Server Module
//!
//! The database server itself, plus the fixture layer tests use to build,
//! start and dispose of server instances.

pub mod actions;
pub mod builder;
pub mod dependencies;
pub mod factory;
pub mod instance;
pub mod managed;

// Re-export main types for easier use
pub use actions::{
    ActionsProvider, CommunityActionsProvider, CommunityDatabaseActions, DatabaseActions,
    EnterpriseActionsProvider, EnterpriseDatabaseActions, NODE_PROPERTY,
};
pub use builder::FixtureBuilder;
pub use dependencies::Dependencies;
pub use factory::{
    construct_community, construct_enterprise, resolve_config, ConstructionStrategy,
    ResolutionRequest, ResolvedConfig,
};
pub use instance::{DatabaseServer, Edition};
pub use managed::{GeneratedResource, ManagedServer, ServerState};
