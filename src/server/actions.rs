// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Request-handling actions.
//!
//! Every REST handler goes through a [`DatabaseActions`] object. The server
//! obtains it from the [`ActionsProvider`] in its dependency graph once the
//! storage engine is open, so replacing the provider replaces what the
//! server does with each request.

use serde_json::{json, Map, Value};
use std::sync::Arc;
use uuid::Uuid;

use super::instance::Edition;
use crate::core::{Config, ServerResult};
use crate::storage::{Record, StorageEngine};

/// Property stamped on records created through enterprise actions
pub const NODE_PROPERTY: &str = "_node";

pub trait DatabaseActions: Send + Sync {
    /// Short identifier of the implementation, reported by the discovery document
    fn name(&self) -> &str;

    fn edition(&self) -> Edition;

    fn create_record(&self, properties: Map<String, Value>) -> ServerResult<Record>;

    fn get_record(&self, id: &Uuid) -> ServerResult<Option<Record>>;

    /// Returns false when there was nothing to delete
    fn delete_record(&self, id: &Uuid) -> ServerResult<bool>;

    fn record_count(&self) -> usize;

    fn describe(&self) -> Value {
        json!({
            "actions": self.name(),
            "edition": self.edition(),
            "records": self.record_count(),
        })
    }
}

pub trait ActionsProvider: Send + Sync {
    /// Called by the server on every start, once storage is open
    fn create_actions(
        &self,
        storage: Arc<StorageEngine>,
        config: &Config,
    ) -> anyhow::Result<Arc<dyn DatabaseActions>>;
}

pub struct CommunityDatabaseActions {
    storage: Arc<StorageEngine>,
}

impl CommunityDatabaseActions {
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self { storage }
    }
}

impl DatabaseActions for CommunityDatabaseActions {
    fn name(&self) -> &str {
        "community"
    }

    fn edition(&self) -> Edition {
        Edition::Community
    }

    fn create_record(&self, properties: Map<String, Value>) -> ServerResult<Record> {
        Ok(self.storage.insert(properties)?)
    }

    fn get_record(&self, id: &Uuid) -> ServerResult<Option<Record>> {
        Ok(self.storage.get(id)?)
    }

    fn delete_record(&self, id: &Uuid) -> ServerResult<bool> {
        Ok(self.storage.remove(id)?.is_some())
    }

    fn record_count(&self) -> usize {
        self.storage.len()
    }
}

/// Community actions plus node stamping of created records
pub struct EnterpriseDatabaseActions {
    inner: CommunityDatabaseActions,
    node_id: String,
}

impl EnterpriseDatabaseActions {
    pub fn new(storage: Arc<StorageEngine>, node_id: impl Into<String>) -> Self {
        Self {
            inner: CommunityDatabaseActions::new(storage),
            node_id: node_id.into(),
        }
    }
}

impl DatabaseActions for EnterpriseDatabaseActions {
    fn name(&self) -> &str {
        "enterprise"
    }

    fn edition(&self) -> Edition {
        Edition::Enterprise
    }

    fn create_record(&self, mut properties: Map<String, Value>) -> ServerResult<Record> {
        properties.insert(NODE_PROPERTY.to_string(), Value::String(self.node_id.clone()));
        self.inner.create_record(properties)
    }

    fn get_record(&self, id: &Uuid) -> ServerResult<Option<Record>> {
        self.inner.get_record(id)
    }

    fn delete_record(&self, id: &Uuid) -> ServerResult<bool> {
        self.inner.delete_record(id)
    }

    fn record_count(&self) -> usize {
        self.inner.record_count()
    }

    fn describe(&self) -> Value {
        json!({
            "actions": self.name(),
            "edition": self.edition(),
            "records": self.record_count(),
            "node_id": self.node_id,
            "capabilities": ["node-stamping"],
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CommunityActionsProvider;

impl ActionsProvider for CommunityActionsProvider {
    fn create_actions(
        &self,
        storage: Arc<StorageEngine>,
        _config: &Config,
    ) -> anyhow::Result<Arc<dyn DatabaseActions>> {
        Ok(Arc::new(CommunityDatabaseActions::new(storage)))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EnterpriseActionsProvider;

impl ActionsProvider for EnterpriseActionsProvider {
    fn create_actions(
        &self,
        storage: Arc<StorageEngine>,
        config: &Config,
    ) -> anyhow::Result<Arc<dyn DatabaseActions>> {
        Ok(Arc::new(EnterpriseDatabaseActions::new(
            storage,
            config.server.node_id.clone(),
        )))
    }
}
