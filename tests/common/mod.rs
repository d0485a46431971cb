//! Common utilities for integration tests

#![allow(dead_code)]

use proximadb_testkit::core::{Config, ServerResult};
use proximadb_testkit::server::{CommunityDatabaseActions, DatabaseActions};
use proximadb_testkit::storage::{Record, StorageEngine};
use proximadb_testkit::{ActionsProvider, Edition};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Initialize test environment
pub fn init_test_env() {
    proximadb_testkit::init_test_tracing();
}

/// Generated config files currently present in `dir`
pub fn generated_config_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok().map(|entry| entry.path()))
                .filter(|path| {
                    path.file_name()
                        .map(|name| name.to_string_lossy())
                        .map(|name| name.starts_with("proximadb-") && name.ends_with(".toml"))
                        .unwrap_or(false)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Actions that behave like the community edition and count the records
/// created through them
pub struct RecordingActions {
    inner: CommunityDatabaseActions,
    created: Arc<AtomicUsize>,
}

impl DatabaseActions for RecordingActions {
    fn name(&self) -> &str {
        "recording"
    }

    fn edition(&self) -> Edition {
        Edition::Community
    }

    fn create_record(&self, properties: Map<String, Value>) -> ServerResult<Record> {
        let record = self.inner.create_record(properties)?;
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(record)
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
}

#[derive(Default)]
pub struct RecordingActionsProvider {
    pub created: Arc<AtomicUsize>,
    pub instances: AtomicUsize,
}

impl RecordingActionsProvider {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn instances(&self) -> usize {
        self.instances.load(Ordering::SeqCst)
    }
}

impl ActionsProvider for RecordingActionsProvider {
    fn create_actions(
        &self,
        storage: Arc<StorageEngine>,
        _config: &Config,
    ) -> anyhow::Result<Arc<dyn DatabaseActions>> {
        self.instances.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(RecordingActions {
            inner: CommunityDatabaseActions::new(storage),
            created: self.created.clone(),
        }))
    }
}

/// POST a record through the REST API and return its id
pub async fn create_record_over_http(
    client: &reqwest::Client,
    base_url: &str,
    properties: Value,
) -> Uuid {
    let response = client
        .post(format!("{}/records", base_url))
        .json(&properties)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    body["data"]["id"].as_str().unwrap().parse().unwrap()
}
