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

//! Replacing the request-handling actions through the fixture

mod common;

use common::{
    create_record_over_http, generated_config_files, init_test_env, RecordingActionsProvider,
};
use proximadb_testkit::core::ServerResult;
use proximadb_testkit::server::DatabaseActions;
use proximadb_testkit::storage::StorageEngine;
use proximadb_testkit::server::NODE_PROPERTY;
use proximadb_testkit::{
    ActionsProvider, Config, DatabaseServer, Dependencies, Edition, FixtureBuilder, FixtureError,
    LogSink, ServerError,
};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_override_replaces_community_actions() {
    init_test_env();
    let temp_dir = TempDir::new().unwrap();
    let provider = Arc::new(RecordingActionsProvider::default());

    let mut server = FixtureBuilder::community()
        .using_data_dir(temp_dir.path())
        .unwrap()
        .with_actions_provider(provider.clone())
        .build()
        .await
        .unwrap();

    assert_eq!(server.edition(), Edition::Community);
    assert_eq!(server.database_actions().unwrap().name(), "recording");
    assert_eq!(provider.instances(), 1);

    let client = reqwest::Client::new();
    let base_url = server.base_url().unwrap();
    let discovery: Value = client
        .get(&base_url)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(discovery["data"]["actions"], "recording");

    create_record_over_http(&client, &base_url, json!({"via": "http"})).await;
    assert_eq!(provider.created(), 1);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_enterprise_default_actions() {
    init_test_env();
    let temp_dir = TempDir::new().unwrap();

    let mut server = FixtureBuilder::enterprise()
        .using_data_dir(temp_dir.path())
        .unwrap()
        .build()
        .await
        .unwrap();

    let actions = server.database_actions().unwrap();
    assert_eq!(server.edition(), Edition::Enterprise);
    assert_eq!(actions.name(), "enterprise");

    let client = reqwest::Client::new();
    let base_url = server.base_url().unwrap();
    let id = create_record_over_http(&client, &base_url, json!({})).await;
    let record = actions.get_record(&id).unwrap().unwrap();
    assert_eq!(
        record.properties[NODE_PROPERTY],
        server.config().server.node_id.as_str()
    );

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_override_applies_to_enterprise() {
    init_test_env();
    let provider = Arc::new(RecordingActionsProvider::default());

    let mut server = FixtureBuilder::enterprise()
        .with_actions_provider(provider.clone())
        .build()
        .await
        .unwrap();

    assert_eq!(server.edition(), Edition::Enterprise);
    assert_eq!(server.database_actions().unwrap().name(), "recording");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_community_default_actions() {
    init_test_env();
    let provider = Arc::new(RecordingActionsProvider::default());

    // An override that is cleared again leaves the default in place
    let mut server = FixtureBuilder::community()
        .with_actions_provider(provider.clone())
        .without_actions_override()
        .build()
        .await
        .unwrap();

    assert_eq!(server.database_actions().unwrap().name(), "community");
    assert_eq!(provider.instances(), 0);

    server.stop().await.unwrap();
}

fn construct_renamed(
    config_file: Option<&Path>,
    mut config: Config,
    dependencies: Dependencies,
) -> ServerResult<DatabaseServer> {
    config.server.node_id = "custom-strategy".to_string();
    proximadb_testkit::construct_enterprise(config_file, config, dependencies)
}

#[tokio::test]
async fn test_custom_strategy() {
    init_test_env();
    let mut server = FixtureBuilder::with_strategy(construct_renamed, LogSink::null())
        .build()
        .await
        .unwrap();

    assert_eq!(server.edition(), Edition::Enterprise);
    assert_eq!(server.config().server.node_id, "custom-strategy");
    assert!(server.generated_config_file().is_some());

    server.stop().await.unwrap();
}

struct FailingActionsProvider;

impl ActionsProvider for FailingActionsProvider {
    fn create_actions(
        &self,
        _storage: Arc<StorageEngine>,
        _config: &Config,
    ) -> anyhow::Result<Arc<dyn DatabaseActions>> {
        anyhow::bail!("actions unavailable")
    }
}

#[tokio::test]
async fn test_failing_provider_fails_build_cleanly() {
    init_test_env();
    let temp_dir = TempDir::new().unwrap();
    let builder = FixtureBuilder::community()
        .using_data_dir(temp_dir.path())
        .unwrap();

    let result = builder
        .clone()
        .with_actions_provider(Arc::new(FailingActionsProvider))
        .build()
        .await;
    assert!(matches!(
        result,
        Err(FixtureError::Construction(ServerError::Actions(_)))
    ));
    assert!(generated_config_files(temp_dir.path()).is_empty());

    // Storage was unlocked again, so the same directory still works
    let mut server = builder.build().await.unwrap();
    server.stop().await.unwrap();
}
