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

//! # ProximaDB Test Kit
//!
//! In-process ProximaDB servers for integration tests.
//!
//! A [`FixtureBuilder`] collects the options a test cares about (data
//! directory, config file, listen address, REST path, arbitrary
//! properties, log sink) and builds a started [`ManagedServer`]. When the
//! test does not supply a config file, one is generated inside the data
//! directory; stopping the server removes it again, along with a data
//! directory the fixture had to create.
//!
//! ```no_run
//! use proximadb_testkit::{FixtureBuilder, LogSink};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = FixtureBuilder::enterprise_with_log(LogSink::global())
//!     .on_port(0)
//!     .build()
//!     .await?;
//!
//! let actions = server.database_actions().expect("running server");
//! assert_eq!(actions.name(), "enterprise");
//!
//! server.stop().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: configuration model and error types
//! - [`monitoring`]: log sinks and test tracing setup
//! - [`network`]: the REST listener
//! - [`server`]: the database server, construction strategies and fixtures
//! - [`storage`]: the record store kept in the data directory

pub mod core;
pub mod monitoring;
pub mod network;
pub mod server;
pub mod storage;

pub use crate::core::{Config, ConfigError, FixtureError, FixtureResult, ServerError, ServerResult};
pub use crate::monitoring::{init_test_tracing, CapturedLogs, LogSink};
pub use crate::server::{
    construct_community, construct_enterprise, ActionsProvider, ConstructionStrategy,
    DatabaseActions, DatabaseServer, Dependencies, Edition, FixtureBuilder, GeneratedResource,
    ManagedServer, ServerState,
};
