// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Configuration model and error types shared by the server and the fixtures

pub mod config;
pub mod error;

pub use config::{ApiConfig, Config, MonitoringConfig, ServerConfig, StorageConfig};
pub use error::{
    ConfigError, FixtureError, FixtureResult, NetworkError, ServerError, ServerResult,
    StorageError,
};
