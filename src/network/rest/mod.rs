// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! REST API

pub mod handlers;
pub mod server;

pub use handlers::{create_router, AppState, ApiResponse};
pub use server::{RestServer, RunningRestServer};
