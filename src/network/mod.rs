// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Network layer for ProximaDB

pub mod rest;

pub use rest::{RestServer, RunningRestServer};
