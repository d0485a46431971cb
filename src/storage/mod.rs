// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Storage engine opened by the server in its data directory

pub mod engine;

pub use engine::{Record, StorageEngine};
