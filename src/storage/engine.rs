// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Record store backing a server's data directory.
//!
//! Layout under the data directory:
//!
//! ```text
//! <data_dir>/storage/records.json   persisted records, rewritten on close
//! <data_dir>/storage/store.lock     present while a server has the store open
//! ```

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::{StorageConfig, StorageError};

pub const STORAGE_DIR: &str = "storage";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: Uuid,
    pub properties: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

pub struct StorageEngine {
    root: PathBuf,
    config: StorageConfig,
    records: RwLock<BTreeMap<Uuid, Record>>,
    open: AtomicBool,
}

impl StorageEngine {
    /// Open the store under `data_dir`, taking its lock file.
    pub fn open(data_dir: &Path, config: &StorageConfig) -> Result<Self, StorageError> {
        let root = data_dir.join(STORAGE_DIR);
        fs::create_dir_all(&root)?;

        let lock_path = root.join(&config.lock_file);
        let mut lock = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::Locked {
                    lock_file: lock_path,
                })
            }
            Err(e) => return Err(e.into()),
        };
        writeln!(lock, "{}", std::process::id())?;

        let store_path = root.join(&config.store_file);
        let records = match Self::load_records(&store_path) {
            Ok(records) => records,
            Err(e) => {
                // Leave the directory openable after a corrupt store
                if let Err(unlock_error) = fs::remove_file(&lock_path) {
                    warn!(
                        "Failed to remove lock file {} after load failure: {}",
                        lock_path.display(),
                        unlock_error
                    );
                }
                return Err(e);
            }
        };
        info!(
            "📂 Storage opened at {} ({} records)",
            root.display(),
            records.len()
        );

        Ok(Self {
            root,
            config: config.clone(),
            records: RwLock::new(records),
            open: AtomicBool::new(true),
        })
    }

    fn load_records(store_path: &Path) -> Result<BTreeMap<Uuid, Record>, StorageError> {
        match fs::read(store_path) {
            Ok(bytes) => {
                let records: Vec<Record> = serde_json::from_slice(&bytes)?;
                Ok(records.into_iter().map(|r| (r.id, r)).collect())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn insert(&self, properties: Map<String, Value>) -> Result<Record, StorageError> {
        self.ensure_open()?;
        let record = Record {
            id: Uuid::new_v4(),
            properties,
            created_at: Utc::now(),
        };
        self.records.write().insert(record.id, record.clone());
        debug!("Inserted record {}", record.id);
        Ok(record)
    }

    pub fn get(&self, id: &Uuid) -> Result<Option<Record>, StorageError> {
        self.ensure_open()?;
        Ok(self.records.read().get(id).cloned())
    }

    pub fn remove(&self, id: &Uuid) -> Result<Option<Record>, StorageError> {
        self.ensure_open()?;
        Ok(self.records.write().remove(id))
    }

    pub fn list(&self) -> Vec<Record> {
        self.records.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(&self.config.lock_file)
    }

    pub fn store_path(&self) -> PathBuf {
        self.root.join(&self.config.store_file)
    }

    /// Persist the records and release the lock. Closing twice is a no-op.
    pub fn close(&self) -> Result<(), StorageError> {
        if !self.open.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        let persisted = self.persist();
        // The lock goes even when persisting failed
        let unlocked = match fs::remove_file(self.lock_path()) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(StorageError::from(e)),
            _ => Ok(()),
        };
        persisted?;
        unlocked?;

        info!("💾 Storage closed at {}", self.root.display());
        Ok(())
    }

    fn persist(&self) -> Result<(), StorageError> {
        let records = self.list();
        let bytes = serde_json::to_vec_pretty(&records)?;

        let staging = self.root.join(format!("{}.tmp", self.config.store_file));
        let mut file = fs::File::create(&staging)?;
        file.write_all(&bytes)?;
        if self.config.sync_on_close {
            file.sync_all()?;
        }
        fs::rename(&staging, self.store_path())?;
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), StorageError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(StorageError::Closed)
        }
    }
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("root", &self.root)
            .field("records", &self.len())
            .field("open", &self.is_open())
            .finish()
    }
}
