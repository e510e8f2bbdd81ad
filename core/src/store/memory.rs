//! In-memory backend.
//!
//! Records live in a sorted map guarded by an `RwLock`, each behind its own
//! `Mutex`. Inserts and deletes take the map write lock; updates hold the
//! map read lock plus the record lock, so updates to different keys run in
//! parallel while updates to the same key serialise.

use std::collections::BTreeMap;
use std::sync::{Mutex, RwLock};

use crate::errors::BackendError;

use super::backend::{Backend, Document};


#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: RwLock<BTreeMap<String, Mutex<Document>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend::default()
    }

    pub fn len(&self) -> Result<usize, BackendError> {
        let records = self.records.read().map_err(|_| BackendError::Poisoned)?;
        Ok(records.len())
    }

    pub fn is_empty(&self) -> Result<bool, BackendError> {
        Ok(self.len()? == 0)
    }
}

impl Backend for MemoryBackend {
    fn insert_new(&self, key: &str, doc: Document) -> Result<bool, BackendError> {
        let mut records = self.records.write().map_err(|_| BackendError::Poisoned)?;
        if records.contains_key(key) {
            return Ok(false);
        }
        records.insert(key.to_string(), Mutex::new(doc));
        Ok(true)
    }

    fn get(&self, key: &str) -> Result<Option<Document>, BackendError> {
        let records = self.records.read().map_err(|_| BackendError::Poisoned)?;
        match records.get(key) {
            Some(record) => {
                let doc = record.lock().map_err(|_| BackendError::Poisoned)?;
                Ok(Some(doc.clone()))
            }
            None => Ok(None),
        }
    }

    fn keys(&self) -> Result<Vec<String>, BackendError> {
        let records = self.records.read().map_err(|_| BackendError::Poisoned)?;
        Ok(records.keys().cloned().collect())
    }

    fn scan(&self) -> Result<Vec<Document>, BackendError> {
        let records = self.records.read().map_err(|_| BackendError::Poisoned)?;
        records
            .values()
            .map(|record| {
                record
                    .lock()
                    .map(|doc| doc.clone())
                    .map_err(|_| BackendError::Poisoned)
            })
            .collect()
    }

    fn update(
        &self,
        key: &str,
        apply: &dyn Fn(&mut Document),
    ) -> Result<Option<Document>, BackendError> {
        let records = self.records.read().map_err(|_| BackendError::Poisoned)?;
        let Some(record) = records.get(key) else {
            return Ok(None);
        };
        let mut doc = record.lock().map_err(|_| BackendError::Poisoned)?;
        apply(&mut doc);
        Ok(Some(doc.clone()))
    }

    fn delete(&self, key: &str) -> Result<usize, BackendError> {
        let mut records = self.records.write().map_err(|_| BackendError::Poisoned)?;
        Ok(usize::from(records.remove(key).is_some()))
    }
}
