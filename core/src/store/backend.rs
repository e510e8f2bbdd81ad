//! Persistence backends for the directory store.
//!
//! Provides the `Backend` trait and implementations for SQLite (production)
//! and memory (testing, ephemeral runs). Every mutating primitive is atomic
//! with respect to other callers touching the same key; the store never does
//! a client-side read followed by a separate write.

use serde_json::{Map, Value};

use crate::errors::BackendError;

/// A persisted site document: `{ "name": <key>, <field>: scalar | [string] }`.
pub type Document = Map<String, Value>;


/// Atomic document primitives addressed by primary key.
pub trait Backend: Send + Sync {
    /// Insert `doc` under `key` unless the key is present. Returns whether
    /// the insert happened; of two concurrent inserts of one key, at most
    /// one returns `true`.
    fn insert_new(&self, key: &str, doc: Document) -> Result<bool, BackendError>;

    /// Point lookup.
    fn get(&self, key: &str) -> Result<Option<Document>, BackendError>;

    /// All keys, sorted ascending, from a single consistent snapshot.
    fn keys(&self) -> Result<Vec<String>, BackendError>;

    /// All documents, sorted by key, from a single consistent snapshot.
    fn scan(&self) -> Result<Vec<Document>, BackendError>;

    /// Atomically apply `apply` to the document under `key` and persist the
    /// result. Returns the updated document, or `None` if the key is absent.
    fn update(
        &self,
        key: &str,
        apply: &dyn Fn(&mut Document),
    ) -> Result<Option<Document>, BackendError>;

    /// Remove the document under `key`, returning how many were removed.
    fn delete(&self, key: &str) -> Result<usize, BackendError>;
}
