//! Site directory: typed records over pluggable persistence.

pub mod backend;
pub mod directory;
pub mod memory;
pub mod sqlite;

pub use backend::{Backend, Document};
pub use directory::{DirectoryStore, Mutation, SiteRecord};
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

use std::path::Path;

use crate::errors::BackendError;

/// Open the backend named by the `database` setting: SQLite when a path is
/// given, memory otherwise.
pub fn open_backend(database: Option<&str>) -> Result<Box<dyn Backend>, BackendError> {
    match database {
        Some(path) => {
            tracing::info!(path, "opening sqlite site database");
            Ok(Box::new(SqliteBackend::open(Path::new(path))?))
        }
        None => {
            tracing::info!("using in-memory site database");
            Ok(Box::new(MemoryBackend::new()))
        }
    }
}
