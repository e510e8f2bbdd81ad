use std::io;
use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Fatal problems found while loading or validating settings. None of these
/// are recoverable at runtime; the host refuses to start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid settings yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("field '{0}' is defined more than once")]
    DuplicateField(String),
    #[error("layout references unknown field '{0}'")]
    UnknownLayoutField(String),
    #[error("always-uppercase field '{0}' does not exist")]
    UnknownUppercaseField(String),
    #[error("always-uppercase field '{field}' has kind {kind}, expected string or list")]
    UppercaseNotText { field: String, kind: String },
    #[error("primary key field 'name' is missing or not a string")]
    MissingKeyField,
    #[error("max_message_size must be greater than zero")]
    ZeroMessageSize,
    #[error("command prefix must not be whitespace")]
    BlankPrefix,
}

// ---------------------------------------------------------------------------
// Backend errors
// ---------------------------------------------------------------------------

/// Failures of the persistence engine itself.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("document encoding: {0}")]
    Json(#[from] serde_json::Error),
    #[error("document for '{0}' is not a json object")]
    CorruptDocument(String),
    #[error("backend lock poisoned")]
    Poisoned,
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

/// Errors raised by `DirectoryStore` operations.
///
/// A missing target record is deliberately absent from this list; see
/// `store::Mutation::Skipped`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("site '{name}' already exists")]
    AlreadyExists { name: String },
    #[error("'{field}' is not a valid field")]
    InvalidField { field: String },
    #[error("field '{field}' must be of type {expected}")]
    InvalidType { field: String, expected: &'static str },
    #[error("field '{field}' is not a list field")]
    NotASet { field: String },
    #[error("field '{field}' cannot be changed")]
    ReadOnlyField { field: String },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

// ---------------------------------------------------------------------------
// Startup errors
// ---------------------------------------------------------------------------

/// Anything that stops a dispatcher from being built.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot open site database: {0}")]
    Backend(#[from] BackendError),
}
