use serde::{Deserialize, Serialize};

use crate::schema::ValueKind;

/// One configured field: the column stored in documents, the label shown to
/// users, and the declared kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldConfig {
    pub label: String,
    pub column: String,
    pub kind: ValueKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "default_prefix")]
    pub command_prefix: char,
    /// Largest plaintext chunk handed to the transport, in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// SQLite database file. In-memory store when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default = "crate::settings::default_fields")]
    pub fields: Vec<FieldConfig>,
    /// Display rows, each a list of column names.
    #[serde(default = "crate::settings::default_layout")]
    pub layout: Vec<Vec<String>>,
    #[serde(default = "crate::settings::default_always_uppercase")]
    pub always_uppercase: Vec<String>,
}

pub(crate) fn default_prefix() -> char {
    '!'
}

pub(crate) fn default_max_message_size() -> usize {
    300
}
