//! Schema registry: field kinds, labels, layout and normalization.

pub mod kind;
pub mod registry;

pub use kind::{FieldValue, ValueKind};
pub use registry::{FieldDef, SchemaRegistry, KEY_FIELD};
