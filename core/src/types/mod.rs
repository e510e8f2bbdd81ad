pub mod config;

pub use config::{FieldConfig, Settings};
