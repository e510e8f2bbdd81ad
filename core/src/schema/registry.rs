//! The schema registry: fixed field definitions, display layout and
//! case-normalization rules, validated once at startup.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::errors::ConfigError;
use crate::types::config::Settings;

use super::kind::ValueKind;

/// Column holding the primary key of every site record.
pub const KEY_FIELD: &str = "name";


/// A field definition: column name, declared kind and display label.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub kind: ValueKind,
    pub label: String,
}


/// Immutable description of the site schema.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    fields: Vec<FieldDef>,
    index: HashMap<String, usize>,
    uppercase: HashSet<String>,
    layout: Vec<Vec<String>>,
}

impl SchemaRegistry {
    /// Build and validate a registry from loaded settings.
    pub fn from_settings(settings: &Settings) -> Result<SchemaRegistry, ConfigError> {
        let mut fields = Vec::with_capacity(settings.fields.len());
        let mut index = HashMap::new();
        for f in &settings.fields {
            if index.insert(f.column.clone(), fields.len()).is_some() {
                return Err(ConfigError::DuplicateField(f.column.clone()));
            }
            fields.push(FieldDef {
                name: f.column.clone(),
                kind: f.kind,
                label: f.label.clone(),
            });
        }

        match index.get(KEY_FIELD).map(|&i| fields[i].kind) {
            Some(ValueKind::String) => {}
            _ => return Err(ConfigError::MissingKeyField),
        }

        for name in settings.layout.iter().flatten() {
            if !index.contains_key(name) {
                return Err(ConfigError::UnknownLayoutField(name.clone()));
            }
        }

        let mut uppercase = HashSet::new();
        for name in &settings.always_uppercase {
            let kind = match index.get(name) {
                Some(&i) => fields[i].kind,
                None => return Err(ConfigError::UnknownUppercaseField(name.clone())),
            };
            if !matches!(kind, ValueKind::String | ValueKind::StringSet) {
                return Err(ConfigError::UppercaseNotText {
                    field: name.clone(),
                    kind: kind.type_name().to_string(),
                });
            }
            uppercase.insert(name.clone());
        }

        Ok(SchemaRegistry {
            fields,
            index,
            uppercase,
            layout: settings.layout.clone(),
        })
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Declared kind of a field, `None` if the field is unknown.
    pub fn field_kind(&self, name: &str) -> Option<ValueKind> {
        self.field(name).map(|f| f.kind)
    }

    pub fn is_always_uppercase(&self, name: &str) -> bool {
        self.uppercase.contains(name)
    }

    pub fn valid_field_names(&self) -> BTreeSet<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Field definitions in configuration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn layout(&self) -> &[Vec<String>] {
        &self.layout
    }

    /// Apply the normalization rule for `field` to raw value tokens.
    pub fn normalize(&self, field: &str, values: &[String]) -> Vec<String> {
        if self.is_always_uppercase(field) {
            values.iter().map(|v| v.to_uppercase()).collect()
        } else {
            values.to_vec()
        }
    }

    /// Canonical form of a primary key.
    pub fn normalize_key(&self, name: &str) -> String {
        if self.is_always_uppercase(KEY_FIELD) {
            name.to_uppercase()
        } else {
            name.to_string()
        }
    }
}
