use std::collections::BTreeSet;
use std::path::Path;

use crate::errors::ConfigError;
use crate::schema::ValueKind;
use crate::types::config::{default_max_message_size, default_prefix, FieldConfig, Settings};


/// The stock site schema.
pub fn default_settings() -> Settings {
    Settings {
        command_prefix: default_prefix(),
        max_message_size: default_max_message_size(),
        database: None,
        fields: default_fields(),
        layout: default_layout(),
        always_uppercase: default_always_uppercase(),
    }
}

pub(crate) fn default_fields() -> Vec<FieldConfig> {
    let field = |label: &str, kind: ValueKind| FieldConfig {
        label: label.into(),
        column: label.to_lowercase(),
        kind,
    };
    vec![
        field("Name", ValueKind::String),
        field("Country", ValueKind::String),
        field("Affils", ValueKind::StringSet),
        field("Speed", ValueKind::Integer),
        field("Size", ValueKind::Float),
        field("Users", ValueKind::StringSet),
        field("Allows", ValueKind::StringSet),
        field("Filters", ValueKind::StringSet),
        field("Banned", ValueKind::StringSet),
        field("Imdb", ValueKind::StringSet),
        field("Comment", ValueKind::String),
    ]
}

pub(crate) fn default_layout() -> Vec<Vec<String>> {
    let rows: [&[&str]; 9] = [
        &["name"],
        &["country", "speed", "size"],
        &["affils"],
        &["users"],
        &["allows"],
        &["filters"],
        &["banned"],
        &["imdb"],
        &["comment"],
    ];
    rows.iter().map(|row| columns(row)).collect()
}

pub(crate) fn default_always_uppercase() -> Vec<String> {
    columns(&["affils", "allows", "country", "name"])
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|c| c.to_string()).collect()
}


/// Load `Settings` from a YAML file and check the scalar options.
/// Schema-level checks happen in `SchemaRegistry::from_settings`.
pub fn load(path: &Path) -> Result<Settings, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content)
}


/// Load settings if the file exists, otherwise fall back to the defaults.
pub fn load_or_default(path: &Path) -> Result<Settings, ConfigError> {
    if path.exists() {
        load(path)
    } else {
        tracing::info!(path = %path.display(), "no settings file, using defaults");
        Ok(default_settings())
    }
}


/// Save `Settings` as YAML.
pub fn save(path: &Path, settings: &Settings) -> Result<(), ConfigError> {
    let content = serde_yaml::to_string(settings)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}


/// Parse settings from a YAML string. Missing keys take the stock values.
///
/// When a file declares its own `fields` but no `always_uppercase`, the
/// stock uppercase list is narrowed to the columns that file declares.
pub fn parse(content: &str) -> Result<Settings, ConfigError> {
    let mut raw: serde_yaml::Value = serde_yaml::from_str(content)?;
    if raw.is_null() {
        raw = serde_yaml::Value::Mapping(serde_yaml::Mapping::new());
    }
    let explicit_uppercase = raw.get("always_uppercase").is_some();
    let mut settings: Settings = serde_yaml::from_value(raw)?;
    if !explicit_uppercase {
        let declared: BTreeSet<String> =
            settings.fields.iter().map(|f| f.column.clone()).collect();
        settings.always_uppercase.retain(|c| declared.contains(c));
    }
    validate(&settings)?;
    Ok(settings)
}


fn validate(settings: &Settings) -> Result<(), ConfigError> {
    if settings.max_message_size == 0 {
        return Err(ConfigError::ZeroMessageSize);
    }
    if settings.command_prefix.is_whitespace() {
        return Err(ConfigError::BlankPrefix);
    }
    Ok(())
}
