//! Reply formatting: bold markup and layout-driven site rendering.

use crate::schema::{SchemaRegistry, KEY_FIELD};
use crate::store::SiteRecord;

/// IRC bold toggle.
const BOLD: char = '\x02';


pub fn bold(text: &str) -> String {
    format!("{}{}{}", BOLD, text, BOLD)
}


/// Render a site as one line per layout row: `<label>: <value>` pairs joined
/// by spaces. Unset attributes render empty; sets render sorted.
pub fn render_site(record: &SiteRecord, schema: &SchemaRegistry) -> Vec<String> {
    schema
        .layout()
        .iter()
        .map(|row| {
            row.iter()
                .map(|field| {
                    let label = schema.field(field).map_or(field.as_str(), |f| f.label.as_str());
                    let value = if field == KEY_FIELD {
                        record.name.clone()
                    } else {
                        record.get(field).map(|v| v.to_string()).unwrap_or_default()
                    };
                    format!("{}: {}", bold(label), value)
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}
