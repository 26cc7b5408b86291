//! Output formatting utilities

use crate::domain::schema::TagDefinition;
use crate::domain::TagRegistry;
use crate::error::{ConfigError, Result};

/// Format the registry as one `name  kind  source` line per tag
pub fn format_tag_list(registry: &TagRegistry) -> String {
    if registry.is_empty() {
        return "No tags found".to_string();
    }

    let width = registry.names().map(str::len).max().unwrap_or(0);
    let mut output = String::new();
    for def in registry.iter() {
        output.push_str(&format!(
            "{:<width$}  {:<8}  {}\n",
            def.name,
            def.implementation.kind(),
            def.provenance.source.display(),
            width = width
        ));
    }
    output
}

/// Format one definition as pretty JSON
pub fn format_tag_json(def: &TagDefinition) -> Result<String> {
    serde_json::to_string_pretty(def).map_err(|e| {
        ConfigError::Parse {
            path: def.provenance.source.clone(),
            message: e.to_string(),
        }
        .into()
    })
}
