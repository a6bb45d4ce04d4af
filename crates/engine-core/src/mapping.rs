use serde::Deserialize;
use std::collections::HashMap;
use tracing::warn;

/// Static source-to-destination table name mapping, supplied by the job
/// config. Unmapped tables fall back to a deterministic derived name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct TableMapping {
    mappings: HashMap<String, String>,
}

impl TableMapping {
    pub fn new(mappings: HashMap<String, String>) -> Self {
        TableMapping { mappings }
    }

    pub fn resolve(&self, source_table: &str) -> String {
        if let Some(destination) = self.mappings.get(source_table) {
            return destination.clone();
        }

        let derived = derive_name(source_table);
        warn!(
            table = source_table,
            derived = %derived,
            "no mapping for table, using derived name"
        );
        derived
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.mappings.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

fn derive_name(source: &str) -> String {
    source.to_ascii_lowercase().replace('-', "_")
}
