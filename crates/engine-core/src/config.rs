use crate::{error::ConfigError, mapping::TableMapping};
use serde::Deserialize;
use std::{collections::HashMap, path::Path, time::Duration};

/// Environment variable consulted when `endpoint.token` is absent, so the
/// secret can stay out of the config file.
pub const TOKEN_ENV: &str = "SYPHON_ENDPOINT_TOKEN";

/// Job configuration, loaded from a JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    pub endpoint: EndpointConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub mappings: TableMapping,
    #[serde(default)]
    pub groups: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub defaults: TransferDefaults,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub export_dir: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferDefaults {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: usize,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_true")]
    pub stamp_source_metadata: bool,
}

impl Default for TransferDefaults {
    fn default() -> Self {
        TransferDefaults {
            workers: default_workers(),
            batch_size: default_batch_size(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            stamp_source_metadata: true,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> usize {
    500
}

fn default_workers() -> usize {
    20
}

fn default_batch_size() -> usize {
    100
}

fn default_retry_attempts() -> usize {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

impl JobConfig {
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Fails fast on anything that would make the job nonsensical, before
    /// any I/O happens.
    pub fn validate(&self, workers: usize, batch_size: usize) -> Result<(), ConfigError> {
        if self.endpoint.url.trim().is_empty() {
            return Err(ConfigError::MissingEndpointUrl);
        }
        if self.source.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(())
    }

    pub fn resolve_token(&self) -> Result<String, ConfigError> {
        if let Some(token) = &self.endpoint.token
            && !token.is_empty()
        {
            return Ok(token.clone());
        }
        std::env::var(TOKEN_ENV).map_err(|_| ConfigError::MissingToken(TOKEN_ENV))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.endpoint.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.defaults.retry_delay_ms)
    }

    /// Expands explicit table names and named groups into one deduplicated
    /// list, preserving selection order.
    pub fn select_tables(
        &self,
        tables: &[String],
        groups: &[String],
    ) -> Result<Vec<String>, ConfigError> {
        let mut selected: Vec<String> = Vec::new();
        let mut push = |table: &str| {
            if !selected.iter().any(|t| t == table) {
                selected.push(table.to_string());
            }
        };

        for table in tables {
            push(table);
        }
        for group in groups {
            let members = self
                .groups
                .get(group)
                .ok_or_else(|| ConfigError::UnknownGroup(group.clone()))?;
            for table in members {
                push(table);
            }
        }

        if selected.is_empty() {
            return Err(ConfigError::NoTables);
        }
        Ok(selected)
    }
}
