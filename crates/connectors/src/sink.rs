use crate::error::SinkError;
use async_trait::async_trait;
use model::records::record::Record;
use serde_json::json;
use std::time::Duration;
use tracing::trace;

/// Remote destination for decoded records. The call is an upsert keyed by
/// record identity, so repeating it after a timeout is always safe.
#[async_trait]
pub trait UpsertSink: Send + Sync {
    async fn upsert(&self, table: &str, record: &Record) -> Result<(), SinkError>;
}

/// HTTP webhook sink: posts one record per request as
/// `{"table": ..., "action": "UPSERT", "data": ...}` with bearer auth.
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl WebhookSink {
    pub fn new(url: String, token: String, timeout: Duration) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(WebhookSink { client, url, token })
    }
}

#[async_trait]
impl UpsertSink for WebhookSink {
    async fn upsert(&self, table: &str, record: &Record) -> Result<(), SinkError> {
        let payload = json!({
            "table": table,
            "action": "UPSERT",
            "data": record.to_json(),
        });

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            trace!(table, record = %record.id(), "upserted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(SinkError::Status {
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        })
    }
}

/// Dry-run sink: accepts every record without touching the network, so a
/// job can report hypothetical counts.
pub struct NullSink;

#[async_trait]
impl UpsertSink for NullSink {
    async fn upsert(&self, _table: &str, _record: &Record) -> Result<(), SinkError> {
        Ok(())
    }
}
