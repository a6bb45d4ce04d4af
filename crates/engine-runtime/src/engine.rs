use crate::{
    summary::{JobSummary, TableSummary},
    worker::{FailureLog, TransferWorker},
};
use chrono::Utc;
use connectors::{sink::UpsertSink, source::TableSource};
use engine_core::{
    decode::decode_record,
    mapping::TableMapping,
    planner::plan,
    progress::ProgressTracker,
    retry::RetryPolicy,
    scanner::RecordScanner,
};
use futures::StreamExt;
use model::core::{tagged::RawRecord, value::Value};
use serde_json::Value as JsonValue;
use std::{sync::Arc, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Knobs resolved from config and CLI flags before the engine starts.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub workers: usize,
    pub batch_size: usize,
    pub dry_run: bool,
    pub stamp_metadata: bool,
}

/// Orchestrates a whole job: tables run sequentially, batches within a
/// table run on a bounded set of concurrent workers.
pub struct TransferEngine {
    source: Arc<dyn TableSource>,
    sink: Arc<dyn UpsertSink>,
    mapping: TableMapping,
    retry: RetryPolicy,
    options: EngineOptions,
    progress: ProgressTracker,
    cancel: CancellationToken,
}

impl TransferEngine {
    pub fn new(
        source: Arc<dyn TableSource>,
        sink: Arc<dyn UpsertSink>,
        mapping: TableMapping,
        retry: RetryPolicy,
        options: EngineOptions,
        cancel: CancellationToken,
    ) -> Self {
        TransferEngine {
            source,
            sink,
            mapping,
            retry,
            options,
            progress: ProgressTracker::new(),
            cancel,
        }
    }

    pub async fn run(&self, tables: &[String]) -> JobSummary {
        let started = Instant::now();
        let mut summaries = Vec::with_capacity(tables.len());

        info!(
            tables = tables.len(),
            workers = self.options.workers,
            batch_size = self.options.batch_size,
            dry_run = self.options.dry_run,
            "starting transfer job"
        );

        for table in tables {
            if self.cancel.is_cancelled() {
                warn!(table, "shutdown requested, skipping remaining tables");
                break;
            }
            summaries.push(self.run_table(table).await);
        }

        let summary = JobSummary::from_tables(
            summaries,
            started.elapsed().as_secs_f64(),
            self.cancel.is_cancelled(),
            self.options.dry_run,
        );
        info!(
            records = summary.total_records,
            success = summary.total_success,
            failed = summary.total_failed,
            duration_secs = summary.duration_secs,
            "transfer job finished"
        );
        summary
    }

    async fn run_table(&self, table: &str) -> TableSummary {
        let destination = self.mapping.resolve(table);
        let started = Instant::now();
        info!(table, destination = %destination, "transferring table");

        let scanner = RecordScanner::new(self.source.clone(), self.retry.clone());
        let items = match scanner.scan(table).await {
            Ok(items) => items,
            Err(err) => {
                error!(table, error = %err, "scan failed, table skipped");
                return TableSummary::errored(table.to_string(), destination, err.to_string());
            }
        };

        let total = items.len() as u64;
        let failures = FailureLog::new();
        let mut decode_failures = 0u64;
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

        let mut records = Vec::with_capacity(items.len());
        for item in &items {
            match decode_record(item) {
                Ok(mut record) => {
                    if self.options.stamp_metadata {
                        record.insert("_source_table", Value::String(table.to_string()));
                        record.insert("_import_timestamp", Value::String(timestamp.clone()));
                    }
                    records.push(record);
                }
                Err(err) => {
                    decode_failures += 1;
                    warn!(table, error = %err, "record failed to decode");
                    failures.push(raw_record_id(item), err.to_string());
                }
            }
        }

        let batches = plan(records, self.options.batch_size);
        let batch_count = batches.len() as u64;
        self.progress.begin_table(&destination, batch_count);

        if batches.is_empty() {
            info!(table, "no records to transfer");
        } else {
            let worker = TransferWorker::new(self.sink.clone(), self.retry.clone());
            futures::stream::iter(batches)
                .for_each_concurrent(self.options.workers, |batch| {
                    let worker = &worker;
                    let destination = &destination;
                    let progress = &self.progress;
                    let failures = &failures;
                    let cancel = &self.cancel;
                    async move {
                        if cancel.is_cancelled() {
                            return;
                        }
                        worker
                            .transfer(destination, &batch, progress, failures)
                            .await;
                    }
                })
                .await;
        }

        let progress = self.progress.snapshot(&destination).unwrap_or_default();
        let duration_secs = started.elapsed().as_secs_f64();
        let success = progress.success;
        let failed = progress.failed + decode_failures;
        TableSummary {
            table: table.to_string(),
            destination,
            total,
            success,
            failed,
            batches: batch_count,
            duration_secs,
            records_per_second: if duration_secs > 0.0 {
                success as f64 / duration_secs
            } else {
                0.0
            },
            error: None,
            failure_samples: failures.into_samples(),
        }
    }
}

/// Best-effort identity for a record that never made it past decode. The
/// id field may still be in its tagged wire form.
fn raw_record_id(item: &RawRecord) -> String {
    match item.get("id") {
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Number(n)) => n.to_string(),
        Some(JsonValue::Object(map)) if map.len() == 1 => match map.values().next() {
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Number(n)) => n.to_string(),
            _ => "unknown".to_string(),
        },
        _ => "unknown".to_string(),
    }
}
