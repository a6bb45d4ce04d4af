use crate::engine::{EngineOptions, TransferEngine};
use async_trait::async_trait;
use connectors::{
    error::{ScanError, SinkError},
    sink::UpsertSink,
    source::TableSource,
};
use engine_core::{mapping::TableMapping, retry::RetryPolicy};
use model::{
    core::tagged::RawRecord,
    pagination::{cursor::Cursor, page::ScanPage},
    records::record::Record,
};
use serde_json::json;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio_util::sync::CancellationToken;

fn item(id: usize) -> RawRecord {
    let mut record = RawRecord::new();
    record.insert("id".to_string(), json!({"N": id.to_string()}));
    record.insert("name".to_string(), json!({"S": format!("record-{id}")}));
    record
}

/// In-memory paged source keyed by table name.
struct MockSource {
    tables: HashMap<String, Vec<RawRecord>>,
    page_size: usize,
}

impl MockSource {
    fn with_records(table: &str, count: usize) -> Self {
        MockSource {
            tables: HashMap::from([(table.to_string(), (0..count).map(item).collect())]),
            page_size: 100,
        }
    }
}

#[async_trait]
impl TableSource for MockSource {
    async fn scan_page(&self, table: &str, cursor: Cursor) -> Result<ScanPage, ScanError> {
        let records = self.tables.get(table).ok_or_else(|| ScanError::MissingExport {
            table: table.to_string(),
            path: "<memory>".to_string(),
        })?;
        let offset = match cursor {
            Cursor::None => 0,
            Cursor::Offset { offset } => offset,
            other => return Err(ScanError::InvalidCursor(format!("{other:?}"))),
        };
        let end = (offset + self.page_size).min(records.len());
        let next = if end < records.len() {
            Cursor::Offset { offset: end }
        } else {
            Cursor::None
        };
        Ok(ScanPage {
            items: records[offset..end].to_vec(),
            next,
        })
    }
}

/// Source whose scans always fail with a non-transient error.
struct FailingSource;

#[async_trait]
impl TableSource for FailingSource {
    async fn scan_page(&self, table: &str, _cursor: Cursor) -> Result<ScanPage, ScanError> {
        Err(ScanError::MissingExport {
            table: table.to_string(),
            path: "/nowhere".to_string(),
        })
    }
}

/// Records every upsert it accepts.
#[derive(Default)]
struct CapturingSink {
    upserts: Mutex<Vec<(String, Record)>>,
}

#[async_trait]
impl UpsertSink for CapturingSink {
    async fn upsert(&self, table: &str, record: &Record) -> Result<(), SinkError> {
        self.upserts
            .lock()
            .unwrap()
            .push((table.to_string(), record.clone()));
        Ok(())
    }
}

/// Rejects every attempt for one record id, accepts everything else.
struct PoisonSink {
    poisoned_id: String,
}

#[async_trait]
impl UpsertSink for PoisonSink {
    async fn upsert(&self, _table: &str, record: &Record) -> Result<(), SinkError> {
        if record.id() == self.poisoned_id {
            return Err(SinkError::Status {
                status: 500,
                body: "simulated endpoint failure".to_string(),
            });
        }
        Ok(())
    }
}

/// Fails the first `failures` attempts for every record, then succeeds.
/// Tracks total attempts.
struct FlakySink {
    failures: usize,
    attempts_by_record: Mutex<HashMap<String, usize>>,
}

impl FlakySink {
    fn new(failures: usize) -> Self {
        FlakySink {
            failures,
            attempts_by_record: Mutex::new(HashMap::new()),
        }
    }

    fn attempts(&self, id: &str) -> usize {
        self.attempts_by_record
            .lock()
            .unwrap()
            .get(id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl UpsertSink for FlakySink {
    async fn upsert(&self, _table: &str, record: &Record) -> Result<(), SinkError> {
        let mut attempts = self.attempts_by_record.lock().unwrap();
        let count = attempts.entry(record.id()).or_insert(0);
        *count += 1;
        if *count <= self.failures {
            return Err(SinkError::Status {
                status: 503,
                body: "temporarily unavailable".to_string(),
            });
        }
        Ok(())
    }
}

fn options() -> EngineOptions {
    EngineOptions {
        workers: 20,
        batch_size: 100,
        dry_run: false,
        stamp_metadata: true,
    }
}

fn engine(
    source: Arc<dyn TableSource>,
    sink: Arc<dyn UpsertSink>,
    options: EngineOptions,
    cancel: CancellationToken,
) -> TransferEngine {
    TransferEngine::new(
        source,
        sink,
        TableMapping::default(),
        RetryPolicy::new(3, Duration::ZERO),
        options,
        cancel,
    )
}

#[tokio::test]
async fn transfers_every_record_across_batches() {
    let sink = Arc::new(CapturingSink::default());
    let engine = engine(
        Arc::new(MockSource::with_records("visitors", 237)),
        sink.clone(),
        options(),
        CancellationToken::new(),
    );

    let summary = engine.run(&["visitors".to_string()]).await;

    assert!(summary.is_clean());
    assert_eq!(summary.total_records, 237);
    assert_eq!(summary.total_success, 237);
    assert_eq!(summary.total_failed, 0);
    assert_eq!(summary.tables.len(), 1);
    assert_eq!(summary.tables[0].batches, 3);
    assert_eq!(sink.upserts.lock().unwrap().len(), 237);
}

#[tokio::test]
async fn stamps_provenance_metadata_on_every_record() {
    let sink = Arc::new(CapturingSink::default());
    let engine = engine(
        Arc::new(MockSource::with_records("Visitor-abc-NONE", 3)),
        sink.clone(),
        options(),
        CancellationToken::new(),
    );

    engine.run(&["Visitor-abc-NONE".to_string()]).await;

    let upserts = sink.upserts.lock().unwrap();
    assert_eq!(upserts.len(), 3);
    for (destination, record) in upserts.iter() {
        assert_eq!(destination, "visitor_abc_none");
        assert_eq!(
            record.get("_source_table"),
            Some(&model::core::value::Value::String(
                "Visitor-abc-NONE".to_string()
            ))
        );
        assert!(record.get("_import_timestamp").is_some());
    }
}

#[tokio::test]
async fn empty_table_reports_zeros_without_error() {
    let engine = engine(
        Arc::new(MockSource::with_records("visitors", 0)),
        Arc::new(CapturingSink::default()),
        options(),
        CancellationToken::new(),
    );

    let summary = engine.run(&["visitors".to_string()]).await;

    assert!(summary.is_clean());
    let table = &summary.tables[0];
    assert_eq!(table.total, 0);
    assert_eq!(table.success, 0);
    assert_eq!(table.failed, 0);
    assert_eq!(table.batches, 0);
    assert!(table.error.is_none());
}

#[tokio::test]
async fn permanently_failing_record_does_not_sink_the_table() {
    let engine = engine(
        Arc::new(MockSource::with_records("visitors", 50)),
        Arc::new(PoisonSink {
            poisoned_id: "13".to_string(),
        }),
        options(),
        CancellationToken::new(),
    );

    let summary = engine.run(&["visitors".to_string()]).await;

    assert!(!summary.is_clean());
    assert_eq!(summary.total_success, 49);
    assert_eq!(summary.total_failed, 1);
    let samples = &summary.tables[0].failure_samples;
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].record_id, "13");
    assert!(samples[0].error.contains("500"));
}

#[tokio::test]
async fn transient_sink_failures_are_retried_to_success() {
    let sink = Arc::new(FlakySink::new(2));
    let engine = engine(
        Arc::new(MockSource::with_records("visitors", 1)),
        sink.clone(),
        options(),
        CancellationToken::new(),
    );

    let summary = engine.run(&["visitors".to_string()]).await;

    assert!(summary.is_clean());
    assert_eq!(summary.total_success, 1);
    assert_eq!(sink.attempts("0"), 3);
}

#[tokio::test]
async fn scan_failure_skips_the_table_but_not_the_job() {
    let source = Arc::new(MockSource::with_records("good", 5));
    let engine = TransferEngine::new(
        source,
        Arc::new(CapturingSink::default()),
        TableMapping::default(),
        RetryPolicy::new(1, Duration::ZERO),
        options(),
        CancellationToken::new(),
    );

    let summary = engine
        .run(&["missing".to_string(), "good".to_string()])
        .await;

    assert!(!summary.is_clean());
    assert_eq!(summary.tables.len(), 2);
    assert!(summary.tables[0].error.is_some());
    assert_eq!(summary.tables[1].success, 5);
}

#[tokio::test]
async fn undecodable_records_are_counted_and_sampled() {
    let mut bad = item(7);
    bad.insert("amount".to_string(), json!({"N": "not-a-number"}));
    let source = MockSource {
        tables: HashMap::from([("visitors".to_string(), vec![item(1), bad])]),
        page_size: 100,
    };
    let engine = engine(
        Arc::new(source),
        Arc::new(CapturingSink::default()),
        options(),
        CancellationToken::new(),
    );

    let summary = engine.run(&["visitors".to_string()]).await;

    assert_eq!(summary.total_records, 2);
    assert_eq!(summary.total_success, 1);
    assert_eq!(summary.total_failed, 1);
    let samples = &summary.tables[0].failure_samples;
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].record_id, "7");
}

#[tokio::test]
async fn bad_tag_shape_costs_one_record_not_the_table() {
    let mut bad = item(9);
    bad.insert("flag".to_string(), json!({"BOOL": "yes"}));
    let source = MockSource {
        tables: HashMap::from([("visitors".to_string(), vec![item(1), bad])]),
        page_size: 100,
    };
    let engine = engine(
        Arc::new(source),
        Arc::new(CapturingSink::default()),
        options(),
        CancellationToken::new(),
    );

    let summary = engine.run(&["visitors".to_string()]).await;

    let table = &summary.tables[0];
    assert!(table.error.is_none());
    assert_eq!(table.total, 2);
    assert_eq!(table.success, 1);
    assert_eq!(table.failed, 1);
    assert_eq!(table.failure_samples[0].record_id, "9");
    assert!(table.failure_samples[0].error.contains("BOOL"));
}

/// Accepts upserts, cancelling the shared token once a threshold is hit.
struct CancellingSink {
    cancel: CancellationToken,
    cancel_after: usize,
    accepted: Mutex<usize>,
}

#[async_trait]
impl UpsertSink for CancellingSink {
    async fn upsert(&self, _table: &str, _record: &Record) -> Result<(), SinkError> {
        let mut accepted = self.accepted.lock().unwrap();
        *accepted += 1;
        if *accepted == self.cancel_after {
            self.cancel.cancel();
        }
        Ok(())
    }
}

#[tokio::test]
async fn mid_table_cancellation_keeps_partial_counts_accurate() {
    let cancel = CancellationToken::new();
    let sink = Arc::new(CancellingSink {
        cancel: cancel.clone(),
        cancel_after: 25,
        accepted: Mutex::new(0),
    });
    let engine = engine(
        Arc::new(MockSource::with_records("visitors", 100)),
        sink.clone(),
        EngineOptions {
            workers: 1,
            batch_size: 10,
            dry_run: false,
            stamp_metadata: true,
        },
        cancel,
    );

    let summary = engine.run(&["visitors".to_string()]).await;

    assert!(summary.interrupted);
    assert!(!summary.is_clean());
    let table = &summary.tables[0];
    // The batch in flight when the signal landed finishes; later batches
    // are never dispatched. Counts match exactly what was attempted.
    let accepted = *sink.accepted.lock().unwrap() as u64;
    assert_eq!(accepted, 30);
    assert_eq!(table.success + table.failed, accepted);
    assert_eq!(table.failed, 0);
    assert!(table.success < table.total);
}

#[tokio::test]
async fn cancelled_job_is_marked_interrupted() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let engine = engine(
        Arc::new(MockSource::with_records("visitors", 10)),
        Arc::new(CapturingSink::default()),
        options(),
        cancel,
    );

    let summary = engine.run(&["visitors".to_string()]).await;

    assert!(summary.interrupted);
    assert!(!summary.is_clean());
    assert!(summary.tables.is_empty());
}
