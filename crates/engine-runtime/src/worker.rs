use crate::summary::FailureSample;
use connectors::{error::SinkError, sink::UpsertSink};
use engine_core::{
    progress::{ProgressTracker, TransferResult},
    retry::{RetryDisposition, RetryPolicy},
};
use model::records::{batch::Batch, record::Record};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

/// Cap on stored failure samples per table. Counters keep the full totals.
const FAILURE_SAMPLE_CAP: usize = 10;

/// Progress is logged on every Nth completed batch to keep long transfers
/// observable without flooding the log.
const PROGRESS_LOG_EVERY: u64 = 10;

/// Shared, capped collection of permanently failed records for one table.
#[derive(Debug, Clone, Default)]
pub struct FailureLog {
    inner: Arc<Mutex<Vec<FailureSample>>>,
}

impl FailureLog {
    pub fn new() -> Self {
        FailureLog::default()
    }

    pub fn push(&self, record_id: String, error: String) {
        let mut samples = self.lock();
        if samples.len() < FAILURE_SAMPLE_CAP {
            samples.push(FailureSample { record_id, error });
        }
    }

    pub fn into_samples(self) -> Vec<FailureSample> {
        let samples = self.lock().drain(..).collect();
        samples
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<FailureSample>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Uploads batches record by record, retrying each upsert under the
/// configured policy. A record that exhausts its attempts is counted as
/// failed and the batch carries on.
pub struct TransferWorker {
    sink: Arc<dyn UpsertSink>,
    retry: RetryPolicy,
}

impl TransferWorker {
    pub fn new(sink: Arc<dyn UpsertSink>, retry: RetryPolicy) -> Self {
        TransferWorker { sink, retry }
    }

    pub async fn transfer(
        &self,
        table: &str,
        batch: &Batch,
        progress: &ProgressTracker,
        failures: &FailureLog,
    ) -> TransferResult {
        let mut result = TransferResult::default();

        for record in &batch.records {
            match self.upsert_with_retry(table, record).await {
                Ok(()) => result.success += 1,
                Err(err) => {
                    result.failed += 1;
                    warn!(
                        table,
                        record = %record.id(),
                        error = %err,
                        "record failed after retries"
                    );
                    failures.push(record.id(), err.to_string());
                }
            }
        }

        let snapshot = progress.report(table, &result);
        if snapshot.is_complete() || snapshot.completed_batches % PROGRESS_LOG_EVERY == 0 {
            info!(
                table,
                completed = snapshot.completed_batches,
                total = snapshot.total_batches,
                success = snapshot.success,
                failed = snapshot.failed,
                percent = snapshot.percent(),
                "transfer progress"
            );
        }

        result
    }

    async fn upsert_with_retry(&self, table: &str, record: &Record) -> Result<(), SinkError> {
        self.retry
            .run(
                || self.sink.upsert(table, record),
                classify_sink_error,
            )
            .await
            .map_err(engine_core::retry::RetryError::into_inner)
    }
}

/// Upserts are idempotent, so every failure mode is safe to retry: a
/// duplicate delivery after an ambiguous timeout converges to the same row.
pub fn classify_sink_error(_err: &SinkError) -> RetryDisposition {
    RetryDisposition::Retry
}
