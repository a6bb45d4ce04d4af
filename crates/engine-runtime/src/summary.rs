use serde::Serialize;

/// One permanently failed record, kept for the job report. The full error
/// text is preserved; the list itself is capped at the source.
#[derive(Debug, Clone, Serialize)]
pub struct FailureSample {
    pub record_id: String,
    pub error: String,
}

/// Outcome of transferring a single source table.
#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub table: String,
    pub destination: String,
    pub total: u64,
    pub success: u64,
    pub failed: u64,
    pub batches: u64,
    pub duration_secs: f64,
    pub records_per_second: f64,
    /// Set when the table could not be transferred at all, e.g. the scan
    /// failed. Per-record failures are counted, not stored here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failure_samples: Vec<FailureSample>,
}

impl TableSummary {
    pub fn errored(table: String, destination: String, error: String) -> Self {
        TableSummary {
            table,
            destination,
            total: 0,
            success: 0,
            failed: 0,
            batches: 0,
            duration_secs: 0.0,
            records_per_second: 0.0,
            error: Some(error),
            failure_samples: Vec::new(),
        }
    }
}

/// Aggregate outcome of one job run, across all selected tables.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub tables: Vec<TableSummary>,
    pub total_records: u64,
    pub total_success: u64,
    pub total_failed: u64,
    pub duration_secs: f64,
    pub records_per_second: f64,
    pub interrupted: bool,
    pub dry_run: bool,
}

impl JobSummary {
    pub fn from_tables(
        tables: Vec<TableSummary>,
        duration_secs: f64,
        interrupted: bool,
        dry_run: bool,
    ) -> Self {
        let total_records = tables.iter().map(|t| t.total).sum();
        let total_success: u64 = tables.iter().map(|t| t.success).sum();
        let total_failed = tables.iter().map(|t| t.failed).sum();
        let records_per_second = if duration_secs > 0.0 {
            total_success as f64 / duration_secs
        } else {
            0.0
        };

        JobSummary {
            tables,
            total_records,
            total_success,
            total_failed,
            duration_secs,
            records_per_second,
            interrupted,
            dry_run,
        }
    }

    /// A clean run moved every record, finished every table, and was not
    /// cut short by a shutdown signal.
    pub fn is_clean(&self) -> bool {
        self.total_failed == 0
            && !self.interrupted
            && self.tables.iter().all(|t| t.error.is_none())
    }
}
