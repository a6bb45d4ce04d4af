use crate::retry::{RetryDisposition, RetryError, RetryPolicy};
use connectors::{error::ScanError, source::TableSource};
use model::{
    core::tagged::RawRecord,
    pagination::{cursor::Cursor, page::ScanPage},
};
use std::sync::Arc;
use tracing::debug;

/// Reads an entire source table through successive paged scans.
///
/// Every record is yielded exactly once, in page order. Transient page
/// failures get a bounded retry; anything else (or an exhausted budget)
/// aborts the table's transfer — pages are never silently dropped.
pub struct RecordScanner {
    source: Arc<dyn TableSource>,
    retry: RetryPolicy,
}

impl RecordScanner {
    pub fn new(source: Arc<dyn TableSource>, retry: RetryPolicy) -> Self {
        RecordScanner { source, retry }
    }

    pub async fn scan(&self, table: &str) -> Result<Vec<RawRecord>, ScanError> {
        let mut items = Vec::new();
        let mut cursor = Cursor::None;
        let mut page = 0;

        loop {
            let result = self.fetch_page(table, cursor).await?;
            page += 1;
            items.extend(result.items);
            debug!(table, page, total = items.len(), "scanned page");

            if result.next.is_none() {
                break;
            }
            cursor = result.next;
        }

        Ok(items)
    }

    async fn fetch_page(&self, table: &str, cursor: Cursor) -> Result<ScanPage, ScanError> {
        let source = self.source.clone();
        let table = table.to_string();

        self.retry
            .run(
                || {
                    let source = source.clone();
                    let table = table.clone();
                    let cursor = cursor.clone();
                    async move { source.scan_page(&table, cursor).await }
                },
                classify_scan_error,
            )
            .await
            .map_err(RetryError::into_inner)
    }
}

pub fn classify_scan_error(err: &ScanError) -> RetryDisposition {
    if err.is_transient() {
        RetryDisposition::Retry
    } else {
        RetryDisposition::Stop
    }
}
