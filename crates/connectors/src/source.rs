use crate::error::ScanError;
use async_trait::async_trait;
use model::pagination::{cursor::Cursor, page::ScanPage};

/// A paginated source of raw tagged records.
///
/// Callers loop: pass `Cursor::None` for the first page, then feed each
/// page's `next` cursor back until it is `Cursor::None` again. Every record
/// is yielded exactly once, in page order.
#[async_trait]
pub trait TableSource: Send + Sync {
    async fn scan_page(&self, table: &str, cursor: Cursor) -> Result<ScanPage, ScanError>;
}
