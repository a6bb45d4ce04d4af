use crate::{error::ScanError, source::TableSource};
use async_trait::async_trait;
use model::{
    core::tagged::RawRecord,
    pagination::{cursor::Cursor, page::ScanPage},
};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::Mutex;
use tracing::debug;

/// Paged reader over JSON-lines table exports (`<dir>/<table>.jsonl`, one
/// record object per line).
///
/// Lines are framed as raw JSON objects only; field-level tag
/// classification happens later, at decode, where a bad payload costs one
/// record instead of the page. Pages are served with an offset cursor. The
/// parsed file is cached after the first page so subsequent pages do not
/// reparse; a scan restarted from `Cursor::None` re-reads the file from
/// disk.
pub struct ExportDirSource {
    dir: PathBuf,
    page_size: usize,
    cache: Mutex<HashMap<String, Arc<Vec<RawRecord>>>>,
}

impl ExportDirSource {
    pub fn new(dir: impl Into<PathBuf>, page_size: usize) -> Self {
        ExportDirSource {
            dir: dir.into(),
            page_size: page_size.max(1),
            cache: Mutex::new(HashMap::new()),
        }
    }

    async fn load(&self, table: &str, reload: bool) -> Result<Arc<Vec<RawRecord>>, ScanError> {
        let mut cache = self.cache.lock().await;
        if !reload && let Some(records) = cache.get(table) {
            return Ok(records.clone());
        }

        let path = self.dir.join(format!("{table}.jsonl"));
        let records = Arc::new(read_export(table, &path).await?);
        debug!(table, records = records.len(), path = %path.display(), "loaded export file");
        cache.insert(table.to_string(), records.clone());
        Ok(records)
    }
}

async fn read_export(table: &str, path: &Path) -> Result<Vec<RawRecord>, ScanError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ScanError::MissingExport {
                table: table.to_string(),
                path: path.display().to_string(),
            });
        }
        Err(err) => return Err(err.into()),
    };

    let mut records = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record =
            serde_json::from_str::<RawRecord>(line).map_err(|source| ScanError::Malformed {
                table: table.to_string(),
                line: idx + 1,
                source,
            })?;
        records.push(record);
    }
    Ok(records)
}

#[async_trait]
impl TableSource for ExportDirSource {
    async fn scan_page(&self, table: &str, cursor: Cursor) -> Result<ScanPage, ScanError> {
        let offset = match cursor {
            Cursor::None => 0,
            Cursor::Offset { offset } => offset,
            other => {
                return Err(ScanError::InvalidCursor(format!("{other:?}")));
            }
        };

        let records = self.load(table, offset == 0).await?;
        let end = (offset + self.page_size).min(records.len());
        let items = records
            .get(offset..end)
            .map(<[RawRecord]>::to_vec)
            .unwrap_or_default();

        let next = if end < records.len() {
            Cursor::Offset { offset: end }
        } else {
            Cursor::None
        };

        Ok(ScanPage { items, next })
    }
}
