use thiserror::Error;

/// Errors raised while reading pages from a source table.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("I/O error reading source: {0}")]
    Io(#[from] std::io::Error),

    #[error("no export found for table '{table}' at {path}")]
    MissingExport { table: String, path: String },

    #[error("malformed record in '{table}' at line {line}: {source}")]
    Malformed {
        table: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported cursor for this source: {0}")]
    InvalidCursor(String),

    #[error("source request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl ScanError {
    /// Transient failures are worth a bounded page-level retry; shape and
    /// cursor errors are not going to heal themselves.
    pub fn is_transient(&self) -> bool {
        matches!(self, ScanError::Io(_) | ScanError::Http(_))
    }
}

/// Errors raised by one upsert attempt against the destination endpoint.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("upsert request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upsert rejected with status {status}: {body}")]
    Status { status: u16, body: String },
}
