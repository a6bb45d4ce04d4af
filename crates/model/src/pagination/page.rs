use crate::{core::tagged::RawRecord, pagination::cursor::Cursor};

/// One page of a table scan: zero or more raw records plus the cursor for
/// the next page (`Cursor::None` once the table is exhausted).
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPage {
    pub items: Vec<RawRecord>,
    pub next: Cursor,
}

impl ScanPage {
    pub fn row_count(&self) -> usize {
        self.items.len()
    }

    pub fn reached_end(&self) -> bool {
        self.next.is_none()
    }
}
