use crate::records::record::Record;

/// A fixed-size slice of a table's records, delivered record-by-record by
/// one worker. `index` is 1-based; `total` is the batch count for the table.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub index: usize,
    pub total: usize,
    pub records: Vec<Record>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
