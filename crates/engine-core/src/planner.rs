use model::records::{batch::Batch, record::Record};

/// Splits a table's records into fixed-size batches in input order.
///
/// Batch `i` (1-based) holds elements `[(i-1)*size, i*size)`; the final
/// batch may be shorter. Pure, no I/O. `batch_size` must be positive;
/// config validation rejects zero before a job reaches this point.
pub fn plan(records: Vec<Record>, batch_size: usize) -> Vec<Batch> {
    debug_assert!(batch_size > 0, "batch size must be positive");
    let batch_size = batch_size.max(1);

    if records.is_empty() {
        return Vec::new();
    }

    let total = records.len().div_ceil(batch_size);
    let mut batches = Vec::with_capacity(total);
    let mut remaining = records;
    let mut index = 0;

    while !remaining.is_empty() {
        let take = batch_size.min(remaining.len());
        let rest = remaining.split_off(take);
        index += 1;
        batches.push(Batch {
            index,
            total,
            records: remaining,
        });
        remaining = rest;
    }

    batches
}
