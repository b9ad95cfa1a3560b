//! Point-in-time views over a decoded record log.

use crate::models::Record;

/// The most recently appended record, if any.
pub fn latest_of(records: &[Record]) -> Option<&Record> {
    records.last()
}

/// The last `limit` records in file order.
pub fn recent_of(records: &[Record], limit: usize) -> &[Record] {
    &records[records.len().saturating_sub(limit)..]
}
