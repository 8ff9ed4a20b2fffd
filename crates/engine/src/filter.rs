//! Per-tab search filter.
//!
//! Case-insensitive substring match over step, section and description.
//! Code and preview markup are not searched.

use crate::mapper::FunctionRecord;

pub fn matches(record: &FunctionRecord, query: &str) -> bool {
    let q = query.trim().to_lowercase();
    q.is_empty()
        || [&record.step, &record.section, &record.description]
            .iter()
            .any(|field| field.to_lowercase().contains(&q))
}

/// Indices of the records that match, in their original order.
pub fn filter_indices(records: &[FunctionRecord], query: &str) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| matches(r, query))
        .map(|(i, _)| i)
        .collect()
}
