use crate::types::NormalizedRecord;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Keeps one record per canonical name: the one with the highest revenue.
///
/// Output is ordered by descending revenue. The sort is stable, so among
/// equal revenues the record seen first in `records` wins and keeps its
/// relative position. `-0.0` and `0.0` count as equal.
pub fn dedupe(mut records: Vec<NormalizedRecord>) -> Vec<NormalizedRecord> {
    records.sort_by(|a, b| {
        b.revenue_value
            .partial_cmp(&a.revenue_value)
            .unwrap_or(Ordering::Equal)
    });

    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    records.retain(|record| seen.insert(record.canonical_name.clone()));
    records
}
