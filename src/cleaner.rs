//! One-off cleaning run that rewrites the stored table so each canonical
//! company name appears once.

use crate::error::Result;
use crate::pipeline::{canonical_key, dedupe, normalize_record};
use crate::storage::CompanyStore;
use crate::types::CompanyRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument, warn};

/// How many duplicate names the report lists.
const REPORTED_DUPLICATES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanReport {
    pub original_rows: usize,
    pub unique_raw_names: usize,
    /// Canonical names that occurred more than once before cleaning.
    pub duplicate_groups: usize,
    /// Most frequent duplicated names with their occurrence counts.
    pub top_duplicates: Vec<(String, usize)>,
    pub max_revenue: f64,
    pub max_profit: f64,
    pub cleaned_rows: usize,
    pub removed_rows: usize,
    /// Should be zero; anything else means the rewrite did not stick.
    pub remaining_duplicate_groups: usize,
    pub cleaned_at: DateTime<Utc>,
}

/// Canonical names occurring more than once, most frequent first. Equal
/// counts keep first-seen order.
fn duplicate_counts<'a>(names: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in names {
        let count = counts.entry(name).or_insert(0);
        if *count == 0 {
            order.push(name);
        }
        *count += 1;
    }

    let mut dups: Vec<(String, usize)> = order
        .into_iter()
        .filter_map(|name| {
            let n = counts[name];
            (n > 1).then(|| (name.to_string(), n))
        })
        .collect();
    dups.sort_by(|a, b| b.1.cmp(&a.1));
    dups
}

/// Deduplicates the stored rows in place and verifies the result.
///
/// Unlike the dashboard read path this pass sees sentinel rows too; they all
/// share one canonical name and collapse into a single row. Names that reduce
/// to nothing, such as `(X)`, form their own `""` group instead of joining
/// the sentinel rows.
#[instrument(skip_all)]
pub fn clean_store(store: &dyn CompanyStore) -> Result<CleanReport> {
    let rows = store.fetch_all()?;
    let original_rows = rows.len();
    let unique_raw_names = rows
        .iter()
        .map(|r| r.company.as_str())
        .collect::<HashSet<_>>()
        .len();
    info!(original_rows, unique_raw_names, "loaded rows for cleaning");

    let normalized: Vec<_> = rows
        .into_iter()
        .map(|row| {
            let key = canonical_key(&row.company);
            let mut record = normalize_record(row);
            record.canonical_name = key;
            record
        })
        .collect();
    let duplicates = duplicate_counts(normalized.iter().map(|r| r.canonical_name.as_str()));
    let max_revenue = normalized.iter().map(|r| r.revenue_value).fold(0.0, f64::max);
    let max_profit = normalized
        .iter()
        .map(|r| r.profit_value)
        .reduce(f64::max)
        .unwrap_or(0.0);

    let survivors: Vec<CompanyRecord> = dedupe(normalized).into_iter().map(|r| r.raw).collect();
    let cleaned_rows = store.replace_all(&survivors)?;

    let remaining_names: Vec<String> = store
        .fetch_all()?
        .iter()
        .map(|r| canonical_key(&r.company))
        .collect();
    let remaining_duplicate_groups = duplicate_counts(remaining_names.iter().map(String::as_str)).len();
    if remaining_duplicate_groups > 0 {
        warn!(remaining_duplicate_groups, "duplicates remain after cleaning");
    }

    let report = CleanReport {
        original_rows,
        unique_raw_names,
        duplicate_groups: duplicates.len(),
        top_duplicates: duplicates.into_iter().take(REPORTED_DUPLICATES).collect(),
        max_revenue,
        max_profit,
        cleaned_rows,
        removed_rows: original_rows - cleaned_rows,
        remaining_duplicate_groups,
        cleaned_at: Utc::now(),
    };
    info!(
        cleaned_rows = report.cleaned_rows,
        removed_rows = report.removed_rows,
        "cleaning finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;

    fn rows() -> Vec<CompanyRecord> {
        vec![
            CompanyRecord::new("1", "甲公司(Alpha Corp)", "", "1,000", "100", "US"),
            CompanyRecord::new("2", "乙公司", "", "50", "-3", "CN"),
            CompanyRecord::new("3", "甲公司", "", "900", "80", "US"),
            CompanyRecord::new("4", "无数据", "", "0", "0", "无数据"),
            CompanyRecord::new("5", "无数据", "", "0", "0", "无数据"),
            CompanyRecord::new("6", "甲 公司（A）", "", "10", "1", "US"),
        ]
    }

    #[test]
    fn rewrites_store_without_duplicates() {
        let store = InMemoryStore::with_rows(rows());
        let report = clean_store(&store).unwrap();

        assert_eq!(report.original_rows, 6);
        assert_eq!(report.unique_raw_names, 5);
        assert_eq!(report.duplicate_groups, 2);
        assert_eq!(report.top_duplicates[0], ("甲公司".to_string(), 3));
        assert_eq!(report.top_duplicates[1], ("无数据".to_string(), 2));
        assert_eq!(report.max_revenue, 1000.0);
        assert_eq!(report.max_profit, 100.0);
        assert_eq!(report.cleaned_rows, 3);
        assert_eq!(report.removed_rows, 3);
        assert_eq!(report.remaining_duplicate_groups, 0);

        let kept: Vec<_> = store.fetch_all().unwrap().into_iter().map(|r| r.rank).collect();
        assert_eq!(kept, ["1", "2", "4"]);
    }

    #[test]
    fn annotation_only_names_stay_apart_from_sentinels() {
        let store = InMemoryStore::with_rows(vec![
            CompanyRecord::new("1", "无数据", "", "0", "0", "无数据"),
            CompanyRecord::new("2", "(X)", "", "5", "1", "中国"),
            CompanyRecord::new("3", "（Y）", "", "7", "1", "中国"),
        ]);
        let report = clean_store(&store).unwrap();

        assert_eq!(report.duplicate_groups, 1);
        assert_eq!(report.top_duplicates, vec![(String::new(), 2)]);
        let kept: Vec<_> = store.fetch_all().unwrap().into_iter().map(|r| r.rank).collect();
        assert_eq!(kept, ["3", "1"]);
        assert_eq!(report.remaining_duplicate_groups, 0);
    }

    #[test]
    fn second_run_changes_nothing() {
        let store = InMemoryStore::with_rows(rows());
        clean_store(&store).unwrap();
        let again = clean_store(&store).unwrap();

        assert_eq!(again.removed_rows, 0);
        assert_eq!(again.duplicate_groups, 0);
    }

    #[test]
    fn duplicate_counts_orders_by_frequency() {
        let dups = duplicate_counts(["a", "b", "b", "c", "a", "b", "d", "c"].into_iter());
        assert_eq!(
            dups,
            vec![("b".to_string(), 3), ("a".to_string(), 2), ("c".to_string(), 2)]
        );
    }
}
