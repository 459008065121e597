//! Normalization pipeline: raw ranking rows in, one clean record per
//! company out.
//!
//! The dataset is small and rebuilt from storage on every read, so nothing
//! here caches or shares state between calls.

pub mod canonical;
pub mod coerce;
pub mod dedupe;

pub use canonical::{canonical_key, canonicalize};
pub use coerce::coerce;
pub use dedupe::dedupe;

use crate::constants::NO_DATA;
use crate::error::{DashboardError, Result};
use crate::storage::CompanyStore;
use crate::types::{CompanyRecord, NormalizedRecord, SearchFilter};
use tracing::{debug, instrument};

/// Derives the numeric and canonical fields for one raw row.
pub fn normalize_record(raw: CompanyRecord) -> NormalizedRecord {
    let canonical_name = canonicalize(&raw.company);
    // also folds -0.0 into 0.0 so equal revenues compare equal everywhere
    let revenue = coerce(&raw.revenue);
    let revenue_value = if revenue > 0.0 { revenue } else { 0.0 };
    let profit_value = coerce(&raw.profit);
    NormalizedRecord {
        raw,
        canonical_name,
        revenue_value,
        profit_value,
    }
}

/// Filters, coerces, canonicalizes and deduplicates raw rows.
///
/// Rows whose company is the no-data sentinel are dropped before
/// canonicalization. The result is ordered by descending revenue.
pub fn normalize(
    raw_records: Vec<CompanyRecord>,
    filter: Option<&SearchFilter>,
) -> Vec<NormalizedRecord> {
    let input = raw_records.len();
    let normalized: Vec<NormalizedRecord> = raw_records
        .into_iter()
        .filter(|r| filter.map_or(true, |f| f.matches(r)))
        .filter(|r| r.company != NO_DATA)
        .map(normalize_record)
        .collect();

    let kept = normalized.len();
    let unique = dedupe(normalized);
    debug!(input, kept, unique = unique.len(), "normalized ranking rows");
    unique
}

/// Reads the ranking from `store` and normalizes it.
///
/// Fails with `DataUnavailable` when the store is missing or unreadable,
/// and when an unfiltered read finds no company rows at all. A search that
/// matches nothing is an ordinary empty result.
#[instrument(skip_all, fields(search = filter.map(SearchFilter::term)))]
pub fn load(store: &dyn CompanyStore, filter: Option<&SearchFilter>) -> Result<Vec<NormalizedRecord>> {
    let rows = store.fetch_companies(filter)?;
    if rows.is_empty() && filter.is_none() {
        return Err(DashboardError::data_unavailable(
            store.location(),
            "company_info holds no company rows",
        ));
    }
    Ok(normalize(rows, filter))
}
