pub mod fortune_china;

pub use fortune_china::{parse_ranking_table, FortuneChinaCrawler};

use crate::error::Result;
use crate::storage::CompanyStore;
use crate::types::CompanyRecord;
use tracing::{info, instrument, warn};

/// A remote page that yields raw ranking rows.
#[async_trait::async_trait]
pub trait RankingSource: Send + Sync {
    fn source_name(&self) -> &str;

    async fn fetch_rows(&self) -> Result<Vec<CompanyRecord>>;
}

/// Fetches one snapshot from `source` and appends it to `store`.
/// Returns the number of rows written.
#[instrument(skip_all, fields(source = source.source_name()))]
pub async fn run_scrape(source: &dyn RankingSource, store: &dyn CompanyStore) -> Result<usize> {
    let rows = source.fetch_rows().await?;
    if rows.is_empty() {
        warn!("source returned no rows, nothing stored");
        return Ok(0);
    }

    let written = store.insert_companies(&rows)?;
    info!(written, "stored ranking rows");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;

    struct FixedSource(Vec<CompanyRecord>);

    #[async_trait::async_trait]
    impl RankingSource for FixedSource {
        fn source_name(&self) -> &str {
            "fixed"
        }

        async fn fetch_rows(&self) -> Result<Vec<CompanyRecord>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn scrape_appends_to_store() {
        let store = InMemoryStore::with_rows(vec![CompanyRecord::new("0", "旧", "", "1", "1", "中国")]);
        let source = FixedSource(vec![
            CompanyRecord::new("1", "甲", "", "2", "1", "中国"),
            CompanyRecord::new("2", "乙", "", "3", "1", "美国"),
        ]);

        let written = run_scrape(&source, &store).await.unwrap();
        assert_eq!(written, 2);
        assert_eq!(store.count().unwrap(), 3);
    }

    #[tokio::test]
    async fn empty_snapshot_writes_nothing() {
        let store = InMemoryStore::new();
        let written = run_scrape(&FixedSource(Vec::new()), &store).await.unwrap();
        assert_eq!(written, 0);
        assert_eq!(store.count().unwrap(), 0);
    }
}
