use crate::config::ScraperConfig;
use crate::constants::{NO_DATA, ZERO_AMOUNT};
use crate::error::{DashboardError, Result};
use crate::types::CompanyRecord;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::RankingSource;

/// Scrapes the Fortune China 500 ranking table (`#table1`).
pub struct FortuneChinaCrawler {
    client: reqwest::Client,
    url: String,
    base_url: String,
}

impl FortuneChinaCrawler {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait::async_trait]
impl RankingSource for FortuneChinaCrawler {
    fn source_name(&self) -> &str {
        "fortune_china"
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_rows(&self) -> Result<Vec<CompanyRecord>> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        info!(%status, "ranking page requested");
        if !status.is_success() {
            return Err(DashboardError::Scrape(format!(
                "ranking page request failed with status: {}",
                status
            )));
        }

        let body = response.text().await?;
        let rows = parse_ranking_table(&body, &self.base_url)?;
        if rows.is_empty() {
            warn!("No ranking rows found - the page structure may have changed");
        }
        Ok(rows)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| DashboardError::Scrape(format!("invalid selector '{}': {}", css, e)))
}

/// First non-blank text node inside `cell`, trimmed.
fn cell_text(cell: &ElementRef<'_>) -> Option<String> {
    cell.text()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(str::to_string)
}

/// Resolves `href` against `base_url`. Only `http`/`https` targets are
/// kept; anything else (`javascript:`, `mailto:`, unparsable) becomes "".
fn resolve_link(href: &str, base_url: &str) -> String {
    match Url::parse(base_url).and_then(|base| base.join(href)) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url.into(),
        Ok(url) => {
            debug!(scheme = url.scheme(), "dropping non-web company link");
            String::new()
        }
        Err(_) => String::new(),
    }
}

/// Extracts ranking rows from the page HTML.
///
/// The first row of `#table1` is the header. Columns are rank, company,
/// revenue, profit, country; missing text cells become the no-data sentinel
/// and missing amounts become `"0"`.
pub fn parse_ranking_table(html: &str, base_url: &str) -> Result<Vec<CompanyRecord>> {
    let document = Html::parse_document(html);
    let row_selector = selector("#table1 tr")?;
    let link_selector = selector("a[href]")?;

    let mut records = Vec::new();
    for row in document.select(&row_selector).skip(1) {
        let cells: Vec<ElementRef<'_>> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "td")
            .collect();
        if cells.is_empty() {
            continue;
        }

        let text_at = |idx: usize| cells.get(idx).and_then(cell_text);
        let company_url = cells
            .get(1)
            .and_then(|cell| cell.select(&link_selector).next())
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(|href| resolve_link(href, base_url))
            .unwrap_or_default();

        let record = CompanyRecord {
            rank: text_at(0).unwrap_or_else(|| NO_DATA.to_string()),
            company: text_at(1).unwrap_or_else(|| NO_DATA.to_string()),
            company_url,
            revenue: text_at(2).unwrap_or_else(|| ZERO_AMOUNT.to_string()),
            profit: text_at(3).unwrap_or_else(|| ZERO_AMOUNT.to_string()),
            country: text_at(4).unwrap_or_else(|| NO_DATA.to_string()),
        };
        debug!(rank = %record.rank, company = %record.company, "parsed ranking row");
        records.push(record);
    }

    info!("Parsed {} ranking rows", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.fortunechina.com";

    const PAGE: &str = r#"
        <html><body>
        <table id="table1">
          <tr><th>排名</th><th>公司名称</th><th>营业收入</th><th>利润</th><th>国家</th></tr>
          <tr>
            <td>1</td>
            <td><a href="/global500/1/2025">沃尔玛（WALMART)</a></td>
            <td>680,985</td>
            <td>19,436</td>
            <td>美国</td>
          </tr>
          <tr>
            <td> 2 </td>
            <td><a href="https://example.com/amazon">亚马逊（AMAZON.COM)</a></td>
            <td>637,959</td>
            <td>59,248</td>
            <td>美国</td>
          </tr>
          <tr>
            <td>3</td>
            <td>
              国家电网有限公司（STATE GRID)
            </td>
            <td></td>
          </tr>
        </table>
        <table id="other"><tr><td>ignored</td></tr></table>
        </body></html>
    "#;

    #[test]
    fn parses_rows_after_header() {
        let rows = parse_ranking_table(PAGE, BASE).unwrap();
        assert_eq!(rows.len(), 3);

        assert_eq!(
            rows[0],
            CompanyRecord::new(
                "1",
                "沃尔玛（WALMART)",
                "https://www.fortunechina.com/global500/1/2025",
                "680,985",
                "19,436",
                "美国"
            )
        );
        assert_eq!(rows[1].rank, "2");
        assert_eq!(rows[1].company_url, "https://example.com/amazon");
    }

    #[test]
    fn missing_cells_become_sentinels() {
        let rows = parse_ranking_table(PAGE, BASE).unwrap();
        let row = &rows[2];
        assert_eq!(row.company, "国家电网有限公司（STATE GRID)");
        assert_eq!(row.company_url, "");
        assert_eq!(row.revenue, "0");
        assert_eq!(row.profit, "0");
        assert_eq!(row.country, "无数据");
    }

    #[test]
    fn page_without_table_yields_nothing() {
        let rows = parse_ranking_table("<html><body><p>maintenance</p></body></html>", BASE).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn relative_links_resolve_against_base() {
        assert_eq!(
            resolve_link("fortune500/c/x.htm", "https://www.fortunechina.com/"),
            "https://www.fortunechina.com/fortune500/c/x.htm"
        );
        assert_eq!(resolve_link("http://a.b/c", BASE), "http://a.b/c");
        assert_eq!(resolve_link("//cdn.example.com/x", BASE), "https://cdn.example.com/x");
    }

    #[test]
    fn non_web_links_are_dropped() {
        assert_eq!(resolve_link("javascript:alert(1)", BASE), "");
        assert_eq!(resolve_link("JavaScript:void(0)", BASE), "");
        assert_eq!(resolve_link("mailto:ir@example.com", BASE), "");
        assert_eq!(resolve_link("data:text/html,<b>x</b>", BASE), "");
        assert_eq!(resolve_link("/ok", "not a base"), "");
    }

    #[test]
    fn scripted_company_link_is_not_kept() {
        let page = r#"<table id="table1">
            <tr><th>排名</th></tr>
            <tr><td>1</td><td><a href="javascript:alert(1)">甲公司</a></td><td>1</td><td>1</td><td>中国</td></tr>
        </table>"#;
        let rows = parse_ranking_table(page, BASE).unwrap();
        assert_eq!(rows[0].company, "甲公司");
        assert_eq!(rows[0].company_url, "");
    }
}
