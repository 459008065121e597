use askama::Template;

use crate::charts::{format_amount, ChartSet};
use crate::types::NormalizedRecord;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub username: String,
}

/// A dashboard table row with amounts already formatted for display.
#[derive(Debug, Clone)]
pub struct CompanyRow {
    pub rank: String,
    pub company: String,
    pub canonical_name: String,
    pub company_url: String,
    pub revenue: String,
    pub profit: String,
    pub country: String,
}

impl From<&NormalizedRecord> for CompanyRow {
    fn from(record: &NormalizedRecord) -> Self {
        Self {
            rank: record.raw.rank.clone(),
            company: record.raw.company.clone(),
            canonical_name: record.canonical_name.clone(),
            company_url: record.raw.company_url.clone(),
            revenue: format_amount(record.revenue_value),
            profit: format_amount(record.profit_value),
            country: record.raw.country.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub query: String,
    pub companies: Vec<CompanyRow>,
    pub charts: ChartSet,
    pub notices: Vec<String>,
}

impl DashboardTemplate {
    pub fn new(query: String, records: &[NormalizedRecord], charts: ChartSet, mut notices: Vec<String>) -> Self {
        notices.extend(charts.notices.iter().cloned());
        Self {
            query,
            companies: records.iter().map(CompanyRow::from).collect(),
            charts,
            notices,
        }
    }
}
