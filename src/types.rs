use serde::{Deserialize, Serialize};

/// One ranking row exactly as scraped and stored. Every field is text;
/// numeric columns may carry thousands separators or sentinel markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub rank: String,
    pub company: String,
    pub company_url: String,
    pub revenue: String,
    pub profit: String,
    pub country: String,
}

impl CompanyRecord {
    pub fn new(
        rank: impl Into<String>,
        company: impl Into<String>,
        company_url: impl Into<String>,
        revenue: impl Into<String>,
        profit: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            rank: rank.into(),
            company: company.into(),
            company_url: company_url.into(),
            revenue: revenue.into(),
            profit: profit.into(),
            country: country.into(),
        }
    }
}

/// A raw row plus the values derived from it by the normalization pipeline.
/// Never persisted; rebuilt on every read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    #[serde(flatten)]
    pub raw: CompanyRecord,
    pub canonical_name: String,
    pub revenue_value: f64,
    pub profit_value: f64,
}

/// Free-text search over company name and country.
///
/// Matching follows SQLite `LIKE '%term%'`: a substring test that ignores
/// ASCII case and compares everything else exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    term: String,
    folded: String,
}

impl SearchFilter {
    /// Returns `None` for blank input, which means "show everything".
    pub fn parse(text: &str) -> Option<Self> {
        let term = text.trim();
        if term.is_empty() {
            return None;
        }
        Some(Self {
            term: term.to_string(),
            folded: term.to_ascii_lowercase(),
        })
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn matches(&self, record: &CompanyRecord) -> bool {
        record.company.to_ascii_lowercase().contains(&self.folded)
            || record.country.to_ascii_lowercase().contains(&self.folded)
    }

    /// `%term%` with LIKE wildcards in the term escaped by `\`.
    pub fn like_pattern(&self) -> String {
        let mut pattern = String::with_capacity(self.term.len() + 2);
        pattern.push('%');
        for ch in self.term.chars() {
            if matches!(ch, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(ch);
        }
        pattern.push('%');
        pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(company: &str, country: &str) -> CompanyRecord {
        CompanyRecord::new("1", company, "", "1", "1", country)
    }

    #[test]
    fn blank_search_is_no_filter() {
        assert!(SearchFilter::parse("").is_none());
        assert!(SearchFilter::parse("   ").is_none());
    }

    #[test]
    fn search_matches_company_or_country() {
        let filter = SearchFilter::parse(" 石油 ").unwrap();
        assert_eq!(filter.term(), "石油");
        assert!(filter.matches(&row("中国石油天然气集团有限公司", "中国")));
        assert!(!filter.matches(&row("国家电网有限公司", "中国")));

        let filter = SearchFilter::parse("美国").unwrap();
        assert!(filter.matches(&row("沃尔玛（WALMART)", "美国")));
    }

    #[test]
    fn search_ignores_ascii_case_only() {
        let filter = SearchFilter::parse("walmart").unwrap();
        assert!(filter.matches(&row("沃尔玛（WALMART)", "美国")));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        let filter = SearchFilter::parse("100%_a\\b").unwrap();
        assert_eq!(filter.like_pattern(), "%100\\%\\_a\\\\b%");
    }
}
