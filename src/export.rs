use crate::charts::ChartRenderer;
use crate::error::{DashboardError, Result};
use crate::types::NormalizedRecord;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const TABLE_FILE: &str = "companies.csv";
pub const REVENUE_FILE: &str = "revenue_top.png";
pub const PROFIT_FILE: &str = "profit_top.png";
pub const COUNTRY_FILE: &str = "country_share.png";

const HEADER: [&str; 9] = [
    "rank",
    "company",
    "canonical_name",
    "company_url",
    "revenue",
    "profit",
    "country",
    "revenue_value",
    "profit_value",
];

/// Writes the normalized table as CSV to `writer`.
pub fn write_table<W: Write>(records: &[NormalizedRecord], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(HEADER)?;
    for record in records {
        let revenue_value = record.revenue_value.to_string();
        let profit_value = record.profit_value.to_string();
        csv_writer.write_record([
            record.raw.rank.as_str(),
            record.raw.company.as_str(),
            record.canonical_name.as_str(),
            record.raw.company_url.as_str(),
            record.raw.revenue.as_str(),
            record.raw.profit.as_str(),
            record.raw.country.as_str(),
            revenue_value.as_str(),
            profit_value.as_str(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes the CSV table and the three chart images into `out_dir`,
/// returning the paths written. Charts that fail to render are reported
/// as an error since there is no page to show a notice on.
pub fn export_visualizations(
    records: &[NormalizedRecord],
    renderer: &ChartRenderer,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;
    let mut written = Vec::new();

    let table_path = out_dir.join(TABLE_FILE);
    write_table(records, fs::File::create(&table_path)?)?;
    written.push(table_path);

    let charts = renderer.render_all(records);
    if let Some(notice) = charts.notices.first() {
        return Err(DashboardError::Render(notice.clone()));
    }

    for (file, chart) in [
        (REVENUE_FILE, &charts.revenue),
        (PROFIT_FILE, &charts.profit),
        (COUNTRY_FILE, &charts.countries),
    ] {
        if !chart.has_image() {
            continue;
        }
        let path = out_dir.join(file);
        fs::write(&path, &chart.png)?;
        written.push(path);
    }

    info!(files = written.len(), dir = %out_dir.display(), "exported visualizations");
    Ok(written)
}
