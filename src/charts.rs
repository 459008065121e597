//! Raster charts for the dashboard: revenue and profit bars for the top
//! companies, and a pie of the most represented countries.
//!
//! Images carry no text; names, values and colors are returned alongside
//! each chart as legend entries for the page to render.

use crate::config::ChartsConfig;
use crate::constants::{color_hex, PIE_PALETTE, PROFIT_COLOR, REVENUE_COLOR};
use crate::error::{DashboardError, Result};
use crate::types::NormalizedRecord;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, Rgb, RgbImage};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Cursor;
use tracing::{debug, warn};

const MIN_WIDTH: u32 = 200;
const MARGIN: u32 = 16;
const ROW_HEIGHT: u32 = 36;
const GRID_LINES: u32 = 5;

const BACKGROUND: Rgb<u8> = Rgb([0xFF, 0xFF, 0xFF]);
const GRID: Rgb<u8> = Rgb([0xE4, 0xE4, 0xE4]);
const AXIS: Rgb<u8> = Rgb([0x55, 0x55, 0x55]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartOptions {
    pub top_n: usize,
    pub top_countries: usize,
    pub width: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        (&ChartsConfig::default()).into()
    }
}

impl From<&ChartsConfig> for ChartOptions {
    fn from(config: &ChartsConfig) -> Self {
        Self {
            top_n: config.top_n,
            top_countries: config.top_countries,
            width: config.width,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartEntry {
    pub label: String,
    pub value: f64,
    /// Percentage of the charted total; only meaningful for the pie.
    pub share: f64,
    pub color: String,
}

impl ChartEntry {
    pub fn value_text(&self) -> String {
        format_amount(self.value)
    }

    pub fn share_text(&self) -> String {
        format!("{:.1}%", self.share)
    }
}

/// Two decimals with `,` thousands separators, e.g. `-1,234.50`.
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Chart {
    pub title: String,
    #[serde(skip)]
    pub png: Vec<u8>,
    pub image_base64: String,
    pub entries: Vec<ChartEntry>,
}

impl Chart {
    fn empty(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    fn encoded(title: &str, image: RgbImage, entries: Vec<ChartEntry>) -> Result<Self> {
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(Self {
            title: title.to_string(),
            image_base64: STANDARD.encode(&png),
            png,
            entries,
        })
    }

    pub fn has_image(&self) -> bool {
        !self.png.is_empty()
    }
}

/// The three dashboard charts plus any rendering notices.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChartSet {
    pub revenue: Chart,
    pub profit: Chart,
    pub countries: Chart,
    pub notices: Vec<String>,
}

pub const REVENUE_TITLE: &str = "营收排行（百万美元）";
pub const PROFIT_TITLE: &str = "利润对比（百万美元）";
pub const COUNTRY_TITLE: &str = "上榜国家分布";

#[derive(Debug, Clone, Copy, Default)]
pub struct ChartRenderer {
    options: ChartOptions,
}

impl ChartRenderer {
    pub fn new(options: ChartOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ChartOptions {
        &self.options
    }

    /// Renders every chart. A chart that fails is replaced by an empty one
    /// and a notice; the others are unaffected.
    pub fn render_all(&self, records: &[NormalizedRecord]) -> ChartSet {
        let mut notices = Vec::new();
        let mut guard = |title: &str, result: Result<Chart>| match result {
            Ok(chart) => chart,
            Err(e) => {
                warn!(chart = title, error = %e, "chart rendering failed");
                notices.push(format!("{}生成失败：{}", title, e));
                Chart::empty(title)
            }
        };

        let revenue = guard(REVENUE_TITLE, self.revenue_chart(records));
        let profit = guard(PROFIT_TITLE, self.profit_chart(records));
        let countries = guard(COUNTRY_TITLE, self.country_chart(records));
        ChartSet {
            revenue,
            profit,
            countries,
            notices,
        }
    }

    /// Highest-revenue records, at most `top_n`, ties in input order.
    pub fn top_by_revenue<'a>(&self, records: &'a [NormalizedRecord]) -> Vec<&'a NormalizedRecord> {
        let mut top: Vec<&NormalizedRecord> = records.iter().collect();
        top.sort_by(|a, b| b.revenue_value.total_cmp(&a.revenue_value));
        top.truncate(self.options.top_n);
        top
    }

    pub fn revenue_chart(&self, records: &[NormalizedRecord]) -> Result<Chart> {
        let top = self.top_by_revenue(records);
        let bars: Vec<(String, f64)> = top
            .iter()
            .map(|r| (r.canonical_name.clone(), r.revenue_value))
            .collect();
        self.bar_chart(REVENUE_TITLE, &bars, REVENUE_COLOR)
    }

    /// Profits of the same companies shown in the revenue chart.
    pub fn profit_chart(&self, records: &[NormalizedRecord]) -> Result<Chart> {
        let top = self.top_by_revenue(records);
        let bars: Vec<(String, f64)> = top
            .iter()
            .map(|r| (r.canonical_name.clone(), r.profit_value))
            .collect();
        self.bar_chart(PROFIT_TITLE, &bars, PROFIT_COLOR)
    }

    pub fn country_chart(&self, records: &[NormalizedRecord]) -> Result<Chart> {
        let counts = country_counts(records, self.options.top_countries);
        if counts.is_empty() {
            return Ok(Chart::empty(COUNTRY_TITLE));
        }
        self.check_width()?;

        let total: usize = counts.iter().map(|(_, n)| n).sum();
        let entries: Vec<ChartEntry> = counts
            .iter()
            .enumerate()
            .map(|(i, (country, n))| ChartEntry {
                label: country.clone(),
                value: *n as f64,
                share: *n as f64 * 100.0 / total as f64,
                color: color_hex(PIE_PALETTE[i % PIE_PALETTE.len()]),
            })
            .collect();

        let fractions: Vec<f64> = counts.iter().map(|(_, n)| *n as f64 / total as f64).collect();
        let image = draw_pie(self.options.width, &fractions);
        debug!(wedges = entries.len(), "rendered country pie");
        Chart::encoded(COUNTRY_TITLE, image, entries)
    }

    fn check_width(&self) -> Result<()> {
        if self.options.width < MIN_WIDTH {
            return Err(DashboardError::Render(format!(
                "chart width {} is below the {} pixel minimum",
                self.options.width, MIN_WIDTH
            )));
        }
        Ok(())
    }

    fn bar_chart(&self, title: &str, bars: &[(String, f64)], color: [u8; 3]) -> Result<Chart> {
        if bars.is_empty() {
            return Ok(Chart::empty(title));
        }
        self.check_width()?;

        let values: Vec<f64> = bars.iter().map(|(_, v)| *v).collect();
        let image = draw_bars(self.options.width, &values, Rgb(color));
        let entries = bars
            .iter()
            .map(|(label, value)| ChartEntry {
                label: label.clone(),
                value: *value,
                share: 0.0,
                color: color_hex(color),
            })
            .collect();
        debug!(chart = title, bars = bars.len(), "rendered bar chart");
        Chart::encoded(title, image, entries)
    }
}

/// Record count per country, most common first, at most `limit` entries.
/// Equal counts keep first-seen order.
pub fn country_counts(records: &[NormalizedRecord], limit: usize) -> Vec<(String, usize)> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        let country = record.raw.country.as_str();
        *counts.entry(country).or_insert_with(|| {
            order.push(country);
            0
        }) += 1;
    }

    let mut ranked: Vec<(String, usize)> = order
        .into_iter()
        .map(|c| (c.to_string(), counts[c]))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(limit);
    ranked
}

fn fill_rect(image: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
    let x1 = x1.min(image.width());
    let y1 = y1.min(image.height());
    for y in y0..y1 {
        for x in x0..x1 {
            image.put_pixel(x, y, color);
        }
    }
}

/// Horizontal bars, first value on top. Negative values extend left of
/// the zero axis.
fn draw_bars(width: u32, values: &[f64], color: Rgb<u8>) -> RgbImage {
    let height = MARGIN * 2 + ROW_HEIGHT * values.len() as u32;
    let mut image = RgbImage::from_pixel(width, height, BACKGROUND);

    let lo = values.iter().copied().fold(0.0_f64, f64::min);
    let hi = values.iter().copied().fold(0.0_f64, f64::max);
    let span = if hi > lo { hi - lo } else { 1.0 };
    let plot = (width - 2 * MARGIN) as f64;
    let x_of = |v: f64| MARGIN + (((v - lo) / span) * plot).round() as u32;

    for i in 0..=GRID_LINES {
        let x = MARGIN + (plot * i as f64 / GRID_LINES as f64).round() as u32;
        fill_rect(&mut image, x.min(width - 1), MARGIN, x.min(width - 1) + 1, height - MARGIN, GRID);
    }

    let bar_height = ROW_HEIGHT * 7 / 10;
    let pad = (ROW_HEIGHT - bar_height) / 2;
    for (i, value) in values.iter().enumerate() {
        let top = MARGIN + ROW_HEIGHT * i as u32 + pad;
        let (start, end) = (x_of(value.min(0.0)), x_of(value.max(0.0)));
        // keep tiny non-zero bars visible
        let end = if end == start && *value != 0.0 { end + 1 } else { end };
        fill_rect(&mut image, start, top, end, top + bar_height, color);
    }

    let zero = x_of(0.0).min(width - 1);
    fill_rect(&mut image, zero, MARGIN, zero + 1, height - MARGIN, AXIS);
    image
}

/// Pie with wedges laid out counter-clockwise from twelve o'clock.
fn draw_pie(width: u32, fractions: &[f64]) -> RgbImage {
    let height = width * 2 / 3;
    let mut image = RgbImage::from_pixel(width, height, BACKGROUND);

    let cx = width as f64 / 2.0;
    let cy = height as f64 / 2.0;
    let radius = height as f64 * 0.42;

    let mut bounds = Vec::with_capacity(fractions.len());
    let mut acc = 0.0;
    for f in fractions {
        acc += f;
        bounds.push(acc);
    }

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let dx = x as f64 + 0.5 - cx;
        let dy = cy - (y as f64 + 0.5);
        if dx * dx + dy * dy > radius * radius {
            continue;
        }
        let angle = dy.atan2(dx).to_degrees();
        let position = (angle - 90.0).rem_euclid(360.0) / 360.0;
        let wedge = bounds
            .iter()
            .position(|b| position < *b)
            .unwrap_or(fractions.len() - 1);
        *pixel = Rgb(PIE_PALETTE[wedge % PIE_PALETTE.len()]);
    }
    image
}
