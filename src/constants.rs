/// Placeholder the scraper writes for missing text cells, and the value
/// the canonicalizer returns for absent names.
pub const NO_DATA: &str = "无数据";

/// Textual amounts that mean "value absent" and coerce to zero.
pub const NUMERIC_SENTINELS: [&str; 5] = [NO_DATA, "--", "—", "0", ""];

/// Placeholder the scraper writes for missing revenue/profit cells.
pub const ZERO_AMOUNT: &str = "0";

pub const COMPANY_TABLE: &str = "company_info";

// Source page for the 2025 ranking
pub const DEFAULT_RANKING_URL: &str =
    "https://www.fortunechina.com/fortune500/c/2025-07/29/content_467206.htm";
pub const DEFAULT_BASE_URL: &str = "https://www.fortunechina.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36 Edg/143.0.0.0";

pub const DEFAULT_DB_PATH: &str = "fortune500.db";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_LOG_DIR: &str = "logs";

pub const REVENUE_COLOR: [u8; 3] = [0x2E, 0x86, 0xAB];
pub const PROFIT_COLOR: [u8; 3] = [0xA2, 0x3B, 0x72];

/// Qualitative palette used for pie wedges, cycled when there are more
/// countries than colors.
pub const PIE_PALETTE: [[u8; 3]; 12] = [
    [0x8d, 0xd3, 0xc7],
    [0xff, 0xff, 0xb3],
    [0xbe, 0xba, 0xda],
    [0xfb, 0x80, 0x72],
    [0x80, 0xb1, 0xd3],
    [0xfd, 0xb4, 0x62],
    [0xb3, 0xde, 0x69],
    [0xfc, 0xcd, 0xe5],
    [0xd9, 0xd9, 0xd9],
    [0xbc, 0x80, 0xbd],
    [0xcc, 0xeb, 0xc5],
    [0xff, 0xed, 0x6f],
];

/// Hex form of an RGB triple, for legends in the page templates.
pub fn color_hex(rgb: [u8; 3]) -> String {
    format!("#{:02X}{:02X}{:02X}", rgb[0], rgb[1], rgb[2])
}
