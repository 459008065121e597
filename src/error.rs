use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("HTTP server error: {0}")]
    Server(#[from] hyper::Error),

    #[error("Template rendering failed: {0}")]
    Template(#[from] askama::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scrape error: {0}")]
    Scrape(String),

    #[error("Chart rendering failed: {0}")]
    Render(String),

    /// The backing store is missing or cannot be read.
    #[error("Data unavailable at {}: {reason}", path.display())]
    DataUnavailable { path: PathBuf, reason: String },
}

impl DashboardError {
    pub fn data_unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, Self::DataUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
