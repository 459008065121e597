pub mod apis;
pub mod auth;
pub mod charts;
pub mod cleaner;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod logging;
pub mod pipeline;
pub mod server;
pub mod storage;
pub mod templates;
pub mod types;

pub use error::{DashboardError, Result};
pub use types::{CompanyRecord, NormalizedRecord, SearchFilter};
