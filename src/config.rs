use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_DB_PATH, DEFAULT_LOG_DIR, DEFAULT_RANKING_URL, DEFAULT_USER_AGENT,
};
use crate::error::{DashboardError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub scraper: ScraperConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub charts: ChartsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub url: String,
    pub base_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_RANKING_URL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let host = if self.host.eq_ignore_ascii_case("localhost") {
            "127.0.0.1"
        } else {
            self.host.as_str()
        };
        format!("{}:{}", host, self.port)
            .parse()
            .map_err(|e| DashboardError::Config(format!("invalid listen address '{}:{}': {}", self.host, self.port, e)))
    }
}

/// Static username -> password table for the login page.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub users: BTreeMap<String, String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let users = [("admin", "admin123"), ("user", "user123")]
            .into_iter()
            .map(|(u, p)| (u.to_string(), p.to_string()))
            .collect();
        Self { users }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChartsConfig {
    /// Companies shown in the revenue and profit bar charts.
    pub top_n: usize,
    /// Countries shown in the distribution pie.
    pub top_countries: usize,
    pub width: u32,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            top_countries: 10,
            width: 880,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

impl AppConfig {
    /// Reads `path` if it exists (defaults otherwise), then applies `.env`
    /// and `FORTUNE_*` environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = if path.is_file() {
            let content = fs::read_to_string(path).map_err(|e| {
                DashboardError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
            })?;
            let parsed = Self::from_toml(&content)?;
            info!(path = %path.display(), "loaded configuration");
            parsed
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db) = var("FORTUNE_DB_PATH") {
            self.storage.db_path = PathBuf::from(db);
        }
        if let Some(host) = var("FORTUNE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("FORTUNE_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| DashboardError::Config(format!("FORTUNE_PORT is not a valid port: '{}'", port)))?;
        }
        if let Some(dir) = var("FORTUNE_LOG_DIR") {
            self.logging.dir = PathBuf::from(dir);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.auth.users.is_empty() {
            return Err(DashboardError::Config("auth.users must name at least one account".into()));
        }
        if self.charts.top_n == 0 || self.charts.top_countries == 0 {
            return Err(DashboardError::Config("charts.top_n and charts.top_countries must be positive".into()));
        }
        if self.charts.width < 200 {
            return Err(DashboardError::Config("charts.width must be at least 200 pixels".into()));
        }
        Ok(())
    }
}
