use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub brands_path: PathBuf,
    pub categories_path: PathBuf,
    pub countries_path: PathBuf,
    pub directory_url: String,
    pub default_country: String,
    pub scraper_request_timeout_secs: u64,
    pub scraper_group_size: usize,
    pub scraper_group_cooldown_ms: u64,
    pub scraper_user_agent: String,
    pub scan_cron: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("brands_path", &self.brands_path)
            .field("categories_path", &self.categories_path)
            .field("countries_path", &self.countries_path)
            .field("directory_url", &"[redacted]")
            .field("default_country", &self.default_country)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_group_size", &self.scraper_group_size)
            .field("scraper_group_cooldown_ms", &self.scraper_group_cooldown_ms)
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("scan_cron", &self.scan_cron)
            .finish()
    }
}
