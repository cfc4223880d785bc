use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Browser-profile User-Agent sent by default. Many storefronts serve reduced
/// or blocked pages to obvious bot agents.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let directory_url = require("SALEWATCH_DIRECTORY_URL")?;

    let env = parse_environment(&or_default("SALEWATCH_ENV", "development"));

    let bind_addr = parse_addr("SALEWATCH_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("SALEWATCH_LOG_LEVEL", "info");
    let brands_path = PathBuf::from(or_default("SALEWATCH_BRANDS_PATH", "./config/brands.yaml"));
    let categories_path = PathBuf::from(or_default(
        "SALEWATCH_CATEGORIES_PATH",
        "./config/categories.yaml",
    ));
    let countries_path = PathBuf::from(or_default(
        "SALEWATCH_COUNTRIES_PATH",
        "./config/countries.yaml",
    ));
    let default_country = or_default("SALEWATCH_DEFAULT_COUNTRY", "us").to_lowercase();

    let scraper_request_timeout_secs = parse_u64("SALEWATCH_SCRAPER_REQUEST_TIMEOUT_SECS", "15")?;
    let scraper_group_size = parse_usize("SALEWATCH_SCRAPER_GROUP_SIZE", "5")?;
    let scraper_group_cooldown_ms = parse_u64("SALEWATCH_SCRAPER_GROUP_COOLDOWN_MS", "1000")?;
    let scraper_user_agent = or_default("SALEWATCH_SCRAPER_USER_AGENT", DEFAULT_USER_AGENT);
    let scan_cron = or_default("SALEWATCH_SCAN_CRON", "0 0 */6 * * *");

    if scraper_group_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "SALEWATCH_SCRAPER_GROUP_SIZE".to_string(),
            reason: "group size must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        brands_path,
        categories_path,
        countries_path,
        directory_url,
        default_country,
        scraper_request_timeout_secs,
        scraper_group_size,
        scraper_group_cooldown_ms,
        scraper_user_agent,
        scan_cron,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
