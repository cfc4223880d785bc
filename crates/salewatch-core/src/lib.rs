mod app_config;
mod catalog;
mod categories;
mod config;
mod countries;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use catalog::{load_brands, BrandConfig, BrandsFile, Catalog};
pub use categories::{load_categories, CategoriesFile, SaleCategoryDefinition, OTHER_CATEGORY};
pub use config::{load_app_config, load_app_config_from_env};
pub use countries::{load_country_overrides, CountryOverrides};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read config file {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    FileParse(#[from] serde_yaml::Error),

    #[error("config validation failed: {0}")]
    Validation(String),
}
