use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::countries::CountryOverrides;
use crate::ConfigError;

/// One monitored retail brand, as configured in `brands.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandConfig {
    pub key: String,
    pub name: String,
    pub url: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BrandsFile {
    pub brands: Vec<BrandConfig>,
}

/// The immutable brand catalog plus country-specific URL overrides,
/// loaded once at startup.
#[derive(Debug, Clone)]
pub struct Catalog {
    brands: Vec<BrandConfig>,
    overrides: CountryOverrides,
}

impl Catalog {
    #[must_use]
    pub fn new(brands: Vec<BrandConfig>, overrides: CountryOverrides) -> Self {
        Self { brands, overrides }
    }

    #[must_use]
    pub fn brands(&self) -> &[BrandConfig] {
        &self.brands
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.brands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.brands.is_empty()
    }

    /// Resolve the storefront URL to scan for a brand in a given country.
    ///
    /// Falls back to the brand's canonical URL when the country (or the
    /// brand within it) has no override.
    #[must_use]
    pub fn url_for<'a>(&'a self, brand: &'a BrandConfig, country: Option<&str>) -> &'a str {
        country
            .and_then(|c| self.overrides.url_for(c, &brand.key))
            .unwrap_or(&brand.url)
    }
}

/// Load and validate the brand catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_brands(path: &Path) -> Result<BrandsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let brands_file: BrandsFile = serde_yaml::from_str(&content)?;

    validate_brands(&brands_file)?;

    Ok(brands_file)
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn validate_brands(brands_file: &BrandsFile) -> Result<(), ConfigError> {
    if brands_file.brands.is_empty() {
        return Err(ConfigError::Validation(
            "brand catalog must contain at least one brand".to_string(),
        ));
    }

    let mut seen_keys = HashSet::new();

    for brand in &brands_file.brands {
        if !is_valid_key(&brand.key) {
            return Err(ConfigError::Validation(format!(
                "brand key '{}' must be non-empty lowercase ascii (a-z, 0-9, '-')",
                brand.key
            )));
        }

        if brand.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "brand '{}' must have a non-empty display name",
                brand.key
            )));
        }

        if !brand.url.starts_with("http://") && !brand.url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "brand '{}' has url '{}' which is not http(s)",
                brand.key, brand.url
            )));
        }

        if !seen_keys.insert(brand.key.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand key: '{}'",
                brand.key
            )));
        }
    }

    Ok(())
}
