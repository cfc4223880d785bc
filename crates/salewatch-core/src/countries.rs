use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

/// Country-specific storefront URL overrides, keyed by lowercase country
/// code then brand key. Brands without an override fall back to their
/// canonical URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CountryOverrides {
    #[serde(default)]
    countries: HashMap<String, HashMap<String, String>>,
}

impl CountryOverrides {
    #[must_use]
    pub fn url_for(&self, country: &str, brand_key: &str) -> Option<&str> {
        self.countries
            .get(&country.to_lowercase())
            .and_then(|brands| brands.get(brand_key))
            .map(String::as_str)
    }

    /// Test helper: build overrides from `(country, brand key, url)` triples.
    #[must_use]
    pub fn from_pairs(pairs: &[(&str, &str, &str)]) -> Self {
        let mut countries: HashMap<String, HashMap<String, String>> = HashMap::new();
        for (country, key, url) in pairs {
            countries
                .entry((*country).to_lowercase())
                .or_default()
                .insert((*key).to_string(), (*url).to_string());
        }
        Self { countries }
    }
}

/// Load country URL overrides from a YAML file. A missing file is not an
/// error — the catalog simply has no per-country URLs.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_country_overrides(path: &Path) -> Result<CountryOverrides, ConfigError> {
    if !path.exists() {
        return Ok(CountryOverrides::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let overrides: CountryOverrides = serde_yaml::from_str(&content)?;
    Ok(overrides)
}
