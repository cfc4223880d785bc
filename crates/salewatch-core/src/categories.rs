use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Bucket key for sales that matched a generic indicator but no configured
/// category's keywords.
pub const OTHER_CATEGORY: &str = "other";

/// One sale category with its ordered keyword list. Categories are checked
/// in configuration order; the first keyword hit wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleCategoryDefinition {
    pub key: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoriesFile {
    pub categories: Vec<SaleCategoryDefinition>,
}

/// Load and validate the sale category definitions from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_categories(path: &Path) -> Result<CategoriesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let categories_file: CategoriesFile = serde_yaml::from_str(&content)?;

    validate_categories(&categories_file)?;

    Ok(categories_file)
}

fn validate_categories(file: &CategoriesFile) -> Result<(), ConfigError> {
    let mut seen_keys = HashSet::new();

    for category in &file.categories {
        if category.key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "category key must be non-empty".to_string(),
            ));
        }

        if category.key == OTHER_CATEGORY {
            return Err(ConfigError::Validation(format!(
                "category key '{OTHER_CATEGORY}' is reserved for the catch-all bucket"
            )));
        }

        if category.keywords.is_empty() {
            return Err(ConfigError::Validation(format!(
                "category '{}' must have at least one keyword",
                category.key
            )));
        }

        if category.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "category '{}' contains an empty keyword",
                category.key
            )));
        }

        if !seen_keys.insert(category.key.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate category key: '{}'",
                category.key
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(key: &str, keywords: &[&str]) -> SaleCategoryDefinition {
        SaleCategoryDefinition {
            key: key.to_string(),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        }
    }

    #[test]
    fn validate_accepts_valid_categories() {
        let file = CategoriesFile {
            categories: vec![
                category("flash-sale", &["flash sale", "today only"]),
                category("clearance", &["clearance"]),
            ],
        };
        assert!(validate_categories(&file).is_ok());
    }

    #[test]
    fn validate_rejects_reserved_other_key() {
        let file = CategoriesFile {
            categories: vec![category("other", &["misc"])],
        };
        let err = validate_categories(&file).unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn validate_rejects_empty_keyword_list() {
        let file = CategoriesFile {
            categories: vec![category("clearance", &[])],
        };
        let err = validate_categories(&file).unwrap_err();
        assert!(err.to_string().contains("at least one keyword"));
    }

    #[test]
    fn validate_rejects_duplicate_keys() {
        let file = CategoriesFile {
            categories: vec![
                category("clearance", &["clearance"]),
                category("clearance", &["outlet"]),
            ],
        };
        let err = validate_categories(&file).unwrap_err();
        assert!(err.to_string().contains("duplicate category key"));
    }

    #[test]
    fn load_categories_from_real_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("categories.yaml");
        assert!(
            path.exists(),
            "categories.yaml missing at {path:?} — required for this test"
        );
        let result = load_categories(&path);
        assert!(result.is_ok(), "failed to load categories.yaml: {result:?}");
        assert!(!result.unwrap().categories.is_empty());
    }
}
