use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use salewatch_core::{BrandConfig, OTHER_CATEGORY};

use crate::extract::SaleSignal;

/// Outcome of scanning one brand's storefront. Exactly one is produced per
/// brand per cycle; fetch failures arrive as a populated `error`, never as
/// a missing result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    pub brand_key: String,
    pub brand_name: String,
    pub brand_url: String,
    pub sale_found: bool,
    pub sale_text: String,
    pub sale_percentage: Option<String>,
    pub sale_category: Option<String>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ScrapeResult {
    /// A no-sale result for a brand, timestamped now. The orchestrator
    /// fills in the signal or error afterwards.
    #[must_use]
    pub fn empty_for(brand: &BrandConfig, url: &str) -> Self {
        Self {
            brand_key: brand.key.clone(),
            brand_name: brand.name.clone(),
            brand_url: url.to_string(),
            sale_found: false,
            sale_text: String::new(),
            sale_percentage: None,
            sale_category: None,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn apply_signal(&mut self, signal: SaleSignal) {
        self.sale_found = signal.sale_found;
        self.sale_text = signal.sale_text;
        self.sale_percentage = signal.sale_percentage;
        self.sale_category = signal.sale_category;
    }
}

/// Sale results grouped by category key. The `other` bucket always exists,
/// catching sales with no classifiable category; per-bucket order is
/// completion order within the cycle.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct CategorizedResults {
    buckets: BTreeMap<String, Vec<ScrapeResult>>,
}

impl CategorizedResults {
    #[must_use]
    pub fn new() -> Self {
        let mut buckets = BTreeMap::new();
        buckets.insert(OTHER_CATEGORY.to_string(), Vec::new());
        Self { buckets }
    }

    /// Bucket one sale result by its category, defaulting to `other`.
    pub fn insert(&mut self, result: ScrapeResult) {
        let key = result
            .sale_category
            .clone()
            .unwrap_or_else(|| OTHER_CATEGORY.to_string());
        self.buckets.entry(key).or_default().push(result);
    }

    #[must_use]
    pub fn bucket(&self, key: &str) -> Option<&[ScrapeResult]> {
        self.buckets.get(key).map(Vec::as_slice)
    }

    /// Total number of bucketed results across all categories.
    #[must_use]
    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl Default for CategorizedResults {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brand(key: &str) -> BrandConfig {
        BrandConfig {
            key: key.to_string(),
            name: format!("Brand {key}"),
            url: format!("https://{key}.example.com/"),
            notes: None,
        }
    }

    fn sale_result(key: &str, category: Option<&str>) -> ScrapeResult {
        let b = brand(key);
        let mut result = ScrapeResult::empty_for(&b, &b.url);
        result.sale_found = true;
        result.sale_category = category.map(ToOwned::to_owned);
        result
    }

    #[test]
    fn other_bucket_always_present() {
        let categorized = CategorizedResults::new();
        assert_eq!(categorized.bucket("other").map(<[_]>::len), Some(0));
        assert!(categorized.is_empty());
    }

    #[test]
    fn uncategorized_sales_land_in_other() {
        let mut categorized = CategorizedResults::new();
        categorized.insert(sale_result("northglen", None));
        assert_eq!(categorized.bucket("other").map(<[_]>::len), Some(1));
    }

    #[test]
    fn insertion_order_is_preserved_per_bucket() {
        let mut categorized = CategorizedResults::new();
        categorized.insert(sale_result("northglen", Some("clearance")));
        categorized.insert(sale_result("veloce", Some("clearance")));
        let bucket = categorized.bucket("clearance").unwrap();
        assert_eq!(bucket[0].brand_key, "northglen");
        assert_eq!(bucket[1].brand_key, "veloce");
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let result = sale_result("northglen", Some("flash-sale"));
        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(json["brandKey"], "northglen");
        assert_eq!(json["saleFound"], true);
        assert!(json["salePercentage"].is_null());
        assert_eq!(json["saleCategory"], "flash-sale");
    }
}
