//! Per-brand scrape orchestration.
//!
//! Composes the fetcher and extractor for one brand and normalizes every
//! outcome — success, no-sale, network error, blocked — into a single
//! [`ScrapeResult`]. This function never fails; per-brand errors are data.

use salewatch_core::{BrandConfig, SaleCategoryDefinition};

use crate::extract::extract_sale_signal;
use crate::fetch::PageFetcher;
use crate::state::FailedBrandsCache;
use crate::types::ScrapeResult;

/// Brands whose storefronts consistently reject automated traffic. Scraping
/// them wastes the group's time budget and risks blocking the egress IP for
/// the rest of the catalog.
pub const BLOCKED_BRANDS: &[&str] = &["kestrel", "wrenfield"];

/// Error message recorded for denylisted brands and for brands already in
/// the cycle's failed cache.
pub const BLOCKED_MESSAGE: &str = "Website blocks automated requests";

/// Scrape one brand's storefront and classify the page for sale signals.
///
/// Denylisted brands and brands that already failed this cycle short-circuit
/// without any network call. A fetch failure records the brand in `failed`
/// so later group members skip it, and surfaces the classified message in
/// the result's `error` field.
pub async fn scrape_brand(
    fetcher: &PageFetcher,
    categories: &[SaleCategoryDefinition],
    brand: &BrandConfig,
    url: &str,
    failed: &FailedBrandsCache,
) -> ScrapeResult {
    let mut result = ScrapeResult::empty_for(brand, url);

    if BLOCKED_BRANDS.contains(&brand.key.as_str()) || failed.contains(&brand.key).await {
        tracing::debug!(brand = %brand.key, "skipping brand known to block requests");
        result.error = Some(BLOCKED_MESSAGE.to_string());
        return result;
    }

    match fetcher.fetch_page(url).await {
        Ok(body) => {
            let signal = extract_sale_signal(&body, categories);
            tracing::debug!(
                brand = %brand.key,
                sale_found = signal.sale_found,
                category = signal.sale_category.as_deref().unwrap_or("-"),
                "scanned brand page"
            );
            result.apply_signal(signal);
        }
        Err(e) => {
            tracing::warn!(brand = %brand.key, error = %e, "brand page fetch failed");
            failed.insert(&brand.key).await;
            result.error = Some(e.to_string());
        }
    }

    result
}
