//! Shared scrape-cycle state.
//!
//! Both caches are explicit objects with constructor-controlled lifecycles:
//! [`FailedBrandsCache`] lives for exactly one cycle and is owned by the
//! cycle runner; [`SaleStatusCache`] lives for the process and is owned by
//! the change detector.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

/// Brand keys that errored during the current scrape cycle. Consulted
/// before every fetch so a brand that just failed is not hammered again
/// within the same cycle. Concurrent inserts of the same key are benign.
#[derive(Debug, Default)]
pub struct FailedBrandsCache {
    inner: Mutex<HashSet<String>>,
}

impl FailedBrandsCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, brand_key: &str) {
        self.inner.lock().await.insert(brand_key.to_string());
    }

    pub async fn contains(&self, brand_key: &str) -> bool {
        self.inner.lock().await.contains(brand_key)
    }

    pub async fn clear(&self) {
        self.inner.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

/// Last known sale state for one brand. Used only for edge detection —
/// current-state queries always re-scrape.
#[derive(Debug, Clone)]
pub struct BrandSaleStatus {
    pub has_sale: bool,
    pub last_checked: DateTime<Utc>,
    pub sale_url: Option<String>,
}

/// Edge produced by feeding one observation into the status cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleTransition {
    /// No cached baseline existed for this brand.
    FirstObservation,
    /// Cached no-sale, observed on-sale — the only edge that notifies.
    SaleStarted,
    /// Cached on-sale, observed no-sale. Deliberately silent.
    SaleEnded,
    Unchanged,
}

/// Cross-cycle memory of which brands are currently on sale. Entries are
/// created lazily on first observation and never deleted while the process
/// runs.
#[derive(Debug, Default)]
pub struct SaleStatusCache {
    inner: Mutex<HashMap<String, BrandSaleStatus>>,
}

impl SaleStatusCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation and report the edge it produced. The cache
    /// updates unconditionally — edge classification happens against the
    /// state before the update.
    pub async fn observe(
        &self,
        brand_key: &str,
        has_sale: bool,
        sale_url: Option<String>,
    ) -> SaleTransition {
        let mut inner = self.inner.lock().await;

        let transition = match inner.get(brand_key) {
            None => SaleTransition::FirstObservation,
            Some(previous) if !previous.has_sale && has_sale => SaleTransition::SaleStarted,
            Some(previous) if previous.has_sale && !has_sale => SaleTransition::SaleEnded,
            Some(_) => SaleTransition::Unchanged,
        };

        inner.insert(
            brand_key.to_string(),
            BrandSaleStatus {
                has_sale,
                last_checked: Utc::now(),
                sale_url,
            },
        );

        transition
    }

    pub async fn get(&self, brand_key: &str) -> Option<BrandSaleStatus> {
        self.inner.lock().await.get(brand_key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}
