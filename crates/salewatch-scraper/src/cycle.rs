//! The batch scheduler: one full pass over the brand catalog.
//!
//! The catalog is split into consecutive fixed-size groups; each group's
//! scrapes run concurrently and all settle before the next group starts,
//! with a cooldown between groups to throttle the aggregate request rate
//! against the monitored sites. A failure in one brand never cancels its
//! siblings.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;

use salewatch_core::{Catalog, SaleCategoryDefinition};

use crate::event::{CycleSummary, ScrapeEvent};
use crate::fetch::PageFetcher;
use crate::scrape::scrape_brand;
use crate::state::FailedBrandsCache;
use crate::types::{CategorizedResults, ScrapeResult};

/// Everything one scrape cycle produced.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub results: Vec<ScrapeResult>,
    pub categorized: CategorizedResults,
    pub country: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl CycleOutcome {
    /// The terminal payload handed to clients, streaming or not.
    #[must_use]
    pub fn summary(&self) -> CycleSummary {
        CycleSummary {
            results: self.results.clone(),
            categorized_results: self.categorized.clone(),
            country: self.country.clone(),
            timestamp: self.completed_at,
        }
    }
}

/// Drives full scrape cycles over an immutable catalog.
///
/// Owns the cycle-scoped [`FailedBrandsCache`] lifecycle: a fresh cache is
/// created at the start of every cycle and discarded with it.
pub struct CycleRunner {
    fetcher: PageFetcher,
    catalog: Arc<Catalog>,
    categories: Arc<Vec<SaleCategoryDefinition>>,
    group_size: usize,
    group_cooldown: Duration,
}

impl CycleRunner {
    #[must_use]
    pub fn new(
        fetcher: PageFetcher,
        catalog: Arc<Catalog>,
        categories: Arc<Vec<SaleCategoryDefinition>>,
        group_size: usize,
        group_cooldown: Duration,
    ) -> Self {
        Self {
            fetcher,
            catalog,
            categories,
            group_size: group_size.max(1),
            group_cooldown,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Run one full scrape cycle, optionally emitting streaming events.
    ///
    /// With an event sender attached, every settled brand is emitted
    /// immediately, every bucket change ships a full categorized snapshot,
    /// and one terminal [`ScrapeEvent::Complete`] follows after all groups
    /// settle. A dropped receiver stops emission but the cycle runs to
    /// completion so shared caches still update.
    pub async fn run_cycle(
        &self,
        country: Option<&str>,
        mut events: Option<mpsc::Sender<ScrapeEvent>>,
    ) -> CycleOutcome {
        let failed = FailedBrandsCache::new();
        let mut results: Vec<ScrapeResult> = Vec::with_capacity(self.catalog.len());
        let mut categorized = CategorizedResults::new();

        let brands = self.catalog.brands();
        let group_count = brands.chunks(self.group_size).len();

        tracing::info!(
            brands = brands.len(),
            groups = group_count,
            group_size = self.group_size,
            country = country.unwrap_or("-"),
            "starting scrape cycle"
        );

        for (index, group) in brands.chunks(self.group_size).enumerate() {
            let mut settled = stream::iter((0..group.len()).map(|i| {
                let brand = &group[i];
                let url = self.catalog.url_for(brand, country);
                scrape_brand(&self.fetcher, &self.categories, brand, url, &failed)
            }))
            .buffer_unordered(group.len());

            // Drain in true completion order: the emitter contract requires
            // events to reflect when each scrape settled, not launch order.
            while let Some(result) = settled.next().await {
                emit(&mut events, ScrapeEvent::BrandResult(result.clone())).await;

                if result.sale_found {
                    categorized.insert(result.clone());
                    emit(
                        &mut events,
                        ScrapeEvent::CategorizedUpdate(categorized.clone()),
                    )
                    .await;
                }

                results.push(result);
            }

            if index + 1 < group_count {
                tokio::time::sleep(self.group_cooldown).await;
            }
        }

        let outcome = CycleOutcome {
            results,
            categorized,
            country: country.map(str::to_lowercase),
            completed_at: Utc::now(),
        };

        let failed_count = failed.len().await;
        tracing::info!(
            results = outcome.results.len(),
            sales = outcome.categorized.total(),
            failed = failed_count,
            "scrape cycle complete"
        );

        emit(&mut events, ScrapeEvent::Complete(outcome.summary())).await;

        outcome
    }
}

/// Best-effort event emission with back-pressure. A send failure means the
/// receiver hung up; emission stops but the cycle must not.
async fn emit(events: &mut Option<mpsc::Sender<ScrapeEvent>>, event: ScrapeEvent) {
    if let Some(tx) = events {
        if tx.send(event).await.is_err() {
            tracing::debug!("event receiver dropped; finishing cycle without emission");
            *events = None;
        }
    }
}
