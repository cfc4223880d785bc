//! Sale-state change detection and subscriber notification fan-out.
//!
//! Per brand the detector keeps the last observed sale state and fires a
//! notification side effect on the no-sale→on-sale edge only. Sale endings
//! and repeat observations update the cache silently — the product tells
//! people when a sale begins, not when it fizzles out.

use serde::Serialize;
use thiserror::Error;

use crate::state::{SaleStatusCache, SaleTransition};
use crate::types::ScrapeResult;

/// Failure talking to the external subscriber/notification directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected directory status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("directory response body invalid: {0}")]
    Deserialize(#[from] serde_json::Error),
}

/// One notification record written per (subscriber, sale-start) pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleNotification {
    pub subscriber_id: String,
    pub brand_key: String,
    pub brand_name: String,
    pub sale_url: String,
    pub title: String,
    pub message: String,
}

impl SaleNotification {
    fn for_sale_start(subscriber_id: &str, result: &ScrapeResult) -> Self {
        let title = format!("{} is having a sale!", result.brand_name);
        let message = match (&result.sale_percentage, result.sale_text.is_empty()) {
            (Some(pct), _) => format!(
                "{} just started a sale — up to {pct}% off.",
                result.brand_name
            ),
            (None, false) => format!("{}: {}", result.brand_name, result.sale_text),
            (None, true) => format!("{} just started a sale — have a look.", result.brand_name),
        };
        Self {
            subscriber_id: subscriber_id.to_string(),
            brand_key: result.brand_key.clone(),
            brand_name: result.brand_name.clone(),
            sale_url: result.brand_url.clone(),
            title,
            message,
        }
    }
}

/// Seam to the external identity/notification store. The pipeline only ever
/// asks two things of it: who favorites a brand, and to persist one
/// notification record.
pub trait SubscriberStore {
    /// Identifiers of every subscriber currently favoriting `brand_key`.
    fn subscribers_of(
        &self,
        brand_key: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>, DirectoryError>> + Send;

    /// Persist one notification record.
    fn write_notification(
        &self,
        notification: &SaleNotification,
    ) -> impl std::future::Future<Output = Result<(), DirectoryError>> + Send;
}

/// Owns the long-lived per-brand sale-state cache and turns scrape results
/// into notification side effects.
pub struct ChangeDetector<S> {
    cache: SaleStatusCache,
    store: S,
}

impl<S: SubscriberStore> ChangeDetector<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            cache: SaleStatusCache::new(),
            store,
        }
    }

    #[must_use]
    pub fn cache(&self) -> &SaleStatusCache {
        &self.cache
    }

    /// Feed one cycle's results through the state machine. Returns the
    /// number of notification records successfully written.
    ///
    /// Results carrying an `error` are skipped entirely: a failed fetch is
    /// not an observation of sale state, and treating it as "no sale" would
    /// re-notify every subscriber once the site recovers.
    pub async fn process_cycle(&self, results: &[ScrapeResult]) -> usize {
        let mut written = 0;

        for result in results {
            if result.error.is_some() {
                continue;
            }

            let sale_url = result.sale_found.then(|| result.brand_url.clone());
            let transition = self
                .cache
                .observe(&result.brand_key, result.sale_found, sale_url)
                .await;

            if transition == SaleTransition::SaleStarted {
                tracing::info!(brand = %result.brand_key, "brand went on sale");
                written += self.notify_subscribers(result).await;
            }
        }

        written
    }

    /// Fan one sale-start out to every subscriber of the brand. Directory
    /// failures are logged and swallowed — the scrape cycle must survive a
    /// flaky notification store, and the state cache has already advanced.
    async fn notify_subscribers(&self, result: &ScrapeResult) -> usize {
        let subscribers = match self.store.subscribers_of(&result.brand_key).await {
            Ok(subscribers) => subscribers,
            Err(e) => {
                tracing::warn!(
                    brand = %result.brand_key,
                    error = %e,
                    "subscriber lookup failed; skipping notifications"
                );
                return 0;
            }
        };

        let mut written = 0;
        for subscriber_id in &subscribers {
            let notification = SaleNotification::for_sale_start(subscriber_id, result);
            match self.store.write_notification(&notification).await {
                Ok(()) => written += 1,
                Err(e) => {
                    tracing::warn!(
                        brand = %result.brand_key,
                        subscriber = %subscriber_id,
                        error = %e,
                        "notification write failed"
                    );
                }
            }
        }

        tracing::debug!(
            brand = %result.brand_key,
            subscribers = subscribers.len(),
            written,
            "sale-start notifications dispatched"
        );
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salewatch_core::BrandConfig;
    use tokio::sync::Mutex;

    struct RecordingStore {
        subscribers: Vec<String>,
        written: Mutex<Vec<SaleNotification>>,
        fail_lookup: bool,
        fail_write: bool,
    }

    impl RecordingStore {
        fn with_subscribers(subscribers: &[&str]) -> Self {
            Self {
                subscribers: subscribers.iter().map(|s| (*s).to_string()).collect(),
                written: Mutex::new(Vec::new()),
                fail_lookup: false,
                fail_write: false,
            }
        }
    }

    fn fake_error() -> DirectoryError {
        DirectoryError::Status {
            status: 503,
            url: "http://directory.test/".to_string(),
        }
    }

    impl SubscriberStore for RecordingStore {
        async fn subscribers_of(&self, _brand_key: &str) -> Result<Vec<String>, DirectoryError> {
            if self.fail_lookup {
                return Err(fake_error());
            }
            Ok(self.subscribers.clone())
        }

        async fn write_notification(
            &self,
            notification: &SaleNotification,
        ) -> Result<(), DirectoryError> {
            if self.fail_write {
                return Err(fake_error());
            }
            self.written.lock().await.push(notification.clone());
            Ok(())
        }
    }

    fn result_for(key: &str, sale_found: bool) -> ScrapeResult {
        let brand = BrandConfig {
            key: key.to_string(),
            name: format!("Brand {key}"),
            url: format!("https://{key}.example.com/"),
            notes: None,
        };
        let mut result = ScrapeResult::empty_for(&brand, &brand.url);
        result.sale_found = sale_found;
        if sale_found {
            result.sale_percentage = Some("40".to_string());
        }
        result
    }

    fn errored_result(key: &str) -> ScrapeResult {
        let mut result = result_for(key, false);
        result.error = Some("request timed out after 15s: https://x.example.com/".to_string());
        result
    }

    #[tokio::test]
    async fn first_observation_never_notifies() {
        let detector = ChangeDetector::new(RecordingStore::with_subscribers(&["u1", "u2"]));
        let written = detector.process_cycle(&[result_for("veloce", true)]).await;
        assert_eq!(written, 0);
        assert!(detector.cache().get("veloce").await.unwrap().has_sale);
    }

    #[tokio::test]
    async fn sale_start_notifies_every_subscriber_once() {
        let detector = ChangeDetector::new(RecordingStore::with_subscribers(&["u1", "u2", "u3"]));
        detector.process_cycle(&[result_for("veloce", false)]).await;
        let written = detector.process_cycle(&[result_for("veloce", true)]).await;
        assert_eq!(written, 3);

        let notifications = detector.store.written.lock().await;
        assert_eq!(notifications.len(), 3);
        assert!(notifications.iter().all(|n| n.brand_key == "veloce"));
        assert!(notifications[0].title.contains("Brand veloce"));
        assert!(notifications[0].message.contains("40%"));
        assert_eq!(
            notifications[0].sale_url,
            "https://veloce.example.com/"
        );
    }

    #[tokio::test]
    async fn unchanged_sale_state_is_silent() {
        let detector = ChangeDetector::new(RecordingStore::with_subscribers(&["u1"]));
        detector.process_cycle(&[result_for("veloce", true)]).await;
        let written = detector.process_cycle(&[result_for("veloce", true)]).await;
        assert_eq!(written, 0);
    }

    #[tokio::test]
    async fn sale_end_is_silent() {
        let detector = ChangeDetector::new(RecordingStore::with_subscribers(&["u1"]));
        detector.process_cycle(&[result_for("veloce", true)]).await;
        let written = detector.process_cycle(&[result_for("veloce", false)]).await;
        assert_eq!(written, 0);
        assert!(!detector.cache().get("veloce").await.unwrap().has_sale);
    }

    #[tokio::test]
    async fn errored_results_are_not_observations() {
        let detector = ChangeDetector::new(RecordingStore::with_subscribers(&["u1"]));
        detector.process_cycle(&[result_for("veloce", true)]).await;

        // A fetch outage must not look like the sale ended.
        detector.process_cycle(&[errored_result("veloce")]).await;
        assert!(detector.cache().get("veloce").await.unwrap().has_sale);

        // And recovery must not re-notify.
        let written = detector.process_cycle(&[result_for("veloce", true)]).await;
        assert_eq!(written, 0);
    }

    #[tokio::test]
    async fn lookup_failure_still_advances_cache() {
        let mut store = RecordingStore::with_subscribers(&["u1"]);
        store.fail_lookup = true;
        let detector = ChangeDetector::new(store);

        detector.process_cycle(&[result_for("veloce", false)]).await;
        let written = detector.process_cycle(&[result_for("veloce", true)]).await;
        assert_eq!(written, 0);

        // Cache advanced despite the failed lookup: no late re-fire.
        assert!(detector.cache().get("veloce").await.unwrap().has_sale);
        let written = detector.process_cycle(&[result_for("veloce", true)]).await;
        assert_eq!(written, 0);
    }

    #[tokio::test]
    async fn write_failure_is_swallowed() {
        let mut store = RecordingStore::with_subscribers(&["u1", "u2"]);
        store.fail_write = true;
        let detector = ChangeDetector::new(store);

        detector.process_cycle(&[result_for("veloce", false)]).await;
        let written = detector.process_cycle(&[result_for("veloce", true)]).await;
        assert_eq!(written, 0);
        assert!(detector.store.written.lock().await.is_empty());
    }

    #[tokio::test]
    async fn independent_brands_transition_independently() {
        let detector = ChangeDetector::new(RecordingStore::with_subscribers(&["u1"]));
        detector
            .process_cycle(&[result_for("veloce", false), result_for("northglen", false)])
            .await;
        let written = detector
            .process_cycle(&[result_for("veloce", true), result_for("northglen", false)])
            .await;
        assert_eq!(written, 1);
        let notifications = detector.store.written.lock().await;
        assert_eq!(notifications[0].brand_key, "veloce");
    }
}
