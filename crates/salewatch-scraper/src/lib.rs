pub mod cycle;
pub mod detect;
pub mod error;
pub mod event;
pub mod extract;
pub mod fetch;
pub mod scrape;
pub mod state;
pub mod types;

pub use cycle::{CycleOutcome, CycleRunner};
pub use detect::{ChangeDetector, DirectoryError, SaleNotification, SubscriberStore};
pub use error::FetchError;
pub use event::{CycleSummary, ScrapeEvent};
pub use extract::{extract_sale_signal, SaleSignal};
pub use fetch::PageFetcher;
pub use scrape::{scrape_brand, BLOCKED_BRANDS, BLOCKED_MESSAGE};
pub use state::{BrandSaleStatus, FailedBrandsCache, SaleStatusCache, SaleTransition};
pub use types::{CategorizedResults, ScrapeResult};
