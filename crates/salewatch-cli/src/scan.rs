//! One-shot scan command: run a full scrape cycle from the terminal.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;

use salewatch_core::Catalog;
use salewatch_scraper::{CycleRunner, PageFetcher, ScrapeResult};

#[derive(Debug, Args)]
pub(crate) struct ScanArgs {
    /// Two-letter country code used to resolve storefront URL overrides.
    #[arg(long)]
    country: Option<String>,

    /// Restrict the scan to a single brand key.
    #[arg(long)]
    brand: Option<String>,

    /// Print the aggregate document as JSON instead of a summary table.
    #[arg(long)]
    json: bool,
}

pub(crate) async fn run(args: ScanArgs) -> anyhow::Result<()> {
    let config = salewatch_core::load_app_config()?;

    let brands = salewatch_core::load_brands(&config.brands_path)?;
    let categories = salewatch_core::load_categories(&config.categories_path)?;
    let overrides = salewatch_core::load_country_overrides(&config.countries_path)?;

    let selected: Vec<_> = match &args.brand {
        Some(key) => {
            let brands: Vec<_> = brands
                .brands
                .into_iter()
                .filter(|b| &b.key == key)
                .collect();
            if brands.is_empty() {
                anyhow::bail!("brand '{key}' not found in the catalog");
            }
            brands
        }
        None => brands.brands,
    };

    let catalog = Arc::new(Catalog::new(selected, overrides));
    let fetcher = PageFetcher::new(
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
    )?;
    let runner = CycleRunner::new(
        fetcher,
        catalog,
        Arc::new(categories.categories),
        config.scraper_group_size,
        Duration::from_millis(config.scraper_group_cooldown_ms),
    );

    let country = args
        .country
        .map(|c| c.to_lowercase())
        .unwrap_or_else(|| config.default_country.clone());

    tracing::info!(
        brands = runner.catalog().len(),
        country = %country,
        "starting scan cycle"
    );
    let outcome = runner.run_cycle(Some(&country), None).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.summary())?);
    } else {
        print_summary(&outcome.results);
        println!(
            "\n{} brands scanned, {} on sale",
            outcome.results.len(),
            outcome.categorized.total()
        );
    }

    Ok(())
}

fn print_summary(results: &[ScrapeResult]) {
    for result in results {
        let status = match (&result.error, result.sale_found) {
            (Some(error), _) => format!("error: {error}"),
            (None, true) => {
                let category = result.sale_category.as_deref().unwrap_or("other");
                match &result.sale_percentage {
                    Some(pct) => format!("SALE [{category}] {pct}% — {}", result.sale_text),
                    None => format!("SALE [{category}] — {}", result.sale_text),
                }
            }
            (None, false) => "no sale".to_string(),
        };
        println!("{:<12} {status}", result.brand_key);
    }
}
