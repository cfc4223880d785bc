mod api;
mod directory;
mod middleware;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use salewatch_core::Catalog;
use salewatch_scraper::{ChangeDetector, CycleRunner, PageFetcher};

use crate::api::{build_app, default_rate_limit_state, AppState};
use crate::directory::DirectoryClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = salewatch_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let brands = salewatch_core::load_brands(&config.brands_path)?;
    let categories = salewatch_core::load_categories(&config.categories_path)?;
    let overrides = salewatch_core::load_country_overrides(&config.countries_path)?;
    let catalog = Arc::new(Catalog::new(brands.brands, overrides));
    tracing::info!(
        env = %config.env,
        brands = catalog.len(),
        categories = categories.categories.len(),
        "catalog loaded"
    );

    let fetcher = PageFetcher::new(
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
    )?;
    let runner = Arc::new(CycleRunner::new(
        fetcher,
        catalog,
        Arc::new(categories.categories),
        config.scraper_group_size,
        Duration::from_millis(config.scraper_group_cooldown_ms),
    ));
    let detector = Arc::new(ChangeDetector::new(DirectoryClient::new(
        &config.directory_url,
    )));

    let _scheduler = scheduler::build_scheduler(
        Arc::clone(&runner),
        Arc::clone(&detector),
        config.default_country.clone(),
        &config.scan_cron,
    )
    .await?;

    let state = AppState {
        runner,
        detector,
        default_country: config.default_country.clone(),
    };
    let app = build_app(state, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "salewatch server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
