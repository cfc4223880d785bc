//! The scrape trigger endpoint: one full cycle, aggregate or streamed.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Extension, Json,
};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt as _;

use salewatch_scraper::ScrapeEvent;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

/// Events buffered ahead of a slow SSE consumer before the cycle blocks.
const EVENT_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Deserialize)]
pub(super) struct SalesQuery {
    country: Option<String>,
    stream: Option<bool>,
}

/// Run a full scrape cycle for the requested country.
///
/// Without `stream=true`, blocks until the whole catalog is processed and
/// returns the aggregate document. With it, responds immediately with an
/// SSE stream of `brand-result` / `categorized-update` / `complete` frames
/// and closes the stream after the terminal event.
pub(super) async fn scan_sales(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SalesQuery>,
) -> Response {
    let country = match query.country {
        Some(c) => {
            if c.len() != 2 || !c.chars().all(|ch| ch.is_ascii_alphabetic()) {
                return ApiError::new(
                    req_id.0,
                    "validation_error",
                    format!("'{c}' is not a two-letter country code"),
                )
                .into_response();
            }
            c.to_lowercase()
        }
        None => state.default_country.clone(),
    };

    if query.stream.unwrap_or(false) {
        stream_cycle(state, country)
    } else {
        run_aggregate_cycle(state, country, req_id).await
    }
}

async fn run_aggregate_cycle(state: AppState, country: String, req_id: RequestId) -> Response {
    let outcome = state.runner.run_cycle(Some(&country), None).await;
    let written = state.detector.process_cycle(&outcome.results).await;
    if written > 0 {
        tracing::info!(written, "sale-start notifications written");
    }

    Json(ApiResponse {
        data: outcome.summary(),
        meta: ResponseMeta::new(req_id.0),
    })
    .into_response()
}

fn stream_cycle(state: AppState, country: String) -> Response {
    let (tx, rx) = mpsc::channel::<ScrapeEvent>(EVENT_CHANNEL_CAPACITY);

    let runner = Arc::clone(&state.runner);
    let detector = Arc::clone(&state.detector);

    // The cycle task outlives a disconnecting client on purpose: in-flight
    // scrapes must still settle and feed the sale-state cache.
    tokio::spawn(async move {
        let outcome = runner.run_cycle(Some(&country), Some(tx)).await;
        let written = detector.process_cycle(&outcome.results).await;
        if written > 0 {
            tracing::info!(written, "sale-start notifications written");
        }
    });

    let stream = ReceiverStream::new(rx).filter_map(|event| match event.payload_json() {
        Ok(json) => Some(Ok::<_, Infallible>(
            Event::default().event(event.event_name()).data(json),
        )),
        Err(e) => {
            tracing::warn!(error = %e, event = event.event_name(), "dropping unserializable event");
            None
        }
    });

    Sse::new(stream)
        .keep_alive(KeepAlive::default().interval(Duration::from_secs(15)))
        .into_response()
}
