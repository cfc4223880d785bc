//! Typed events emitted during a streaming scrape cycle.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{CategorizedResults, ScrapeResult};

/// Terminal payload of a cycle: the complete result list, the categorized
/// view, and the completion timestamp. Also the body of a non-streaming
/// response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSummary {
    pub results: Vec<ScrapeResult>,
    pub categorized_results: CategorizedResults,
    pub country: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// One framed event on a streaming scrape response.
///
/// Sequence contract: one `BrandResult` per settled brand in completion
/// order, a `CategorizedUpdate` snapshot after every bucket change, and
/// exactly one terminal `Complete` after everything else.
#[derive(Debug, Clone)]
pub enum ScrapeEvent {
    BrandResult(ScrapeResult),
    CategorizedUpdate(CategorizedResults),
    Complete(CycleSummary),
}

impl ScrapeEvent {
    /// Wire-visible event name used for transport framing (SSE event field).
    #[must_use]
    pub fn event_name(&self) -> &'static str {
        match self {
            ScrapeEvent::BrandResult(_) => "brand-result",
            ScrapeEvent::CategorizedUpdate(_) => "categorized-update",
            ScrapeEvent::Complete(_) => "complete",
        }
    }

    /// Serialize the event payload to JSON.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn payload_json(&self) -> Result<String, serde_json::Error> {
        match self {
            ScrapeEvent::BrandResult(result) => serde_json::to_string(result),
            ScrapeEvent::CategorizedUpdate(categorized) => serde_json::to_string(categorized),
            ScrapeEvent::Complete(summary) => serde_json::to_string(summary),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_match_wire_contract() {
        let summary = CycleSummary {
            results: vec![],
            categorized_results: CategorizedResults::new(),
            country: Some("gb".to_string()),
            timestamp: Utc::now(),
        };
        assert_eq!(
            ScrapeEvent::CategorizedUpdate(CategorizedResults::new()).event_name(),
            "categorized-update"
        );
        assert_eq!(ScrapeEvent::Complete(summary).event_name(), "complete");
    }

    #[test]
    fn complete_payload_serializes_camel_case() {
        let summary = CycleSummary {
            results: vec![],
            categorized_results: CategorizedResults::new(),
            country: None,
            timestamp: Utc::now(),
        };
        let json = ScrapeEvent::Complete(summary).payload_json().expect("json");
        assert!(json.contains("\"categorizedResults\""));
        assert!(json.contains("\"other\":[]"));
    }
}
