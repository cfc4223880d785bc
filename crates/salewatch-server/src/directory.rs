//! HTTP client for the external identity/notification directory.
//!
//! The directory owns all durable state: who favorites which brand, and the
//! notification records the change detector produces. This client is the
//! only code that talks to it.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use salewatch_scraper::{DirectoryError, SaleNotification, SubscriberStore};

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscribersResponse {
    subscriber_ids: Vec<String>,
}

/// Thin reqwest client for the subscriber directory service.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    base_url: String,
    client: reqwest::Client,
}

impl DirectoryClient {
    /// Creates a client for the directory at `base_url` (no trailing slash
    /// required).
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

impl SubscriberStore for DirectoryClient {
    async fn subscribers_of(&self, brand_key: &str) -> Result<Vec<String>, DirectoryError> {
        let key = utf8_percent_encode(brand_key, NON_ALPHANUMERIC);
        let url = format!("{}/api/v1/brands/{key}/subscribers", self.base_url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        let parsed: SubscribersResponse = serde_json::from_str(&body)?;
        Ok(parsed.subscriber_ids)
    }

    async fn write_notification(
        &self,
        notification: &SaleNotification,
    ) -> Result<(), DirectoryError> {
        let url = format!("{}/api/v1/notifications", self.base_url);

        let response = self.client.post(&url).json(notification).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Status {
                status: status.as_u16(),
                url,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn subscribers_of_parses_directory_response() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/brands/veloce/subscribers"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"subscriberIds": ["user-1", "user-2"]}"#,
            ))
            .mount(&server)
            .await;

        let client = DirectoryClient::new(&server.uri());
        let subscribers = client.subscribers_of("veloce").await.unwrap();
        assert_eq!(subscribers, vec!["user-1", "user-2"]);
    }

    #[tokio::test]
    async fn subscribers_of_surfaces_unexpected_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = DirectoryClient::new(&server.uri());
        let err = client.subscribers_of("veloce").await.unwrap_err();
        assert!(matches!(err, DirectoryError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn write_notification_posts_camel_case_payload() {
        let server = MockServer::start().await;

        let notification = SaleNotification {
            subscriber_id: "user-1".to_string(),
            brand_key: "veloce".to_string(),
            brand_name: "Veloce Sportswear".to_string(),
            sale_url: "https://www.velocesportswear.com/".to_string(),
            title: "Veloce Sportswear is having a sale!".to_string(),
            message: "Veloce Sportswear just started a sale — up to 40% off.".to_string(),
        };
        let expected = serde_json::to_string(&notification).unwrap();

        Mock::given(method("POST"))
            .and(path("/api/v1/notifications"))
            .and(body_json_string(expected))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = DirectoryClient::new(&server.uri());
        client.write_notification(&notification).await.unwrap();
    }
}
