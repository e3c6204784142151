//! HTTP-backed research collaborator.
//!
//! Fetches an aggregated research document from a configured endpoint.
//! Expected response shape:
//!
//! ```json
//! {
//!   "bundle": { "content": "...", "citations": [], "timestamp": "..." },
//!   "market": { "price_change_percent": -1.2, "volume": null, "hours_since_event": 0.5 }
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::core::{ErrorKind, Stage, StageError};

use super::{ResearchPayload, ResearchProvider};

pub struct HttpResearchProvider {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpResearchProvider {
    pub fn new(endpoint: impl Into<String>, deadline: Duration) -> Result<Self, StageError> {
        let client = reqwest::Client::builder()
            .timeout(deadline)
            .build()
            .map_err(|e| {
                StageError::new(
                    Stage::Research,
                    ErrorKind::Config,
                    format!("failed to build HTTP client: {e}"),
                )
            })?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    fn classify_status(status: StatusCode) -> ErrorKind {
        if status == StatusCode::TOO_MANY_REQUESTS {
            ErrorKind::RateLimited
        } else if status.is_server_error() {
            ErrorKind::Upstream
        } else {
            // 4xx means the endpoint is misconfigured on our side
            ErrorKind::Config
        }
    }
}

#[async_trait]
impl ResearchProvider for HttpResearchProvider {
    fn name(&self) -> &str {
        "http-research"
    }

    async fn fetch(&self) -> Result<ResearchPayload, StageError> {
        let stage = Stage::Research;

        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() {
                    ErrorKind::Timeout
                } else {
                    ErrorKind::Network
                };
                StageError::new(stage, kind, format!("research fetch failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StageError::new(
                stage,
                Self::classify_status(status),
                format!("research endpoint returned {status}"),
            ));
        }

        response.json::<ResearchPayload>().await.map_err(|e| {
            StageError::invalid_output(stage, format!("unparseable research payload: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(
            HttpResearchProvider::classify_status(StatusCode::TOO_MANY_REQUESTS),
            ErrorKind::RateLimited
        );
        assert_eq!(
            HttpResearchProvider::classify_status(StatusCode::BAD_GATEWAY),
            ErrorKind::Upstream
        );
        assert_eq!(
            HttpResearchProvider::classify_status(StatusCode::NOT_FOUND),
            ErrorKind::Config
        );
    }

    #[test]
    fn test_payload_shape_parses() {
        let payload: ResearchPayload = serde_json::from_str(
            r#"{
                "bundle": {
                    "content": "Breaking: markets moved.",
                    "citations": ["https://example.com"],
                    "timestamp": "2026-08-07T09:00:00Z"
                },
                "market": {
                    "price_change_percent": -2.5,
                    "hours_since_event": 1.0
                }
            }"#,
        )
        .unwrap();

        assert_eq!(payload.market.price_change_percent, -2.5);
        assert_eq!(payload.bundle.citations.len(), 1);
    }
}
