//! Feedback-request notifier
//!
//! POSTs `{email, name, formLink}` as JSON to the configured messaging
//! endpoint. The endpoint authenticates with the API key sent both as an
//! `apikey` header and as a bearer token.

use async_trait::async_trait;
use gatepass_common::config::NotifyConfig;
use std::time::Duration;

use crate::types::{FeedbackRequest, Notifier, NotifyError};

const USER_AGENT: &str = concat!("gatepass-kiosk/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub struct HttpNotifier {
    http_client: reqwest::Client,
    endpoint: Option<String>,
    api_key: Option<String>,
}

impl HttpNotifier {
    pub fn new(
        endpoint: Option<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.filter(|e| !e.trim().is_empty()),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn from_config(config: &NotifyConfig) -> Result<Self, NotifyError> {
        Self::new(
            config.endpoint.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        )
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some() && self.api_key.is_some()
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send_feedback_request(&self, request: &FeedbackRequest) -> Result<(), NotifyError> {
        let (Some(endpoint), Some(api_key)) = (&self.endpoint, &self.api_key) else {
            return Err(NotifyError::NotConfigured);
        };

        tracing::debug!(email = %request.email, "Sending feedback request");

        let response = self
            .http_client
            .post(endpoint.as_str())
            .header("apikey", api_key.as_str())
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(email = %request.email, "Feedback request sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_notifier_fails_softly() {
        let notifier = HttpNotifier::from_config(&NotifyConfig::default()).unwrap();
        assert!(!notifier.is_configured());

        let result = notifier
            .send_feedback_request(&FeedbackRequest {
                email: "guest@example.com".into(),
                name: "Guest".into(),
                form_link: "http://localhost/testimonial?visitId=1".into(),
            })
            .await;
        assert!(matches!(result, Err(NotifyError::NotConfigured)));
    }

    #[test]
    fn test_blank_values_are_unconfigured() {
        let notifier = HttpNotifier::new(
            Some("  ".into()),
            Some("key".into()),
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(!notifier.is_configured());
    }

    #[test]
    fn test_payload_shape() {
        let json = serde_json::to_value(FeedbackRequest {
            email: "a@b.co".into(),
            name: "A".into(),
            form_link: "link".into(),
        })
        .unwrap();
        assert_eq!(json["formLink"], "link");
        assert_eq!(json["email"], "a@b.co");
    }
}
