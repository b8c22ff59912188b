//! Target adapter for the vendor webhook API.
//!
//! Every mirrored event subscription exists at the vendor as a webhook
//! subscription pointing at the configured publication URL. The listing is
//! scoped by that URL: subscriptions publishing anywhere else belong to
//! someone else and are never touched or reported.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use syncline_core::{AdapterError, SourceRecord, TargetAdapter, TargetId, TargetRecord};
use url::Url;

use crate::http::{DEFAULT_REQUEST_TIMEOUT, build_client, ensure_success, normalize_base_url};
use crate::topics::TopicMap;

const SUBSCRIPTIONS_PATH: &str = "/API/v3/eventsubscriptions/";
const API_KEY_HEADER: &str = "X-API-TOKEN";

/// Configuration for [`WebhookClient`].
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Base URL of the vendor API.
    pub base_url: String,
    /// API token sent as `X-API-TOKEN` with every request.
    pub api_key: String,
    /// URL the vendor publishes events to. Doubles as the ownership filter
    /// for the listing.
    pub subscription_url: String,
    /// Shared key the vendor signs deliveries with. Empty omits it.
    pub shared_key: String,
    /// HTTP request timeout.
    pub request_timeout: Duration,
}

impl WebhookConfig {
    /// Creates a configuration with the required fields and default timeout.
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        subscription_url: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            subscription_url: subscription_url.into(),
            shared_key: String::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Sets the shared key new subscriptions are created with.
    #[must_use]
    pub fn with_shared_key(mut self, shared_key: impl Into<String>) -> Self {
        self.shared_key = shared_key.into();
        self
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct SubscriptionListDto {
    result: SubscriptionElementsDto,
}

#[derive(Debug, Deserialize)]
struct SubscriptionElementsDto {
    elements: Vec<SubscriptionDto>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionDto {
    id: String,
    topics: String,
    #[serde(rename = "publicationUrl")]
    publication_url: String,
}

#[derive(Debug, Deserialize)]
struct SubscriptionCreatedDto {
    result: SubscriptionIdDto,
}

#[derive(Debug, Deserialize)]
struct SubscriptionIdDto {
    id: String,
}

/// REST client managing vendor webhook subscriptions.
pub struct WebhookClient {
    http_client: reqwest::Client,
    config: WebhookConfig,
    base_url: String,
    topics: Arc<TopicMap>,
}

impl WebhookClient {
    /// Creates a new webhook client.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the base URL or subscription URL is
    /// unusable or the API key is empty.
    pub fn new(config: WebhookConfig, topics: Arc<TopicMap>) -> Result<Self, AdapterError> {
        let base_url = normalize_base_url(&config.base_url, "webhook API")?;

        if config.api_key.is_empty() {
            return Err(AdapterError::invalid_config(
                "webhook API key must not be empty",
            ));
        }
        Url::parse(&config.subscription_url).map_err(|e| {
            AdapterError::invalid_config(format!("webhook subscription URL is invalid: {e}"))
        })?;

        Ok(Self {
            http_client: build_client(config.request_timeout),
            config,
            base_url,
            topics,
        })
    }
}

#[async_trait]
impl TargetAdapter for WebhookClient {
    async fn list_entities(&self) -> Result<Vec<TargetRecord>, AdapterError> {
        let response = self
            .http_client
            .get(format!("{}{}", self.base_url, SUBSCRIPTIONS_PATH))
            .header(API_KEY_HEADER, &self.config.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AdapterError::transport(e.to_string()))?;
        let response = ensure_success(response).await?;

        let listing: SubscriptionListDto = response
            .json()
            .await
            .map_err(|e| AdapterError::decode(e.to_string()))?;

        let mut records = Vec::new();
        for subscription in listing.result.elements {
            if subscription.publication_url != self.config.subscription_url {
                continue;
            }
            let Some(event_key) = self.topics.event_for_topic(&subscription.topics) else {
                tracing::warn!(
                    subscription = %subscription.id,
                    topic = %subscription.topics,
                    "subscription topic has no event mapping, skipped"
                );
                continue;
            };
            records.push(TargetRecord::new(event_key, subscription.id));
        }

        tracing::debug!(subscriptions = records.len(), "webhook subscriptions listed");
        Ok(records)
    }

    async fn create_entity(&self, record: &SourceRecord) -> Result<TargetId, AdapterError> {
        let Some(topic) = record.payload.as_ref() else {
            return Err(AdapterError::decode(format!(
                "source record {} carries no topic payload",
                record.key
            )));
        };

        let mut body = json!({
            "topics": topic.as_str(),
            "publicationUrl": self.config.subscription_url,
        });
        if !self.config.shared_key.is_empty() {
            body["sharedKey"] = json!(self.config.shared_key);
        }

        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, SUBSCRIPTIONS_PATH))
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AdapterError::transport(e.to_string()))?;
        let response = ensure_success(response).await?;

        let created: SubscriptionCreatedDto = response
            .json()
            .await
            .map_err(|e| AdapterError::decode(e.to_string()))?;

        tracing::debug!(
            key = %record.key,
            subscription = %created.result.id,
            "webhook subscription created"
        );
        Ok(TargetId::new(created.result.id))
    }

    async fn delete_entity(&self, id: &TargetId) -> Result<(), AdapterError> {
        let response = self
            .http_client
            .delete(format!("{}{}{}", self.base_url, SUBSCRIPTIONS_PATH, id))
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(|e| AdapterError::transport(e.to_string()))?;
        ensure_success(response).await?;

        tracing::debug!(subscription = %id, "webhook subscription deleted");
        Ok(())
    }

    fn system_name(&self) -> &'static str {
        "webhook-api"
    }
}
