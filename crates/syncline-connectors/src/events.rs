//! Source adapter for the event service.
//!
//! The event service exposes which event types currently have active
//! consumers. Each subscribed event becomes one source record keyed
//! `{event_type}.{version}`, with the mapped webhook topic folded in as the
//! payload. Events without a topic mapping are skipped, not fatal.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use syncline_core::{AdapterError, CorrelationKey, Payload, SourceAdapter, SourceRecord};

use crate::http::{DEFAULT_REQUEST_TIMEOUT, build_client, ensure_success, normalize_base_url};
use crate::topics::TopicMap;

/// Configuration for [`EventServiceClient`].
#[derive(Debug, Clone)]
pub struct EventServiceConfig {
    /// Base URL of the event service gateway.
    pub base_url: String,
    /// Application whose subscriptions are listed.
    pub application: String,
    /// HTTP request timeout.
    pub request_timeout: Duration,
}

impl EventServiceConfig {
    /// Creates a configuration with the required fields and default timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>, application: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            application: application.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct SubscribedEventsDto {
    #[serde(rename = "eventsInfo")]
    events_info: Vec<EventInfoDto>,
}

#[derive(Debug, Deserialize)]
struct EventInfoDto {
    name: String,
    version: String,
}

/// REST client listing active event subscriptions.
pub struct EventServiceClient {
    http_client: reqwest::Client,
    config: EventServiceConfig,
    base_url: String,
    topics: Arc<TopicMap>,
}

impl EventServiceClient {
    /// Creates a new event service client.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the base URL is unusable or the
    /// application name is empty.
    pub fn new(config: EventServiceConfig, topics: Arc<TopicMap>) -> Result<Self, AdapterError> {
        let base_url = normalize_base_url(&config.base_url, "event service")?;

        if config.application.is_empty() {
            return Err(AdapterError::invalid_config(
                "event service application name must not be empty",
            ));
        }
        if topics.is_empty() {
            tracing::warn!("topic map is empty, no subscribed event can be synchronized");
        }

        Ok(Self {
            http_client: build_client(config.request_timeout),
            config,
            base_url,
            topics,
        })
    }
}

#[async_trait]
impl SourceAdapter for EventServiceClient {
    async fn list_entities(&self) -> Result<Vec<SourceRecord>, AdapterError> {
        let response = self
            .http_client
            .get(format!(
                "{}/{}/v1/events/subscribed",
                self.base_url, self.config.application
            ))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AdapterError::transport(e.to_string()))?;
        let response = ensure_success(response).await?;

        let subscribed: SubscribedEventsDto = response
            .json()
            .await
            .map_err(|e| AdapterError::decode(e.to_string()))?;

        let mut records = Vec::with_capacity(subscribed.events_info.len());
        for event in subscribed.events_info {
            let event_key = format!("{}.{}", event.name, event.version);
            let Some(topic) = self.topics.topic_for_event(&event_key) else {
                tracing::warn!(event = %event_key, "no topic mapped for subscribed event, skipped");
                continue;
            };
            records.push(SourceRecord::new(event_key.clone(), event_key).with_payload(topic));
        }

        tracing::debug!(subscriptions = records.len(), "active event subscriptions listed");
        Ok(records)
    }

    /// Listings fold the topic in already; this resolves it again from the
    /// map for callers holding a record without its payload.
    async fn fetch_payload(&self, key: &CorrelationKey) -> Result<Payload, AdapterError> {
        match self.topics.topic_for_event(key.as_str()) {
            Some(topic) => Ok(Payload::new(topic)),
            None => Err(AdapterError::invalid_config(format!(
                "no topic mapped for event {key}"
            ))),
        }
    }

    fn system_name(&self) -> &'static str {
        "event-service"
    }
}
