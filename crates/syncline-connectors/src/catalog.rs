//! Source adapter for the connector catalog.
//!
//! The catalog holds the authoritative list of connector instances. Each
//! instance becomes one source record; its OpenAPI document is fetched
//! lazily at apply time and shipped to the registry together with the
//! per-instance API credentials.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use syncline_core::{AdapterError, CorrelationKey, Payload, SourceAdapter, SourceRecord};

use crate::http::{DEFAULT_REQUEST_TIMEOUT, build_client, ensure_success, normalize_base_url};

/// Payload contract between the catalog source and the registry target.
///
/// Serialized into [`Payload`] by the catalog client and decoded again by the
/// registry client when it registers the API definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSpecPayload {
    /// Authorization header value the registry stores as API credentials.
    pub authorization: String,
    /// Raw OpenAPI document for the instance.
    pub spec: String,
}

/// Configuration for [`CatalogClient`].
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL of the catalog API, e.g. `https://api.example.com/catalog/v2`.
    pub base_url: String,
    /// User-level secret for the catalog `Authorization` header.
    pub user_secret: String,
    /// Organization-level secret for the catalog `Authorization` header.
    pub organization_secret: String,
    /// Prefix for the display name of mirrored instances.
    pub name_prefix: String,
    /// Only instances carrying all of these tags are listed. Empty lists all.
    pub tags: Vec<String>,
    /// HTTP request timeout.
    pub request_timeout: Duration,
}

impl CatalogConfig {
    /// Creates a configuration with the required fields and default timeout.
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        user_secret: impl Into<String>,
        organization_secret: impl Into<String>,
        name_prefix: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            user_secret: user_secret.into(),
            organization_secret: organization_secret.into(),
            name_prefix: name_prefix.into(),
            tags: Vec::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Restricts the listing to instances carrying all of the given tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
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
struct InstanceDto {
    id: i64,
    name: String,
    token: String,
    element: ElementDto,
}

#[derive(Debug, Deserialize)]
struct ElementDto {
    name: String,
}

/// REST client listing connector instances from the catalog.
///
/// Keys are the decimal instance ids. The client remembers the API token of
/// every instance it listed, so `fetch_payload` can attach the credentials
/// the registry needs without a second catalog round trip.
pub struct CatalogClient {
    http_client: reqwest::Client,
    config: CatalogConfig,
    base_url: String,
    tokens: Mutex<HashMap<String, String>>,
}

impl CatalogClient {
    /// Creates a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the base URL is empty or unparseable or
    /// when one of the secrets is empty.
    pub fn new(config: CatalogConfig) -> Result<Self, AdapterError> {
        let base_url = normalize_base_url(&config.base_url, "catalog")?;

        if config.user_secret.is_empty() || config.organization_secret.is_empty() {
            return Err(AdapterError::invalid_config(
                "catalog user and organization secrets must not be empty",
            ));
        }

        Ok(Self {
            http_client: build_client(config.request_timeout),
            config,
            base_url,
            tokens: Mutex::new(HashMap::new()),
        })
    }

    /// Header value authenticating this synchronizer against the catalog.
    fn authorization(&self) -> String {
        format!(
            "User {}, Organization {}",
            self.config.user_secret, self.config.organization_secret
        )
    }

    /// Header value the registry stores to call the instance API itself.
    fn api_authorization(&self, token: &str) -> String {
        format!(
            "User {}, Organization {}, Element {}",
            self.config.user_secret, self.config.organization_secret, token
        )
    }

    fn remembered_token(&self, key: &CorrelationKey) -> Option<String> {
        self.tokens
            .lock()
            .expect("catalog token map mutex poisoned")
            .get(key.as_str())
            .cloned()
    }
}

#[async_trait]
impl SourceAdapter for CatalogClient {
    async fn list_entities(&self) -> Result<Vec<SourceRecord>, AdapterError> {
        let mut request = self
            .http_client
            .get(format!("{}/instances", self.base_url))
            .header("Authorization", self.authorization())
            .header("Accept", "application/json");

        if !self.config.tags.is_empty() {
            let pairs: Vec<(&str, &str)> = self
                .config
                .tags
                .iter()
                .map(|tag| ("tags[]", tag.as_str()))
                .collect();
            request = request.query(&pairs);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AdapterError::transport(e.to_string()))?;
        let response = ensure_success(response).await?;

        let instances: Vec<InstanceDto> = response
            .json()
            .await
            .map_err(|e| AdapterError::decode(e.to_string()))?;

        let mut tokens = HashMap::with_capacity(instances.len());
        let records = instances
            .into_iter()
            .map(|instance| {
                let key = instance.id.to_string();
                tokens.insert(key.clone(), instance.token);
                SourceRecord::new(
                    key,
                    format!("{}-{}", self.config.name_prefix, instance.id),
                )
                .with_description(format!("{}: {}", instance.element.name, instance.name))
            })
            .collect::<Vec<_>>();

        *self
            .tokens
            .lock()
            .expect("catalog token map mutex poisoned") = tokens;

        tracing::debug!(instances = records.len(), "catalog instances listed");
        Ok(records)
    }

    async fn fetch_payload(&self, key: &CorrelationKey) -> Result<Payload, AdapterError> {
        // The token was captured by the listing that produced this key.
        let Some(token) = self.remembered_token(key) else {
            return Err(AdapterError::transport(format!(
                "instance {key} missing from the current catalog listing"
            )));
        };

        let response = self
            .http_client
            .get(format!("{}/instances/{}/docs", self.base_url, key))
            .query(&[("version", "-1")])
            .header("Authorization", self.authorization())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AdapterError::transport(e.to_string()))?;
        let response = ensure_success(response).await?;

        let spec = response
            .text()
            .await
            .map_err(|e| AdapterError::decode(e.to_string()))?;

        let payload = ApiSpecPayload {
            authorization: self.api_authorization(&token),
            spec,
        };
        let body = serde_json::to_string(&payload)
            .map_err(|e| AdapterError::decode(e.to_string()))?;

        tracing::debug!(key = %key, "catalog API document fetched");
        Ok(Payload::new(body))
    }

    fn system_name(&self) -> &'static str {
        "catalog"
    }
}
