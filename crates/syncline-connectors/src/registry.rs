//! Target adapter for the application registry.
//!
//! Mirrored catalog instances live in the registry as applications carrying a
//! `catalog_instance` label. The label stores the originating catalog context
//! and instance id, which is how the listing recognizes its own entities and
//! correlates them back to source keys.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use syncline_core::{AdapterError, SourceRecord, TargetAdapter, TargetId, TargetRecord};
use url::Url;

use crate::catalog::ApiSpecPayload;
use crate::http::{DEFAULT_REQUEST_TIMEOUT, build_client, ensure_success, normalize_base_url};

/// Label applications are tagged with so the listing can be scoped.
const INSTANCE_LABEL: &str = "catalog_instance";

/// Configuration for [`RegistryClient`].
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Base URL of the registry API.
    pub base_url: String,
    /// Tenant identifier sent with every request.
    pub tenant: String,
    /// Catalog context this synchronizer owns. Applications labelled with a
    /// different context are ignored entirely.
    pub context: String,
    /// URL registered as the target of every API definition.
    pub api_target_url: String,
    /// HTTP request timeout.
    pub request_timeout: Duration,
}

impl RegistryConfig {
    /// Creates a configuration with the required fields and default timeout.
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        tenant: impl Into<String>,
        context: impl Into<String>,
        api_target_url: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            tenant: tenant.into(),
            context: context.into(),
            api_target_url: api_target_url.into(),
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
struct ApplicationDto {
    id: String,
    #[serde(default)]
    labels: Option<LabelsDto>,
}

#[derive(Debug, Deserialize)]
struct LabelsDto {
    catalog_instance: Option<InstanceLabelDto>,
}

#[derive(Debug, Serialize, Deserialize)]
struct InstanceLabelDto {
    context: String,
    #[serde(rename = "instanceId")]
    instance_id: String,
}

#[derive(Debug, Deserialize)]
struct CreatedDto {
    id: String,
}

/// REST client managing registry applications for mirrored instances.
///
/// Creation is a two-step call: register the application, then attach the
/// API definition from the record payload. The two steps are not atomic.
pub struct RegistryClient {
    http_client: reqwest::Client,
    config: RegistryConfig,
    base_url: String,
}

impl RegistryClient {
    /// Creates a new registry client.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the base URL or API target URL is
    /// unusable, or when tenant or context is empty.
    pub fn new(config: RegistryConfig) -> Result<Self, AdapterError> {
        let base_url = normalize_base_url(&config.base_url, "registry")?;

        if config.tenant.is_empty() {
            return Err(AdapterError::invalid_config(
                "registry tenant must not be empty",
            ));
        }
        if config.context.is_empty() {
            return Err(AdapterError::invalid_config(
                "registry catalog context must not be empty",
            ));
        }
        Url::parse(&config.api_target_url).map_err(|e| {
            AdapterError::invalid_config(format!("registry API target URL is invalid: {e}"))
        })?;

        Ok(Self {
            http_client: build_client(config.request_timeout),
            config,
            base_url,
        })
    }
}

#[async_trait]
impl TargetAdapter for RegistryClient {
    async fn list_entities(&self) -> Result<Vec<TargetRecord>, AdapterError> {
        let response = self
            .http_client
            .get(format!("{}/applications", self.base_url))
            .query(&[("label", INSTANCE_LABEL)])
            .header("tenant", &self.config.tenant)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AdapterError::transport(e.to_string()))?;
        let response = ensure_success(response).await?;

        let applications: Vec<ApplicationDto> = response
            .json()
            .await
            .map_err(|e| AdapterError::decode(e.to_string()))?;

        let mut records = Vec::with_capacity(applications.len());
        for application in applications {
            let Some(label) = application
                .labels
                .and_then(|labels| labels.catalog_instance)
            else {
                tracing::debug!(application = %application.id, "application has no instance label, skipped");
                continue;
            };
            if label.context != self.config.context {
                tracing::debug!(
                    application = %application.id,
                    context = %label.context,
                    "application belongs to another catalog context, skipped"
                );
                continue;
            }
            records.push(TargetRecord::new(label.instance_id, application.id));
        }

        tracing::debug!(applications = records.len(), "registry applications listed");
        Ok(records)
    }

    async fn create_entity(&self, record: &SourceRecord) -> Result<TargetId, AdapterError> {
        let Some(payload) = record.payload.as_ref() else {
            return Err(AdapterError::decode(format!(
                "source record {} carries no payload",
                record.key
            )));
        };
        let api: ApiSpecPayload = serde_json::from_str(payload.as_str())
            .map_err(|e| AdapterError::decode(format!("API payload is not valid JSON: {e}")))?;

        // 1. Register the application itself.
        let body = json!({
            "name": record.display_name,
            "description": record.description.clone().unwrap_or_default(),
            "labels": {
                INSTANCE_LABEL: {
                    "context": self.config.context,
                    "instanceId": record.key,
                }
            }
        });

        let response = self
            .http_client
            .post(format!("{}/applications", self.base_url))
            .header("tenant", &self.config.tenant)
            .json(&body)
            .send()
            .await
            .map_err(|e| AdapterError::transport(e.to_string()))?;
        let response = ensure_success(response).await?;

        let created: CreatedDto = response
            .json()
            .await
            .map_err(|e| AdapterError::decode(e.to_string()))?;
        tracing::debug!(key = %record.key, application = %created.id, "application registered");

        // 2. Attach the API definition. There is no rollback: a failure here
        // leaves the application from step 1 in place, and the next listing
        // reports the instance as mirrored even though its API is missing.
        let api_name = record
            .description
            .clone()
            .unwrap_or_else(|| record.display_name.clone());
        let body = json!({
            "name": api_name,
            "targetUrl": self.config.api_target_url,
            "credentials": {"authorization": api.authorization},
            "spec": api.spec,
        });

        let response = self
            .http_client
            .post(format!("{}/applications/{}/apis", self.base_url, created.id))
            .header("tenant", &self.config.tenant)
            .json(&body)
            .send()
            .await
            .map_err(|e| AdapterError::transport(e.to_string()))?;
        ensure_success(response).await?;
        tracing::debug!(key = %record.key, application = %created.id, "api definition registered");

        Ok(TargetId::new(created.id))
    }

    async fn delete_entity(&self, id: &TargetId) -> Result<(), AdapterError> {
        let response = self
            .http_client
            .delete(format!("{}/applications/{}", self.base_url, id))
            .header("tenant", &self.config.tenant)
            .send()
            .await
            .map_err(|e| AdapterError::transport(e.to_string()))?;
        ensure_success(response).await?;

        tracing::debug!(application = %id, "application deleted");
        Ok(())
    }

    fn system_name(&self) -> &'static str {
        "registry"
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> RegistryClient {
        RegistryClient::new(RegistryConfig::new(
            server.uri(),
            "tenant-1",
            "api.catalog.example.com",
            "https://api.catalog.example.com/v2",
        ))
        .unwrap()
    }

    fn record_with_payload() -> SourceRecord {
        let payload = serde_json::to_string(&ApiSpecPayload {
            authorization: "User u, Organization o, Element tok-1".into(),
            spec: r#"{"openapi":"3.0.0"}"#.into(),
        })
        .unwrap();
        SourceRecord::new("4221", "oc-4221")
            .with_description("Salesforce: my crm")
            .with_payload(payload)
    }

    #[tokio::test]
    async fn test_list_entities_filters_foreign_contexts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/applications"))
            .and(query_param("label", "catalog_instance"))
            .and(header("tenant", "tenant-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "id": "app-1",
                    "name": "oc-4221",
                    "labels": {"catalog_instance": {"context": "api.catalog.example.com", "instanceId": "4221"}}
                },
                {
                    "id": "app-2",
                    "name": "oc-9",
                    "labels": {"catalog_instance": {"context": "other.catalog", "instanceId": "9"}}
                },
                {
                    "id": "app-3",
                    "name": "unrelated"
                }
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let records = client.list_entities().await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key.as_str(), "4221");
        assert_eq!(records[0].target_id.as_str(), "app-1");
    }

    #[tokio::test]
    async fn test_create_entity_registers_application_then_api() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/applications"))
            .and(header("tenant", "tenant-1"))
            .and(body_partial_json(serde_json::json!({
                "name": "oc-4221",
                "labels": {"catalog_instance": {"context": "api.catalog.example.com", "instanceId": "4221"}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "app-1"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/applications/app-1/apis"))
            .and(body_partial_json(serde_json::json!({
                "name": "Salesforce: my crm",
                "targetUrl": "https://api.catalog.example.com/v2",
                "credentials": {"authorization": "User u, Organization o, Element tok-1"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "api-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let id = client.create_entity(&record_with_payload()).await.unwrap();

        assert_eq!(id.as_str(), "app-1");
    }

    #[tokio::test]
    async fn test_failed_api_step_leaves_application_behind() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/applications"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "app-1"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/applications/app-1/apis"))
            .respond_with(ResponseTemplate::new(500).set_body_string("api store unavailable"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.create_entity(&record_with_payload()).await.unwrap_err();

        assert_eq!(err.status_code(), Some(500));
        // Exactly the two POSTs; no compensating delete is issued.
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
    }

    #[tokio::test]
    async fn test_create_entity_requires_payload() {
        let server = MockServer::start().await;
        let client = client_for(&server);
        let record = SourceRecord::new("4221", "oc-4221");

        let err = client.create_entity(&record).await.unwrap_err();
        assert!(err.to_string().contains("carries no payload"));
    }

    #[tokio::test]
    async fn test_create_entity_rejects_malformed_payload() {
        let server = MockServer::start().await;
        let client = client_for(&server);
        let record = SourceRecord::new("4221", "oc-4221").with_payload("not a json envelope");

        let err = client.create_entity(&record).await.unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[tokio::test]
    async fn test_delete_entity() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/applications/app-1"))
            .and(header("tenant", "tenant-1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.delete_entity(&TargetId::from("app-1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_entity_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/applications/app-9"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such application"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.delete_entity(&TargetId::from("app-9")).await.unwrap_err();

        assert_eq!(err.status_code(), Some(404));
    }

    #[test]
    fn test_rejects_empty_tenant() {
        let err = RegistryClient::new(RegistryConfig::new(
            "https://registry.example.com",
            "",
            "ctx",
            "https://api.example.com",
        ))
        .err()
        .expect("expected error");
        assert!(err.to_string().contains("tenant must not be empty"));
    }

    #[test]
    fn test_rejects_invalid_api_target_url() {
        let err = RegistryClient::new(RegistryConfig::new(
            "https://registry.example.com",
            "tenant-1",
            "ctx",
            "not a url",
        ))
        .err()
        .expect("expected error");
        assert!(err.to_string().contains("API target URL is invalid"));
    }
}
