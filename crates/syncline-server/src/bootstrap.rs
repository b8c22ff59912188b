//! Builds the source/target adapter pair selected by the sync configuration.

use std::sync::Arc;

use syncline_connectors::{
    CatalogClient, CatalogConfig, EventServiceClient, EventServiceConfig, RegistryClient,
    RegistryConfig, TopicMap, WebhookClient, WebhookConfig,
};
use syncline_core::{DynSourceAdapter, DynTargetAdapter, SyncError};

use crate::config::{AppConfig, RegistrySyncConfig, SyncMode, WebhookSyncConfig};

/// The wired adapter pair for one sync mode.
pub struct SyncAssembly {
    pub source: DynSourceAdapter,
    pub target: DynTargetAdapter,
}

/// Builds the adapters for the configured mode.
///
/// # Errors
///
/// Returns [`SyncError::Configuration`] when the selected mode's section is
/// missing or one of its clients rejects its settings.
pub fn build_adapters(cfg: &AppConfig) -> Result<SyncAssembly, SyncError> {
    match cfg.sync.mode {
        SyncMode::Registry => {
            let registry = cfg.registry.as_ref().ok_or_else(|| {
                SyncError::configuration("[registry] section is required for registry mode")
            })?;
            build_registry_pair(registry)
        }
        SyncMode::Webhooks => {
            let webhooks = cfg.webhooks.as_ref().ok_or_else(|| {
                SyncError::configuration("[webhooks] section is required for webhooks mode")
            })?;
            build_webhook_pair(webhooks)
        }
    }
}

fn build_registry_pair(cfg: &RegistrySyncConfig) -> Result<SyncAssembly, SyncError> {
    let catalog = CatalogClient::new(
        CatalogConfig::new(
            &cfg.catalog_base_url,
            &cfg.catalog_user_secret,
            &cfg.catalog_organization_secret,
            &cfg.name_prefix,
        )
        .with_tags(cfg.catalog_tags.clone())
        .with_request_timeout(cfg.request_timeout()),
    )
    .map_err(|e| SyncError::configuration(format!("catalog client: {e}")))?;

    let registry = RegistryClient::new(
        RegistryConfig::new(
            &cfg.registry_base_url,
            &cfg.registry_tenant,
            cfg.effective_context(),
            cfg.effective_api_target_url(),
        )
        .with_request_timeout(cfg.request_timeout()),
    )
    .map_err(|e| SyncError::configuration(format!("registry client: {e}")))?;

    Ok(SyncAssembly {
        source: Arc::new(catalog),
        target: Arc::new(registry),
    })
}

fn build_webhook_pair(cfg: &WebhookSyncConfig) -> Result<SyncAssembly, SyncError> {
    let topics = Arc::new(
        TopicMap::from_file(&cfg.topics_file)
            .map_err(|e| SyncError::configuration(format!("topic map: {e}")))?,
    );

    let events = EventServiceClient::new(
        EventServiceConfig::new(&cfg.event_service_base_url, &cfg.application)
            .with_request_timeout(cfg.request_timeout()),
        topics.clone(),
    )
    .map_err(|e| SyncError::configuration(format!("event service client: {e}")))?;

    let webhooks = WebhookClient::new(
        WebhookConfig::new(&cfg.webhook_base_url, &cfg.api_key, &cfg.subscription_url)
            .with_shared_key(&cfg.shared_key)
            .with_request_timeout(cfg.request_timeout()),
        topics,
    )
    .map_err(|e| SyncError::configuration(format!("webhook client: {e}")))?;

    Ok(SyncAssembly {
        source: Arc::new(events),
        target: Arc::new(webhooks),
    })
}
