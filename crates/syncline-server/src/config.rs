use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    /// Catalog→registry pair settings, required for `sync.mode = "registry"`.
    #[serde(default)]
    pub registry: Option<RegistrySyncConfig>,
    /// Events→webhooks pair settings, required for `sync.mode = "webhooks"`.
    #[serde(default)]
    pub webhooks: Option<WebhookSyncConfig>,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if self.sync.interval_secs == 0 {
            return Err("sync.interval_secs must be > 0".into());
        }
        if self.sync.max_in_flight == 0 {
            return Err("sync.max_in_flight must be > 0".into());
        }
        if self.sync.tolerance_factor == 0 {
            return Err("sync.tolerance_factor must be > 0".into());
        }
        match self.sync.mode {
            SyncMode::Registry => match &self.registry {
                Some(registry) => registry.validate()?,
                None => {
                    return Err(
                        "[registry] section is required for sync.mode = \"registry\"".into()
                    );
                }
            },
            SyncMode::Webhooks => match &self.webhooks {
                Some(webhooks) => webhooks.validate()?,
                None => {
                    return Err(
                        "[webhooks] section is required for sync.mode = \"webhooks\"".into()
                    );
                }
            },
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    /// Logs the effective configuration at startup with secrets masked.
    pub fn log_startup(&self) {
        tracing::info!(
            mode = %self.sync.mode,
            interval_secs = self.sync.interval_secs,
            cache_refresh_cycles = self.sync.cache_refresh_cycles,
            max_in_flight = self.sync.max_in_flight,
            tolerance_factor = self.sync.tolerance_factor,
            "sync configuration"
        );
        if let Some(registry) = &self.registry {
            tracing::info!(
                catalog_base_url = %registry.catalog_base_url,
                catalog_user_secret = mask(&registry.catalog_user_secret),
                catalog_organization_secret = mask(&registry.catalog_organization_secret),
                catalog_tags = ?registry.catalog_tags,
                name_prefix = %registry.name_prefix,
                registry_base_url = %registry.registry_base_url,
                registry_tenant = %registry.registry_tenant,
                context = %registry.effective_context(),
                "registry pair configuration"
            );
        }
        if let Some(webhooks) = &self.webhooks {
            tracing::info!(
                event_service_base_url = %webhooks.event_service_base_url,
                application = %webhooks.application,
                webhook_base_url = %webhooks.webhook_base_url,
                api_key = mask(&webhooks.api_key),
                subscription_url = %webhooks.subscription_url,
                shared_key = mask(&webhooks.shared_key),
                topics_file = %webhooks.topics_file,
                "webhook pair configuration"
            );
        }
    }
}

fn mask(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "***" }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Which source/target pair the loop drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Mirror catalog instances into the application registry.
    #[default]
    Registry,
    /// Mirror event subscriptions into vendor webhook subscriptions.
    Webhooks,
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registry => write!(f, "registry"),
            Self::Webhooks => write!(f, "webhooks"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub mode: SyncMode,
    /// Seconds between reconciliation cycles.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Wholesale target cache refresh every N successful cycles. 0 refreshes
    /// at startup only.
    #[serde(default)]
    pub cache_refresh_cycles: u32,
    /// Concurrent apply operations per cycle.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Health tolerance: stale after `interval_secs * tolerance_factor`
    /// seconds without a successful cycle.
    #[serde(default = "default_tolerance_factor")]
    pub tolerance_factor: u32,
}

fn default_interval_secs() -> u64 {
    60
}
fn default_max_in_flight() -> usize {
    4
}
fn default_tolerance_factor() -> u32 {
    1
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mode: SyncMode::default(),
            interval_secs: default_interval_secs(),
            cache_refresh_cycles: 0,
            max_in_flight: default_max_in_flight(),
            tolerance_factor: default_tolerance_factor(),
        }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Settings for the catalog→registry pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySyncConfig {
    /// Base URL of the connector catalog API.
    #[serde(default)]
    pub catalog_base_url: String,
    #[serde(default)]
    pub catalog_user_secret: String,
    #[serde(default)]
    pub catalog_organization_secret: String,
    /// Only instances carrying all of these tags are synchronized.
    #[serde(default)]
    pub catalog_tags: Vec<String>,
    /// Prefix for registered application names.
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
    /// Base URL of the application registry API.
    #[serde(default)]
    pub registry_base_url: String,
    /// Tenant identifier sent with every registry request.
    #[serde(default)]
    pub registry_tenant: String,
    /// Catalog context owning the mirrored applications. Empty derives the
    /// context from the catalog base URL host.
    #[serde(default)]
    pub context: String,
    /// URL registered as the target of API definitions. Empty falls back to
    /// the catalog base URL.
    #[serde(default)]
    pub api_target_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_name_prefix() -> String {
    "instance".into()
}
fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for RegistrySyncConfig {
    fn default() -> Self {
        Self {
            catalog_base_url: String::new(),
            catalog_user_secret: String::new(),
            catalog_organization_secret: String::new(),
            catalog_tags: Vec::new(),
            name_prefix: default_name_prefix(),
            registry_base_url: String::new(),
            registry_tenant: String::new(),
            context: String::new(),
            api_target_url: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl RegistrySyncConfig {
    fn validate(&self) -> Result<(), String> {
        if self.catalog_base_url.is_empty() {
            return Err("registry.catalog_base_url must not be empty".into());
        }
        if self.catalog_user_secret.is_empty() || self.catalog_organization_secret.is_empty() {
            return Err(
                "registry.catalog_user_secret and registry.catalog_organization_secret must not be empty"
                    .into(),
            );
        }
        if self.registry_base_url.is_empty() {
            return Err("registry.registry_base_url must not be empty".into());
        }
        if self.registry_tenant.is_empty() {
            return Err("registry.registry_tenant must not be empty".into());
        }
        if self.request_timeout_secs == 0 {
            return Err("registry.request_timeout_secs must be > 0".into());
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Context scoping the registry listing, derived from the catalog host
    /// when not set explicitly.
    pub fn effective_context(&self) -> String {
        if !self.context.is_empty() {
            return self.context.clone();
        }
        url::Url::parse(&self.catalog_base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default()
    }

    pub fn effective_api_target_url(&self) -> String {
        if !self.api_target_url.is_empty() {
            return self.api_target_url.clone();
        }
        self.catalog_base_url.clone()
    }
}

/// Settings for the events→webhooks pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSyncConfig {
    /// Base URL of the event service gateway.
    #[serde(default)]
    pub event_service_base_url: String,
    /// Application whose subscriptions drive the loop.
    #[serde(default)]
    pub application: String,
    /// Base URL of the vendor webhook API.
    #[serde(default)]
    pub webhook_base_url: String,
    #[serde(default)]
    pub api_key: String,
    /// URL the vendor publishes events to.
    #[serde(default)]
    pub subscription_url: String,
    /// Shared key new subscriptions are signed with. Empty disables signing.
    #[serde(default)]
    pub shared_key: String,
    /// Path of the JSON topic map config file.
    #[serde(default)]
    pub topics_file: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for WebhookSyncConfig {
    fn default() -> Self {
        Self {
            event_service_base_url: String::new(),
            application: String::new(),
            webhook_base_url: String::new(),
            api_key: String::new(),
            subscription_url: String::new(),
            shared_key: String::new(),
            topics_file: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl WebhookSyncConfig {
    fn validate(&self) -> Result<(), String> {
        if self.event_service_base_url.is_empty() {
            return Err("webhooks.event_service_base_url must not be empty".into());
        }
        if self.application.is_empty() {
            return Err("webhooks.application must not be empty".into());
        }
        if self.webhook_base_url.is_empty() {
            return Err("webhooks.webhook_base_url must not be empty".into());
        }
        if self.api_key.is_empty() {
            return Err("webhooks.api_key must not be empty".into());
        }
        if self.subscription_url.is_empty() {
            return Err("webhooks.subscription_url must not be empty".into());
        }
        if self.topics_file.is_empty() {
            return Err("webhooks.topics_file must not be empty".into());
        }
        if self.request_timeout_secs == 0 {
            return Err("webhooks.request_timeout_secs must be > 0".into());
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                // Try default root-level file
                let default_path = PathBuf::from("syncline.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., SYNCLINE__SYNC__INTERVAL_SECS=30
        builder = builder.add_source(
            Environment::with_prefix("SYNCLINE")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_registry_config() -> AppConfig {
        AppConfig {
            registry: Some(RegistrySyncConfig {
                catalog_base_url: "https://api.catalog.example.com/v2".into(),
                catalog_user_secret: "u".into(),
                catalog_organization_secret: "o".into(),
                registry_base_url: "https://registry.example.com".into(),
                registry_tenant: "tenant-1".into(),
                ..RegistrySyncConfig::default()
            }),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_registry_mode_requires_section() {
        let cfg = AppConfig::default();
        let err = cfg.validate().unwrap_err();
        assert!(err.contains("[registry] section is required"));

        assert!(valid_registry_config().validate().is_ok());
    }

    #[test]
    fn test_webhooks_mode_requires_section() {
        let mut cfg = AppConfig::default();
        cfg.sync.mode = SyncMode::Webhooks;
        let err = cfg.validate().unwrap_err();
        assert!(err.contains("[webhooks] section is required"));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let mut cfg = valid_registry_config();
        cfg.sync.interval_secs = 0;
        assert!(cfg.validate().unwrap_err().contains("interval_secs"));
    }

    #[test]
    fn test_rejects_zero_tolerance() {
        let mut cfg = valid_registry_config();
        cfg.sync.tolerance_factor = 0;
        assert!(cfg.validate().unwrap_err().contains("tolerance_factor"));
    }

    #[test]
    fn test_rejects_missing_secrets() {
        let mut cfg = valid_registry_config();
        cfg.registry.as_mut().unwrap().catalog_user_secret.clear();
        assert!(cfg.validate().unwrap_err().contains("catalog_user_secret"));
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let mut cfg = valid_registry_config();
        cfg.logging.level = "verbose".into();
        assert!(cfg.validate().unwrap_err().contains("logging.level"));
    }

    #[test]
    fn test_context_derived_from_catalog_host() {
        let cfg = valid_registry_config();
        let registry = cfg.registry.as_ref().unwrap();
        assert_eq!(registry.effective_context(), "api.catalog.example.com");

        let mut explicit = registry.clone();
        explicit.context = "my-context".into();
        assert_eq!(explicit.effective_context(), "my-context");
    }

    #[test]
    fn test_api_target_falls_back_to_catalog() {
        let cfg = valid_registry_config();
        let registry = cfg.registry.as_ref().unwrap();
        assert_eq!(
            registry.effective_api_target_url(),
            "https://api.catalog.example.com/v2"
        );
    }

    #[test]
    fn test_sync_mode_display_matches_config_values() {
        assert_eq!(SyncMode::Registry.to_string(), "registry");
        assert_eq!(SyncMode::Webhooks.to_string(), "webhooks");
    }

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.sync.interval_secs, 60);
        assert_eq!(cfg.sync.cache_refresh_cycles, 0);
        assert_eq!(cfg.sync.max_in_flight, 4);
        assert_eq!(cfg.sync.tolerance_factor, 1);
        assert_eq!(cfg.logging.level, "info");
    }
}
