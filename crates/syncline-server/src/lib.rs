pub mod bootstrap;
pub mod config;
pub mod handlers;
pub mod observability;
pub mod server;

pub use bootstrap::{SyncAssembly, build_adapters};
pub use config::{
    AppConfig, LoggingConfig, RegistrySyncConfig, ServerConfig, SyncConfig, SyncMode,
    WebhookSyncConfig,
};
pub use observability::{apply_logging_level, init_tracing, init_tracing_with_level};
pub use server::{HealthState, SyncServer, build_app};
