use std::{env, sync::Arc};

use syncline_engine::{Reconciler, Scheduler, SyncStatus};
use syncline_server::config::loader::load_config;
use syncline_server::{HealthState, SyncServer, build_adapters};

/// How the configuration path was determined.
#[derive(Debug, Clone, Copy)]
enum ConfigSource {
    /// From --config CLI argument
    CliArgument,
    /// From SYNCLINE_CONFIG environment variable
    EnvironmentVariable,
    /// Default path (syncline.toml)
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CliArgument => write!(f, "CLI argument (--config)"),
            Self::EnvironmentVariable => write!(f, "environment variable (SYNCLINE_CONFIG)"),
            Self::Default => write!(f, "default"),
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before anything else)
    // This allows environment variables to be set from .env for local development
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist - it's optional
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    // Initialize tracing early with the default level
    syncline_server::observability::init_tracing();

    // Parse config path from CLI, environment, or use default
    let (config_path, source) = resolve_config_path();

    let cfg = match load_config(Some(&config_path)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    tracing::info!(
        path = %config_path,
        source = %source,
        "Configuration loaded"
    );

    syncline_server::observability::apply_logging_level(&cfg.logging.level);
    cfg.log_startup();

    let assembly = match build_adapters(&cfg) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Adapter initialization failed: {e}");
            std::process::exit(2);
        }
    };

    let reconciler = Arc::new(
        Reconciler::new(assembly.source, assembly.target)
            .with_max_in_flight(cfg.sync.max_in_flight),
    );

    // Seed the target state cache; without a baseline listing every cycle
    // would plan against an empty mirror.
    match reconciler.refresh_target_state().await {
        Ok(entries) => tracing::info!(entries, "target state cache seeded"),
        Err(e) => {
            eprintln!("Initial target listing failed: {e}");
            std::process::exit(2);
        }
    }

    let status = SyncStatus::new();
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let scheduler = Scheduler::new(reconciler, status.clone(), cfg.sync.interval())
        .with_cache_refresh_cycles(cfg.sync.cache_refresh_cycles);
    let loop_handle = tokio::spawn(scheduler.run(shutdown_rx.clone()));

    // Ctrl+C flips the shutdown flag for both the loop and the server
    {
        let shutdown_tx = shutdown_tx.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        });
    }

    let health = HealthState::new(status, cfg.sync.interval(), cfg.sync.tolerance_factor);
    let server = SyncServer::new(cfg.addr(), health);
    if let Err(err) = server.run(shutdown_rx).await {
        eprintln!("Server error: {err}");
    }

    // Server is down; stop the loop too and let an in-flight cycle drain
    let _ = shutdown_tx.send(true);
    let _ = loop_handle.await;
}

/// Resolve the configuration file path.
///
/// Priority order:
/// 1. CLI argument: --config <path>
/// 2. Environment variable: SYNCLINE_CONFIG
/// 3. Default: syncline.toml
fn resolve_config_path() -> (String, ConfigSource) {
    // 1. Check CLI: --config <path>
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                return (path, ConfigSource::CliArgument);
            }
        }
    }

    // 2. Check environment variable
    if let Ok(path) = env::var("SYNCLINE_CONFIG") {
        if !path.is_empty() {
            return (path, ConfigSource::EnvironmentVariable);
        }
    }

    // 3. Default to syncline.toml
    ("syncline.toml".to_string(), ConfigSource::Default)
}
