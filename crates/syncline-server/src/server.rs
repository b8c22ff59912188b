use std::net::SocketAddr;
use std::time::Duration;

use axum::{Router, routing::get};
use time::OffsetDateTime;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use syncline_engine::SyncStatus;

use crate::handlers;

/// Shared state behind the health endpoints.
///
/// Health is derived from the sync loop: the service reports healthy while
/// the last successful cycle is no older than `interval * tolerance_factor`.
#[derive(Debug, Clone)]
pub struct HealthState {
    status: SyncStatus,
    interval: Duration,
    tolerance_factor: u32,
}

impl HealthState {
    pub fn new(status: SyncStatus, interval: Duration, tolerance_factor: u32) -> Self {
        Self {
            status,
            interval,
            tolerance_factor,
        }
    }

    /// Timestamp of the last successful cycle, if any.
    #[must_use]
    pub fn last_success(&self) -> Option<OffsetDateTime> {
        self.status.last_success()
    }

    /// Whether the loop was recently successful as of `now`.
    #[must_use]
    pub fn is_healthy_at(&self, now: OffsetDateTime) -> bool {
        let Some(last) = self.status.last_success() else {
            return false;
        };
        let budget = self.interval.saturating_mul(self.tolerance_factor);
        let budget = time::Duration::try_from(budget).unwrap_or(time::Duration::MAX);
        now - last <= budget
    }
}

pub fn build_app(state: HealthState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct SyncServer {
    addr: SocketAddr,
    app: Router,
}

impl SyncServer {
    pub fn new(addr: SocketAddr, state: HealthState) -> Self {
        Self {
            addr,
            app: build_app(state),
        }
    }

    /// Serves until the shutdown signal fires, then drains gracefully.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", listener.local_addr()?);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.wait_for(|stop| *stop).await;
                tracing::info!("http server shutting down");
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_interval(interval: Duration, tolerance_factor: u32) -> (SyncStatus, HealthState) {
        let status = SyncStatus::new();
        let state = HealthState::new(status.clone(), interval, tolerance_factor);
        (status, state)
    }

    #[test]
    fn test_unhealthy_before_first_success() {
        let (_status, state) = state_with_interval(Duration::from_secs(60), 1);
        assert!(!state.is_healthy_at(OffsetDateTime::now_utc()));
    }

    #[test]
    fn test_healthy_within_tolerance_window() {
        let (status, state) = state_with_interval(Duration::from_secs(60), 1);
        status.mark_success();
        assert!(state.is_healthy_at(OffsetDateTime::now_utc()));
    }

    #[test]
    fn test_stale_success_reports_unhealthy() {
        let (status, state) = state_with_interval(Duration::from_secs(60), 2);
        status.mark_success();

        // Just inside the 120s window
        let last = state.last_success().unwrap();
        assert!(state.is_healthy_at(last + time::Duration::seconds(119)));
        // Past it
        assert!(!state.is_healthy_at(last + time::Duration::seconds(121)));
    }

    #[test]
    fn test_tolerance_factor_widens_window() {
        let (status, strict) = state_with_interval(Duration::from_secs(10), 1);
        let lenient = HealthState::new(status.clone(), Duration::from_secs(10), 6);
        status.mark_success();

        let probe = status.last_success().unwrap() + time::Duration::seconds(30);
        assert!(!strict.is_healthy_at(probe));
        assert!(lenient.is_healthy_at(probe));
    }
}
