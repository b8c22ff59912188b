use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::server::HealthState;

pub async fn root() -> impl IntoResponse {
    let body = json!({
        "service": "Syncline",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

/// Loop-derived health: 200 while the last successful cycle is within the
/// tolerance window, 500 otherwise. The body always carries the timestamp,
/// `null` before the first success.
pub async fn healthz(State(state): State<HealthState>) -> impl IntoResponse {
    let last = state.last_success();
    let code = if state.is_healthy_at(OffsetDateTime::now_utc()) {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    let body = json!({
        "lastSuccessfulSynch": last.and_then(|t| t.format(&Rfc3339).ok()),
    });
    (code, Json(body))
}
