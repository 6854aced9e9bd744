//! Health check handler

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::{ApiResponse, error_codes};

/// Health check response data
#[derive(serde::Serialize, ToSchema)]
pub struct HealthResponse {
    /// Server timestamp in milliseconds
    #[schema(example = 1703494800000_i64)]
    pub timestamp_ms: i64,
    /// Crate version
    #[schema(example = "0.1.0")]
    pub version: String,
    /// Short git hash of the running build
    #[schema(example = "3f2a9c1")]
    pub build: String,
}

/// Health check endpoint
///
/// Pings PostgreSQL (at most once per interval) when the service runs on it.
/// Failure details go to the log, never into the response.
///
/// - Healthy: 200 OK + {code: 0, data: {timestamp_ms, version, build}}
/// - Unhealthy: 503 Service Unavailable + {code: 5001, msg: "unavailable"}
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse, content_type = "application/json"),
        (status = 503, description = "Service unavailable")
    ),
    tag = "System"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    // Rate limit: only ping DB once per interval
    static LAST_CHECK_MS: AtomicI64 = AtomicI64::new(0);
    const CHECK_INTERVAL_MS: i64 = 5000;

    let now_ms = Utc::now().timestamp_millis();

    let last_check = LAST_CHECK_MS.load(Ordering::Relaxed);
    let healthy = match state.pg_store {
        Some(ref store) if now_ms - last_check > CHECK_INTERVAL_MS => {
            LAST_CHECK_MS.store(now_ms, Ordering::Relaxed);
            match store.health_check().await {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!(error = %e, "[HEALTH] PostgreSQL ping failed");
                    false
                }
            }
        }
        // Within interval, or running on the in-memory store
        _ => true,
    };

    if healthy {
        (
            StatusCode::OK,
            Json(ApiResponse::success(HealthResponse {
                timestamp_ms: now_ms,
                version: env!("CARGO_PKG_VERSION").to_string(),
                build: env!("GIT_HASH").to_string(),
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse {
                code: error_codes::SERVICE_UNAVAILABLE,
                msg: "unavailable".to_string(),
                data: None,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::handlers::test_support::TestApp;

    #[tokio::test]
    async fn test_health_in_memory_mode() {
        let app = TestApp::new();
        let (status, Json(body)) = health_check(State(app.state.clone())).await;
        assert_eq!(status, StatusCode::OK);
        let data = body.data.unwrap();
        assert_eq!(data.version, env!("CARGO_PKG_VERSION"));
        assert!(!data.build.is_empty());
    }
}
