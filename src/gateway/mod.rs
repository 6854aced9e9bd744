//! HTTP Gateway
//!
//! Thin axum layer over the services: bearer-token authentication, request
//! validation and the unified `{code, msg, data}` envelope. No business rules
//! live here.

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::actor_auth_middleware;
use handlers::{admin, bookings, health, ranking, wallet};
use state::AppState;

/// Assemble every route over `state`
pub fn build_router(state: Arc<AppState>) -> Router {
    let booking_routes = Router::new()
        .route("/", post(bookings::create_booking))
        .route("/{id}", get(bookings::get_booking))
        .route("/{id}/confirm", post(bookings::confirm_booking))
        .route("/{id}/start", post(bookings::start_booking))
        .route("/{id}/complete", post(bookings::complete_booking))
        .route("/{id}/cancel", post(bookings::cancel_booking))
        .route("/{id}/review", post(bookings::review_booking));

    let wallet_routes = Router::new()
        .route("/", get(wallet::get_wallet))
        .route("/transactions", get(wallet::list_transactions))
        .route(
            "/withdrawals",
            get(wallet::list_withdrawals).post(wallet::request_withdrawal),
        );

    let admin_routes = Router::new()
        .route("/experts/{id}/ranking", post(admin::compute_ranking))
        .route("/wallets/{expert_id}/credit", post(admin::credit_wallet))
        .route("/wallets/{expert_id}/adjust", post(admin::adjust_wallet))
        .route("/withdrawals", get(admin::pending_withdrawals))
        .route("/withdrawals/{id}/approve", post(admin::approve_withdrawal))
        .route("/withdrawals/{id}/reject", post(admin::reject_withdrawal))
        .route("/withdrawals/{id}/paid", post(admin::mark_withdrawal_paid));

    // Everything under these prefixes needs a bearer token
    let private_routes = Router::new()
        .nest("/bookings", booking_routes)
        .nest("/wallet", wallet_routes)
        .nest("/admin", admin_routes)
        .layer(from_fn_with_state(state.clone(), actor_auth_middleware));

    Router::new()
        .route("/api/v1/health", get(health::health_check))
        .route("/api/v1/experts/{id}/ranking", get(ranking::get_ranking))
        .nest("/api/v1", private_routes)
        .with_state(state)
        // Stateless, added after with_state
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Bind `host:port` and serve until the process exits
pub async fn run_server(host: &str, port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

    info!(addr = %addr, "Gateway listening");
    info!(docs = %format!("http://{}/docs", addr), "API docs available");

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::issue_test_token;
    use crate::gateway::handlers::test_support::{TEST_SECRET, TestApp};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn spawn(app: &TestApp) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = build_router(app.state.clone());
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    /// Minimal HTTP/1.1 exchange; returns status code and body
    async fn send(
        addr: std::net::SocketAddr,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: &str,
    ) -> (u16, String) {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let auth = token
            .map(|t| format!("Authorization: Bearer {}\r\n", t))
            .unwrap_or_default();
        let request = format!(
            "{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n{auth}Content-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();
        let status = raw
            .split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap();
        let body = raw
            .split_once("\r\n\r\n")
            .map(|(_, b)| b.to_string())
            .unwrap_or_default();
        (status, body)
    }

    #[tokio::test]
    async fn test_private_routes_require_token() {
        let app = TestApp::new();
        let addr = spawn(&app).await;

        let (status, body) = send(addr, "GET", "/api/v1/wallet", None, "").await;
        assert_eq!(status, 401);
        assert!(body.contains("2001"));

        let (status, body) = send(addr, "GET", "/api/v1/wallet", Some("garbage"), "").await;
        assert_eq!(status, 401);
        assert!(body.contains("2002"));

        let token = issue_test_token(TEST_SECRET, &app.expert, 300);
        let (status, body) = send(addr, "GET", "/api/v1/wallet", Some(&token), "").await;
        assert_eq!(status, 200);
        assert!(body.contains(r#""code":0"#));
    }

    #[tokio::test]
    async fn test_public_routes_and_validation() {
        let app = TestApp::new();
        let addr = spawn(&app).await;

        let (status, _) = send(addr, "GET", "/api/v1/health", None, "").await;
        assert_eq!(status, 200);

        let path = format!("/api/v1/experts/{}/ranking", app.expert.user_id);
        let (status, body) = send(addr, "GET", &path, None, "").await;
        assert_eq!(status, 200);
        assert!(body.contains("bayesian_rating"));

        // JSON numbers are refused for money
        let token = issue_test_token(TEST_SECRET, &app.expert, 300);
        let (status, body) = send(
            addr,
            "POST",
            "/api/v1/wallet/withdrawals",
            Some(&token),
            r#"{"amount": 10}"#,
        )
        .await;
        assert_eq!(status, 400);
        assert!(body.contains("1001"));
    }
}
