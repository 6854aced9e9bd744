//! Authentication middleware for Axum.
//!
//! Verifies the bearer token and injects the resolved [`Actor`] into the
//! request extensions for handlers to extract with `Extension<Actor>`.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::token::TokenVerifier;
use crate::gateway::{state::AppState, types::ApiError};

pub async fn actor_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(ApiError::missing_auth)?;

    let token = TokenVerifier::bearer(auth_header)?;
    let actor = state.verifier.verify(token)?;

    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}
