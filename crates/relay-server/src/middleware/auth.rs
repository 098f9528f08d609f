//! Authentication middleware
//!
//! Resolves the Bearer API key to a [`Principal`] and attaches it to the
//! request as an extension. Ownership checks downstream compare against the
//! principal's id, so every authenticated route sees exactly one identity.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use relay_core::Principal;

use crate::state::AppState;

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // Health stays open for probes
    if request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    let raw_key = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let api_key = state
        .records
        .validate_api_key(raw_key)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    debug!(key = %api_key.name, "Authenticated request");
    request
        .extensions_mut()
        .insert(Principal::new(api_key.id, api_key.name));

    Ok(next.run(request).await)
}
