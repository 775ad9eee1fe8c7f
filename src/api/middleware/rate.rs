//! Per-client rate limiting middleware.
//!
//! Applies sliding-window rate limits per client:
//! - 100 requests per minute
//! - 1000 requests per hour
//!
//! A caller holding a live session is counted against its user. Everyone
//! else is counted against the peer IP address, so a forged or expired token
//! buys no extra budget.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::middleware::auth::bearer_token;
use crate::api::types::{hash_token, ApiContext};

/// Extract a rate-limit key from the request.
fn rate_key(ctx: &ApiContext, req: &Request<axum::body::Body>) -> Result<String, ApiError> {
    if let Some(hash) = bearer_token(req).map(hash_token) {
        let user_id = ctx
            .sessions
            .lock()
            .map_err(|_| ApiError::Internal("session lock".into()))?
            .resolve(&hash);
        if let Some(user_id) = user_id {
            return Ok(format!("user:{user_id}"));
        }
    }

    Ok(match req.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(peer)) => format!("peer:{}", peer.ip()),
        None => "peer:unknown".to_string(),
    })
}

/// Returns 429 if exceeded.
pub async fn limit(req: Request<axum::body::Body>, next: Next) -> Response {
    match limit_inner(req, next).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn limit_inner(req: Request<axum::body::Body>, next: Next) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let key = rate_key(&ctx, &req)?;

    // MutexGuard is !Send, must drop before .await via block scope
    {
        let mut limiter = ctx
            .rate_limiter
            .lock()
            .map_err(|_| ApiError::Internal("rate limiter lock".into()))?;

        limiter.check(&key).map_err(|retry_after| {
            tracing::warn!(%key, retry_after, "Rate limit exceeded");
            ApiError::RateLimited { retry_after }
        })?;
    }

    Ok(next.run(req).await)
}
