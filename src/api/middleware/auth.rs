//! Bearer token session middleware.
//!
//! Extracts `Authorization: Bearer <token>`, looks the session up and
//! injects a [`Caller`] into request extensions. A missing, unknown or
//! expired token yields an anonymous caller; refusing the request is left
//! to the gate and the handlers.

use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{hash_token, ApiContext, Caller};
use crate::authorization::AuthState;
use crate::identity;

pub(crate) fn bearer_token(req: &Request<axum::body::Body>) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub async fn resolve_session(req: Request<axum::body::Body>, next: Next) -> Response {
    match resolve_session_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn resolve_session_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token_hash = bearer_token(&req).map(hash_token);

    // MutexGuard is !Send, dropped before any .await
    let user_id = match &token_hash {
        Some(hash) => {
            let mut sessions = ctx
                .sessions
                .lock()
                .map_err(|_| ApiError::Internal("session lock".into()))?;
            sessions.resolve(hash)
        }
        None => None,
    };

    let caller = match user_id {
        Some(user_id) => {
            let conn = ctx.core.open_db()?;
            let auth = identity::auth_state_for(&conn, Some(user_id))?;
            let live = matches!(auth, AuthState::SignedIn { .. });
            Caller {
                auth,
                token_hash: if live { token_hash } else { None },
            }
        }
        None => Caller::anonymous(),
    };
    let authenticated = caller.token_hash.is_some();
    req.extensions_mut().insert(caller);

    let mut response = next.run(req).await;
    if authenticated {
        response
            .headers_mut()
            .insert("Cache-Control", HeaderValue::from_static("no-store"));
    }
    Ok(response)
}
