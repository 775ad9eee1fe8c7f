//! Audit logging middleware.
//!
//! Records actor, method, path and response status for every back-office
//! request, allowed or refused. Runs inside the session resolver so the
//! caller is known.

use axum::extract::OriginalUri;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::{ApiContext, Caller};

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    // Nesting strips the `/api` prefix from `req.uri()`
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|original| original.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let ctx = req.extensions().get::<ApiContext>().cloned();
    let actor = req
        .extensions()
        .get::<Caller>()
        .map(Caller::actor)
        .unwrap_or_else(|| "anonymous".to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16();
    tracing::info!(%actor, %method, %path, status, "Back-office access");
    if let Some(ctx) = ctx {
        ctx.core
            .log_access(&actor, &format!("{method} {path}"), &format!("status:{status}"));
    }

    response
}
