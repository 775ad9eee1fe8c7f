//! Back-office page gate.
//!
//! Every admin route belongs to a [`Page`]; the page's role requirement is
//! checked against the resolved [`Caller`] before the handler runs.

use axum::extract::{OriginalUri, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::Caller;
use crate::authorization::{gate, Page};

/// The back-office path the caller asked for, as the UI knows it: the
/// `/api` prefix dropped and the query kept.
fn requested_path(req: &Request<axum::body::Body>) -> String {
    let uri = req
        .extensions()
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or(req.uri());
    let path = uri.path().strip_prefix("/api").unwrap_or(uri.path());
    match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    }
}

pub async fn require_page(
    State(page): State<Page>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let caller = req
        .extensions()
        .get::<Caller>()
        .cloned()
        .unwrap_or_else(Caller::anonymous);

    let requested = requested_path(&req);
    let outcome = gate(&caller.auth, page.required_roles(), &requested);
    match ApiError::from_gate(outcome) {
        None => next.run(req).await,
        Some(err) => {
            tracing::warn!(
                page = ?page,
                actor = %caller.actor(),
                path = %requested,
                reason = %err,
                "Gate refused request"
            );
            err.into_response()
        }
    }
}
