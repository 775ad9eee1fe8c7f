//! HTTP API router.
//!
//! Returns a composable `Router` with every route under `/api/`.
//!
//! Public routes (booking, login, portal) pass through the rate limiter and
//! the session resolver only. Back-office routes live under `/api/admin/`
//! and each group is additionally gated on its [`Page`] and audited.

use std::sync::Arc;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post, put};
use axum::{Extension, Router};

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::authorization::Page;
use crate::core_state::CoreState;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

/// Build router from a pre-constructed `ApiContext`, so tests can mint
/// sessions directly.
#[cfg(test)]
pub(crate) fn api_router_with_ctx(ctx: ApiContext) -> Router {
    build_router(ctx)
}

/// Routes for one back-office page, behind that page's gate.
fn page_routes(ctx: &ApiContext, page: Page, routes: Router<ApiContext>) -> Router {
    routes
        .with_state(ctx.clone())
        .layer(from_fn_with_state(page, middleware::gate::require_page))
}

fn build_router(ctx: ApiContext) -> Router {
    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/services", get(endpoints::booking::services))
        .route("/staff", get(endpoints::booking::staff))
        .route("/availability", get(endpoints::booking::availability))
        .route("/booking/dates", get(endpoints::booking::dates))
        .route("/bookings", post(endpoints::booking::create))
        .route("/auth/login", post(endpoints::auth::login))
        .route("/auth/logout", post(endpoints::auth::logout))
        .route("/auth/me", get(endpoints::auth::me))
        .route("/auth/access", get(endpoints::auth::access))
        .route("/portal/register", post(endpoints::portal::register))
        .route("/portal/appointments", get(endpoints::portal::appointments))
        .route(
            "/portal/requests",
            get(endpoints::portal::requests).post(endpoints::portal::file_request),
        )
        .with_state(ctx.clone())
        .layer(from_fn(middleware::auth::resolve_session))
        .layer(from_fn(middleware::rate::limit))
        .layer(Extension(ctx.clone()));

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let dashboard = page_routes(
        &ctx,
        Page::Dashboard,
        Router::new().route("/admin/dashboard", get(endpoints::dashboard::summary)),
    );

    let appointments = page_routes(
        &ctx,
        Page::Appointments,
        Router::new()
            .route(
                "/admin/appointments",
                get(endpoints::appointments::list).post(endpoints::appointments::create),
            )
            .route(
                "/admin/appointments/:id",
                get(endpoints::appointments::detail)
                    .put(endpoints::appointments::update)
                    .delete(endpoints::appointments::delete),
            )
            .route(
                "/admin/appointments/:id/status",
                put(endpoints::appointments::set_status),
            )
            .route(
                "/admin/appointments/:id/actions/:action",
                post(endpoints::appointments::quick_action),
            )
            .route(
                "/admin/change-requests",
                get(endpoints::appointments::change_requests),
            )
            .route(
                "/admin/change-requests/:id/resolve",
                post(endpoints::appointments::resolve_change_request),
            ),
    );

    let patients = page_routes(
        &ctx,
        Page::Patients,
        Router::new()
            .route(
                "/admin/patients",
                get(endpoints::patients::list).post(endpoints::patients::create),
            )
            .route(
                "/admin/patients/:id",
                get(endpoints::patients::detail)
                    .put(endpoints::patients::update)
                    .delete(endpoints::patients::delete),
            ),
    );

    let calendar = page_routes(
        &ctx,
        Page::Calendar,
        Router::new().route("/admin/calendar", get(endpoints::calendar::page)),
    );

    let staff = page_routes(
        &ctx,
        Page::Staff,
        Router::new()
            .route(
                "/admin/staff",
                get(endpoints::staff::list).post(endpoints::staff::create),
            )
            .route(
                "/admin/staff/:id",
                put(endpoints::staff::update).delete(endpoints::staff::delete),
            )
            .route(
                "/admin/users",
                get(endpoints::staff::users).post(endpoints::staff::create_user),
            )
            .route(
                "/admin/roles",
                get(endpoints::staff::roles).post(endpoints::staff::grant),
            )
            .route(
                "/admin/roles/:id",
                axum::routing::delete(endpoints::staff::revoke),
            ),
    );

    let services = page_routes(
        &ctx,
        Page::Services,
        Router::new()
            .route(
                "/admin/services",
                get(endpoints::services::list).post(endpoints::services::create),
            )
            .route(
                "/admin/services/:id",
                put(endpoints::services::update).delete(endpoints::services::delete),
            )
            .route(
                "/admin/services/:id/active",
                put(endpoints::services::set_active),
            ),
    );

    // Layers apply bottom (outermost) to top (innermost):
    //   Extension → Rate limit → Session → Audit → Page gate → Handler
    let admin = Router::new()
        .merge(dashboard)
        .merge(appointments)
        .merge(patients)
        .merge(calendar)
        .merge(staff)
        .merge(services)
        .layer(from_fn(middleware::audit::log_access))
        .layer(from_fn(middleware::auth::resolve_session))
        .layer(from_fn(middleware::rate::limit))
        .layer(Extension(ctx));

    Router::new().nest("/api", public).nest("/api", admin)
}
