//! Login, logout and session introspection.
//!
//! `POST /api/auth/login`: unprotected, returns a bearer token
//! `POST /api/auth/logout`: ends the presented session
//! `GET /api/auth/me`: the signed-in user, roles and sidebar
//! `GET /api/auth/access`: gate decision for every back-office page

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Caller};
use crate::authorization::{gate_page, navigation_for, GateOutcome, NavItem, Page, RoleSet};
use crate::db;
use crate::identity;
use crate::models::{PatientAccount, User};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: u64,
    pub user: User,
    pub roles: RoleSet,
    pub is_staff: bool,
    pub navigation: Vec<NavItem>,
}

/// `POST /api/auth/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let (user, roles) = identity::authenticate(&conn, &request.email, &request.password)?;

    let (token, ttl) = {
        let mut sessions = ctx
            .sessions
            .lock()
            .map_err(|_| ApiError::Internal("session lock".into()))?;
        (sessions.create(user.id), sessions.ttl())
    };

    tracing::info!(user_id = %user.id, is_staff = roles.is_staff(), "User signed in");
    Ok(Json(LoginResponse {
        token,
        expires_in: ttl.as_secs(),
        user,
        roles,
        is_staff: roles.is_staff(),
        navigation: navigation_for(roles),
    }))
}

/// `POST /api/auth/logout`
pub async fn logout(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<StatusCode, ApiError> {
    let hash = caller.token_hash.ok_or(ApiError::Unauthorized)?;
    {
        let mut sessions = ctx
            .sessions
            .lock()
            .map_err(|_| ApiError::Internal("session lock".into()))?;
        sessions.revoke(&hash);
    }
    tracing::info!(actor = %caller.actor(), "User signed out");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user: User,
    pub roles: RoleSet,
    pub is_staff: bool,
    pub navigation: Vec<NavItem>,
    pub patient_account: Option<PatientAccount>,
}

/// `GET /api/auth/me`
pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<MeResponse>, ApiError> {
    let user_id = caller.user_id().ok_or(ApiError::Unauthorized)?;
    let conn = ctx.core.open_db()?;
    let user = db::get_user(&conn, &user_id)?.ok_or(ApiError::Unauthorized)?;
    let patient_account = db::find_patient_account_by_user(&conn, &user_id)?;
    let roles = caller.roles();

    Ok(Json(MeResponse {
        user,
        roles,
        is_staff: roles.is_staff(),
        navigation: navigation_for(roles),
        patient_account,
    }))
}

#[derive(Serialize)]
pub struct PageAccess {
    pub page: Page,
    pub path: &'static str,
    #[serde(flatten)]
    pub outcome: GateOutcome,
}

/// `GET /api/auth/access`: lets a front end decide what to render without
/// probing each route.
pub async fn access(Extension(caller): Extension<Caller>) -> Json<Vec<PageAccess>> {
    Json(
        Page::ALL
            .into_iter()
            .map(|page| PageAccess {
                page,
                path: page.path(),
                outcome: gate_page(&caller.auth, page),
            })
            .collect(),
    )
}
