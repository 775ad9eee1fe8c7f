//! Patient self-service.
//!
//! - `POST /api/portal/register`: open, signs the new patient in
//! - `GET /api/portal/appointments`: upcoming and past, newest first
//! - `GET/POST /api/portal/requests`: reschedule and cancel requests

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::endpoints::today;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Caller};
use crate::models::{ChangeRequest, PatientAccount, User};
use crate::portal::{self, ChangeRequestInput, MyAppointments, PortalRegistration};

#[derive(Serialize)]
pub struct RegisterResponse {
    pub token: String,
    pub expires_in: u64,
    pub user: User,
    pub account: PatientAccount,
    pub patient_created: bool,
}

/// `POST /api/portal/register`
pub async fn register(
    State(ctx): State<ApiContext>,
    Json(input): Json<PortalRegistration>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let mut conn = ctx.core.open_db()?;
    let registered = portal::register_patient_account(&mut conn, &input)?;

    let (token, ttl) = {
        let mut sessions = ctx
            .sessions
            .lock()
            .map_err(|_| ApiError::Internal("session lock".into()))?;
        (sessions.create(registered.user.id), sessions.ttl())
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            token,
            expires_in: ttl.as_secs(),
            user: registered.user,
            account: registered.account,
            patient_created: registered.patient_created,
        }),
    ))
}

fn signed_in_account(
    conn: &rusqlite::Connection,
    caller: &Caller,
) -> Result<PatientAccount, ApiError> {
    let user_id = caller.user_id().ok_or(ApiError::Unauthorized)?;
    Ok(portal::account_for_user(conn, &user_id)?)
}

/// `GET /api/portal/appointments`
pub async fn appointments(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<MyAppointments>, ApiError> {
    let conn = ctx.core.open_db()?;
    let account = signed_in_account(&conn, &caller)?;
    Ok(Json(portal::my_appointments(&conn, &account, today())?))
}

/// `GET /api/portal/requests`
pub async fn requests(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<ChangeRequest>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let account = signed_in_account(&conn, &caller)?;
    Ok(Json(portal::my_change_requests(&conn, &account)?))
}

/// `POST /api/portal/requests`
pub async fn file_request(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<ChangeRequestInput>,
) -> Result<(StatusCode, Json<ChangeRequest>), ApiError> {
    let conn = ctx.core.open_db()?;
    let account = signed_in_account(&conn, &caller)?;
    let request = portal::file_change_request(&conn, &account, &input)?;
    Ok((StatusCode::CREATED, Json(request)))
}
