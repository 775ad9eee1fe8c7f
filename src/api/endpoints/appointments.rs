//! Back-office appointment endpoints, gated on the Appointments page.
//!
//! - `GET/POST /api/admin/appointments`
//! - `GET/PUT/DELETE /api/admin/appointments/:id`
//! - `PUT /api/admin/appointments/:id/status`
//! - `POST /api/admin/appointments/:id/actions/:action`
//! - `GET /api/admin/change-requests`, `POST /api/admin/change-requests/:id/resolve`

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::endpoints::booking_options;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::appointment::{self, AdminAppointmentInput, AppointmentUpdate};
use crate::db;
use crate::models::*;

/// An appointment as listed on the back-office table.
#[derive(Serialize)]
pub struct AppointmentRow {
    #[serde(flatten)]
    pub view: AppointmentView,
    pub patient_label: String,
    pub service_label: String,
    pub staff_label: String,
    pub quick_actions: &'static [QuickAction],
}

impl From<AppointmentView> for AppointmentRow {
    fn from(view: AppointmentView) -> Self {
        Self {
            patient_label: view.patient_label().to_string(),
            service_label: view.service_label().to_string(),
            staff_label: view.staff_label().to_string(),
            quick_actions: view.quick_actions(),
            view,
        }
    }
}

#[derive(Deserialize, Default)]
pub struct ListQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub staff_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub search: Option<String>,
}

#[derive(Serialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<AppointmentRow>,
}

/// `GET /api/admin/appointments`
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<ListQuery>,
) -> Result<Json<AppointmentsResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let filter = AppointmentFilter {
        date_from: query.date_from,
        date_to: query.date_to,
        staff_id: query.staff_id,
        patient_id: query.patient_id,
        status: query.status,
        search: query.search.filter(|s| !s.trim().is_empty()),
    };
    let appointments = db::list_appointment_views(&conn, &filter)?
        .into_iter()
        .map(AppointmentRow::from)
        .collect();
    Ok(Json(AppointmentsResponse { appointments }))
}

/// `GET /api/admin/appointments/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentRow>, ApiError> {
    let conn = ctx.core.open_db()?;
    let view = db::get_appointment_view(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("Appointment not found: {id}")))?;
    Ok(Json(view.into()))
}

/// `POST /api/admin/appointments`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(input): Json<AdminAppointmentInput>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    let mut conn = ctx.core.open_db()?;
    let appt = appointment::create_admin_appointment(&mut conn, &input, booking_options(&ctx))?;
    Ok((StatusCode::CREATED, Json(appt)))
}

/// `PUT /api/admin/appointments/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(update): Json<AppointmentUpdate>,
) -> Result<Json<Appointment>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(appointment::update_appointment(&conn, &id, &update)?))
}

/// `DELETE /api/admin/appointments/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.core.open_db()?;
    appointment::delete_appointment(&conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct StatusBody {
    pub status: AppointmentStatus,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub id: Uuid,
    pub status: AppointmentStatus,
}

/// `PUT /api/admin/appointments/:id/status`
pub async fn set_status(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusBody>,
) -> Result<Json<StatusResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    appointment::update_status(&conn, &id, body.status)?;
    Ok(Json(StatusResponse {
        id,
        status: body.status,
    }))
}

/// `POST /api/admin/appointments/:id/actions/:action`
pub async fn quick_action(
    State(ctx): State<ApiContext>,
    Path((id, action)): Path<(Uuid, QuickAction)>,
) -> Result<Json<StatusResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let status = appointment::apply_quick_action(&conn, &id, action)?;
    Ok(Json(StatusResponse { id, status }))
}

#[derive(Deserialize)]
pub struct ChangeRequestQuery {
    #[serde(default)]
    pub pending: bool,
}

/// `GET /api/admin/change-requests`
pub async fn change_requests(
    State(ctx): State<ApiContext>,
    Query(query): Query<ChangeRequestQuery>,
) -> Result<Json<Vec<ChangeRequest>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_change_requests(&conn, query.pending)?))
}

/// `POST /api/admin/change-requests/:id/resolve`
pub async fn resolve_change_request(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.core.open_db()?;
    db::resolve_change_request(&conn, &id)?;
    tracing::info!(request_id = %id, "Change request resolved");
    Ok(StatusCode::NO_CONTENT)
}
