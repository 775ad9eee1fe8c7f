//! Patient records, gated on the Patients page.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::{self, repository::now_timestamp};
use crate::models::{Patient, PatientFilter};

#[derive(Deserialize)]
pub struct PatientForm {
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
}

impl PatientForm {
    fn validate(&self) -> Result<(), ApiError> {
        if self.full_name.trim().is_empty() || self.phone.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "Patient name and phone number are required".into(),
            ));
        }
        Ok(())
    }

    fn into_patient(self, id: Uuid, created_at: chrono::NaiveDateTime) -> Patient {
        let blank_to_none =
            |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Patient {
            id,
            full_name: self.full_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: blank_to_none(self.email),
            date_of_birth: self.date_of_birth,
            address: blank_to_none(self.address),
            created_at,
        }
    }
}

#[derive(Deserialize)]
pub struct PatientQuery {
    pub search: Option<String>,
}

/// `GET /api/admin/patients`
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<PatientQuery>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let filter = PatientFilter {
        search: query.search,
    };
    Ok(Json(db::list_patients(&conn, &filter)?))
}

/// `GET /api/admin/patients/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Patient>, ApiError> {
    let conn = ctx.core.open_db()?;
    db::get_patient(&conn, &id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Patient not found: {id}")))
}

/// `POST /api/admin/patients`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(form): Json<PatientForm>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    form.validate()?;
    let conn = ctx.core.open_db()?;
    let patient = form.into_patient(Uuid::new_v4(), now_timestamp());
    db::insert_patient(&conn, &patient)?;
    tracing::info!(patient_id = %patient.id, "Patient created");
    Ok((StatusCode::CREATED, Json(patient)))
}

/// `PUT /api/admin/patients/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(form): Json<PatientForm>,
) -> Result<Json<Patient>, ApiError> {
    form.validate()?;
    let conn = ctx.core.open_db()?;
    let existing = db::get_patient(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("Patient not found: {id}")))?;
    let patient = form.into_patient(id, existing.created_at);
    db::update_patient(&conn, &patient)?;
    tracing::info!(patient_id = %id, "Patient updated");
    Ok(Json(patient))
}

/// `DELETE /api/admin/patients/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.core.open_db()?;
    db::delete_patient(&conn, &id)?;
    tracing::info!(patient_id = %id, "Patient deleted");
    Ok(StatusCode::NO_CONTENT)
}
