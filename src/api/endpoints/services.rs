//! Service catalogue management, gated on the Services page.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::{Service, MAX_DURATION_MINUTES};

#[derive(Deserialize)]
pub struct ServiceForm {
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: Option<u32>,
    pub price: Option<f64>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl ServiceForm {
    fn into_service(self, id: Uuid) -> Result<Service, ApiError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::BadRequest("Service name is required".into()));
        }
        if self.duration_minutes.is_some_and(|m| m > MAX_DURATION_MINUTES) {
            return Err(ApiError::BadRequest(format!(
                "Duration must be between 1 and {MAX_DURATION_MINUTES} minutes"
            )));
        }
        if self.price.is_some_and(|p| p < 0.0) {
            return Err(ApiError::BadRequest("Price cannot be negative".into()));
        }
        Ok(Service {
            id,
            name,
            description: self.description.filter(|d| !d.trim().is_empty()),
            duration_minutes: self.duration_minutes.filter(|m| *m > 0),
            price: self.price,
            is_active: self.is_active,
        })
    }
}

/// `GET /api/admin/services`: all services, retired ones included.
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Service>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_services(&conn, false)?))
}

/// `POST /api/admin/services`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(form): Json<ServiceForm>,
) -> Result<(StatusCode, Json<Service>), ApiError> {
    let service = form.into_service(Uuid::new_v4())?;
    let conn = ctx.core.open_db()?;
    db::insert_service(&conn, &service)?;
    tracing::info!(service_id = %service.id, name = %service.name, "Service created");
    Ok((StatusCode::CREATED, Json(service)))
}

/// `PUT /api/admin/services/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(form): Json<ServiceForm>,
) -> Result<Json<Service>, ApiError> {
    let service = form.into_service(id)?;
    let conn = ctx.core.open_db()?;
    db::update_service(&conn, &service)?;
    tracing::info!(service_id = %id, "Service updated");
    Ok(Json(service))
}

#[derive(Deserialize)]
pub struct ActiveBody {
    pub is_active: bool,
}

/// `PUT /api/admin/services/:id/active`
pub async fn set_active(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(body): Json<ActiveBody>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.core.open_db()?;
    db::set_service_active(&conn, &id, body.is_active)?;
    tracing::info!(service_id = %id, is_active = body.is_active, "Service visibility changed");
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/admin/services/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.core.open_db()?;
    db::delete_service(&conn, &id)?;
    tracing::info!(service_id = %id, "Service deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(minutes: Option<u32>) -> ServiceForm {
        ServiceForm {
            name: "Root canal".into(),
            description: None,
            duration_minutes: minutes,
            price: Some(120.0),
            is_active: true,
        }
    }

    #[test]
    fn duration_over_a_day_is_rejected() {
        let err = form(Some(MAX_DURATION_MINUTES + 1))
            .into_service(Uuid::new_v4())
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let service = form(Some(90)).into_service(Uuid::new_v4()).unwrap();
        assert_eq!(service.duration_minutes, Some(90));
    }

    #[test]
    fn zero_duration_is_stored_as_none() {
        let service = form(Some(0)).into_service(Uuid::new_v4()).unwrap();
        assert_eq!(service.duration_minutes, None);
        assert_eq!(service.effective_duration(), 30);
    }
}
