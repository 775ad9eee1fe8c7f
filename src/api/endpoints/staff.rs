//! Staff roster, logins and role assignments, gated on the Staff page.
//!
//! - `GET/POST /api/admin/staff`, `PUT/DELETE /api/admin/staff/:id`
//! - `GET/POST /api/admin/users`
//! - `GET/POST /api/admin/roles`, `DELETE /api/admin/roles/:id`

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::{self, DatabaseError};
use crate::identity;
use crate::models::{Role, RoleAssignment, Staff, User, Weekday};

// ─── Staff members ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct StaffForm {
    pub full_name: String,
    pub specialization: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default = "Staff::default_working_days")]
    pub working_days: Vec<Weekday>,
    #[serde(default = "default_hours_start")]
    pub working_hours_start: NaiveTime,
    #[serde(default = "default_hours_end")]
    pub working_hours_end: NaiveTime,
    pub user_id: Option<Uuid>,
}

fn default_active() -> bool {
    true
}

fn default_hours_start() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn default_hours_end() -> NaiveTime {
    NaiveTime::from_hms_opt(20, 0, 0).unwrap_or(NaiveTime::MIN)
}

impl StaffForm {
    fn into_staff(self, id: Uuid) -> Result<Staff, ApiError> {
        let full_name = self.full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(ApiError::BadRequest("Staff name is required".into()));
        }
        if self.working_hours_end <= self.working_hours_start {
            return Err(ApiError::BadRequest(
                "Working hours must end after they start".into(),
            ));
        }
        Ok(Staff {
            id,
            full_name,
            specialization: self.specialization.filter(|s| !s.trim().is_empty()),
            is_active: self.is_active,
            working_days: self.working_days,
            working_hours_start: self.working_hours_start,
            working_hours_end: self.working_hours_end,
            user_id: self.user_id,
        })
    }
}

/// `GET /api/admin/staff`: the whole roster, inactive members included.
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Staff>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_staff(&conn, false)?))
}

/// `POST /api/admin/staff`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(form): Json<StaffForm>,
) -> Result<(StatusCode, Json<Staff>), ApiError> {
    let staff = form.into_staff(Uuid::new_v4())?;
    let conn = ctx.core.open_db()?;
    db::insert_staff(&conn, &staff)?;
    tracing::info!(staff_id = %staff.id, "Staff member added");
    Ok((StatusCode::CREATED, Json(staff)))
}

/// `PUT /api/admin/staff/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(form): Json<StaffForm>,
) -> Result<Json<Staff>, ApiError> {
    let staff = form.into_staff(id)?;
    let conn = ctx.core.open_db()?;
    db::update_staff(&conn, &staff)?;
    tracing::info!(staff_id = %id, "Staff member updated");
    Ok(Json(staff))
}

/// `DELETE /api/admin/staff/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.core.open_db()?;
    db::delete_staff(&conn, &id)?;
    tracing::info!(staff_id = %id, "Staff member removed");
    Ok(StatusCode::NO_CONTENT)
}

// ─── Logins ───────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct UserWithRoles {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<Role>,
}

/// `GET /api/admin/users`
pub async fn users(State(ctx): State<ApiContext>) -> Result<Json<Vec<UserWithRoles>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let users = db::list_users(&conn)?
        .into_iter()
        .map(|user| {
            let roles = db::get_user_roles(&conn, &user.id)?;
            Ok(UserWithRoles { user, roles })
        })
        .collect::<Result<Vec<_>, DatabaseError>>()?;
    Ok(Json(users))
}

#[derive(Deserialize)]
pub struct NewUser {
    pub email: String,
    pub display_name: String,
    pub password: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

/// `POST /api/admin/users`: creates a staff login with its initial roles.
pub async fn create_user(
    State(ctx): State<ApiContext>,
    Json(input): Json<NewUser>,
) -> Result<(StatusCode, Json<UserWithRoles>), ApiError> {
    let mut conn = ctx.core.open_db()?;
    let tx = conn.transaction()?;
    let user = identity::register_user(&tx, &input.email, &input.display_name, &input.password)?;
    let mut roles = Vec::with_capacity(input.roles.len());
    for role in input.roles {
        if !roles.contains(&role) {
            identity::grant_role(&tx, &user.id, role)?;
            roles.push(role);
        }
    }
    tx.commit()?;
    Ok((StatusCode::CREATED, Json(UserWithRoles { user, roles })))
}

// ─── Role assignments ─────────────────────────────────────────────────────────

/// `GET /api/admin/roles`
pub async fn roles(
    State(ctx): State<ApiContext>,
) -> Result<Json<Vec<RoleAssignment>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_role_assignments(&conn)?))
}

#[derive(Deserialize)]
pub struct GrantRole {
    pub user_id: Uuid,
    pub role: Role,
}

#[derive(Serialize)]
pub struct GrantedRole {
    pub id: Uuid,
}

/// `POST /api/admin/roles`. Granting a role twice is a 409 carrying the
/// store's message.
pub async fn grant(
    State(ctx): State<ApiContext>,
    Json(body): Json<GrantRole>,
) -> Result<(StatusCode, Json<GrantedRole>), ApiError> {
    let conn = ctx.core.open_db()?;
    let id = identity::grant_role(&conn, &body.user_id, body.role)?;
    Ok((StatusCode::CREATED, Json(GrantedRole { id })))
}

/// `DELETE /api/admin/roles/:id`
pub async fn revoke(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.core.open_db()?;
    db::remove_role(&conn, &id)?;
    tracing::info!(assignment_id = %id, "Role revoked");
    Ok(StatusCode::NO_CONTENT)
}
