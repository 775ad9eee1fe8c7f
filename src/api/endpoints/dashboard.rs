//! `GET /api/admin/dashboard`

use axum::extract::State;
use axum::{Extension, Json};

use crate::api::endpoints::today;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Caller};
use crate::dashboard::{self, Dashboard};

pub async fn summary(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Dashboard>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(dashboard::load_dashboard(&conn, today(), caller.roles())?))
}
