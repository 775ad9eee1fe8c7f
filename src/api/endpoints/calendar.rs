//! `GET /api/admin/calendar?view=&date=&staff_id=&nav=`

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::endpoints::today;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::calendar::{self, CalendarCursor, CalendarSnapshot, CalendarView};

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nav {
    Previous,
    Next,
    Today,
}

#[derive(Deserialize)]
pub struct CalendarQuery {
    pub view: Option<CalendarView>,
    pub date: Option<NaiveDate>,
    pub staff_id: Option<Uuid>,
    pub nav: Option<Nav>,
}

#[derive(Serialize)]
pub struct CalendarPage {
    pub staff_id: Option<Uuid>,
    /// Anchors the previous and next buttons link to.
    pub previous: NaiveDate,
    pub next: NaiveDate,
    /// Carries the `view` tag.
    #[serde(flatten)]
    pub snapshot: CalendarSnapshot,
}

/// Defaults to the week containing today.
pub async fn page(
    State(ctx): State<ApiContext>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<CalendarPage>, ApiError> {
    let today = today();
    let mut cursor = CalendarCursor::new(
        query.view.unwrap_or(CalendarView::Week),
        query.date.unwrap_or(today),
    );
    cursor = match query.nav {
        Some(Nav::Previous) => cursor.previous(),
        Some(Nav::Next) => cursor.next(),
        Some(Nav::Today) => cursor.today(today),
        None => cursor,
    };

    let conn = ctx.core.open_db()?;
    let snapshot =
        calendar::load_calendar(&conn, cursor.view, cursor.anchor, query.staff_id, today)?;
    Ok(Json(CalendarPage {
        staff_id: query.staff_id,
        previous: cursor.previous().anchor,
        next: cursor.next().anchor,
        snapshot,
    }))
}
