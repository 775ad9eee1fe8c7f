//! Public booking endpoints.
//!
//! - `GET /api/services`: active services
//! - `GET /api/staff`: active staff
//! - `GET /api/availability?date=&staff_id=`: occupied and free slots
//! - `GET /api/booking/dates`: bookable dates and the slot grid
//! - `POST /api/bookings`: submit a booking

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::endpoints::{booking_options, today};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::appointment::{self, BookingReceipt, BookingRequest};
use crate::booking::bookable_dates;
use crate::db;
use crate::models::{Service, Staff};
use crate::slots::{self, DayAvailability, BOOKING_SLOTS};

/// `GET /api/services`
pub async fn services(State(ctx): State<ApiContext>) -> Result<Json<Vec<Service>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_services(&conn, true)?))
}

/// `GET /api/staff`
pub async fn staff(State(ctx): State<ApiContext>) -> Result<Json<Vec<Staff>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_staff(&conn, true)?))
}

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub staff_id: Option<Uuid>,
}

/// `GET /api/availability`
pub async fn availability(
    State(ctx): State<ApiContext>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<DayAvailability>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(slots::day_availability(&conn, query.date, query.staff_id)?))
}

#[derive(Serialize)]
pub struct BookingDates {
    pub dates: Vec<NaiveDate>,
    pub slots: &'static [&'static str],
}

/// `GET /api/booking/dates`
pub async fn dates() -> Json<BookingDates> {
    Json(BookingDates {
        dates: bookable_dates(today()),
        slots: &BOOKING_SLOTS,
    })
}

/// `POST /api/bookings`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingReceipt>), ApiError> {
    let mut conn = ctx.core.open_db()?;
    let receipt = appointment::create_booking(&mut conn, &request, booking_options(&ctx))?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
