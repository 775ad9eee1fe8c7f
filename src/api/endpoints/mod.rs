//! API endpoint handlers.
//!
//! Each module corresponds to a screen or feature. Handlers open a
//! connection per request and delegate to the domain modules.

pub mod appointments;
pub mod auth;
pub mod booking;
pub mod calendar;
pub mod dashboard;
pub mod health;
pub mod patients;
pub mod portal;
pub mod services;
pub mod staff;

use chrono::NaiveDate;

use crate::appointment::BookingOptions;
use crate::api::types::ApiContext;

/// The clinic's current calendar date.
pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub(crate) fn booking_options(ctx: &ApiContext) -> BookingOptions {
    BookingOptions {
        enforce_slot_conflicts: ctx.core.config.enforce_slot_conflicts,
    }
}
