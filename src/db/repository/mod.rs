//! Repository layer — entity-scoped database operations.
//!
//! Free functions over `&rusqlite::Connection`; one sub-module per table
//! family, all re-exported here.

mod appointment;
mod audit;
mod change_request;
mod patient;
mod patient_account;
mod service;
mod staff;
mod user;

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use rusqlite::types::Type;
use rusqlite::Row;
use uuid::Uuid;

use super::DatabaseError;

pub use appointment::*;
pub use audit::*;
pub use change_request::*;
pub use patient::*;
pub use patient_account::*;
pub use service::*;
pub use staff::*;
pub use user::*;

/// Storage format for clock times ("HH:MM").
pub const TIME_FORMAT: &str = "%H:%M";

pub(crate) fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Accepts "HH:MM" and "HH:MM:SS".
pub fn parse_clock(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

/// Current local time truncated to whole seconds, the precision stored.
pub(crate) fn now_timestamp() -> NaiveDateTime {
    let now = chrono::Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub(crate) fn uuid_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn opt_uuid_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => Uuid::parse_str(&raw)
            .map(Some)
            .map_err(|e| conversion_error(idx, e)),
        None => Ok(None),
    }
}

pub(crate) fn time_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveTime> {
    let raw: String = row.get(idx)?;
    parse_clock(&raw).ok_or_else(|| {
        conversion_error(
            idx,
            DatabaseError::ConstraintViolation(format!("Invalid clock time: {raw}")),
        )
    })
}

pub(crate) fn enum_col<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = DatabaseError>,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|e| conversion_error(idx, e))
}

/// Optional positive minute count; zero and negatives read as absent.
pub(crate) fn minutes_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<u32>> {
    Ok(row
        .get::<_, Option<i64>>(idx)?
        .filter(|m| *m > 0)
        .and_then(|m| u32::try_from(m).ok()))
}

/// True when the error is a UNIQUE/CHECK/FOREIGN KEY violation.
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
