use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{enum_col, format_time, time_col, uuid_col};
use crate::db::DatabaseError;
use crate::models::*;

const REQUEST_COLUMNS: &str = "id, appointment_id, patient_account_id, request_type, reason, \
     requested_date, requested_time, status, created_at";

fn request_from_row(row: &Row<'_>) -> rusqlite::Result<ChangeRequest> {
    let requested_time = match row.get::<_, Option<String>>(6)? {
        Some(_) => Some(time_col(row, 6)?),
        None => None,
    };
    Ok(ChangeRequest {
        id: uuid_col(row, 0)?,
        appointment_id: uuid_col(row, 1)?,
        patient_account_id: uuid_col(row, 2)?,
        request_type: enum_col(row, 3)?,
        reason: row.get(4)?,
        requested_date: row.get(5)?,
        requested_time,
        status: enum_col(row, 7)?,
        created_at: row.get(8)?,
    })
}

pub fn insert_change_request(conn: &Connection, req: &ChangeRequest) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointment_requests (id, appointment_id, patient_account_id, request_type,
                                           reason, requested_date, requested_time, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            req.id.to_string(),
            req.appointment_id.to_string(),
            req.patient_account_id.to_string(),
            req.request_type.as_str(),
            req.reason,
            req.requested_date,
            req.requested_time.map(format_time),
            req.status.as_str(),
            req.created_at,
        ],
    )?;
    Ok(())
}

/// All change requests, newest first. Pending-only when `pending_only`.
pub fn list_change_requests(
    conn: &Connection,
    pending_only: bool,
) -> Result<Vec<ChangeRequest>, DatabaseError> {
    let sql = if pending_only {
        format!(
            "SELECT {REQUEST_COLUMNS} FROM appointment_requests
             WHERE status = 'pending' ORDER BY created_at DESC"
        )
    } else {
        format!("SELECT {REQUEST_COLUMNS} FROM appointment_requests ORDER BY created_at DESC")
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], request_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn list_change_requests_for_account(
    conn: &Connection,
    patient_account_id: &Uuid,
) -> Result<Vec<ChangeRequest>, DatabaseError> {
    let sql = format!(
        "SELECT {REQUEST_COLUMNS} FROM appointment_requests
         WHERE patient_account_id = ?1 ORDER BY created_at DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![patient_account_id.to_string()], request_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn resolve_change_request(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointment_requests SET status = 'resolved' WHERE id = ?1",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("ChangeRequest", id));
    }
    Ok(())
}
