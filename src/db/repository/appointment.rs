use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{enum_col, format_time, minutes_col, opt_uuid_col, time_col, uuid_col};
use crate::db::DatabaseError;
use crate::models::*;

const APPOINTMENT_COLUMNS: &str = "a.id, a.patient_id, a.service_id, a.staff_id, \
     a.appointment_date, a.appointment_time, a.duration_minutes, a.status, a.notes, a.created_at";

/// Appointment columns followed by the three LEFT JOINed summaries.
const VIEW_SELECT: &str = "SELECT a.id, a.patient_id, a.service_id, a.staff_id, \
     a.appointment_date, a.appointment_time, a.duration_minutes, a.status, a.notes, a.created_at, \
     p.id, p.full_name, p.phone, p.email, \
     s.id, s.name, s.duration_minutes, \
     st.id, st.full_name, st.specialization \
     FROM appointments a \
     LEFT JOIN patients p ON p.id = a.patient_id \
     LEFT JOIN services s ON s.id = a.service_id \
     LEFT JOIN staff st ON st.id = a.staff_id";

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: uuid_col(row, 0)?,
        patient_id: uuid_col(row, 1)?,
        service_id: opt_uuid_col(row, 2)?,
        staff_id: opt_uuid_col(row, 3)?,
        date: row.get(4)?,
        time: time_col(row, 5)?,
        duration_minutes: minutes_col(row, 6)?.unwrap_or(DEFAULT_DURATION_MINUTES),
        status: enum_col(row, 7)?,
        notes: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn view_from_row(row: &Row<'_>) -> rusqlite::Result<AppointmentView> {
    let appointment = appointment_from_row(row)?;

    let patient = match opt_uuid_col(row, 10)? {
        Some(id) => Some(PatientSummary {
            id,
            full_name: row.get(11)?,
            phone: row.get(12)?,
            email: row.get(13)?,
        }),
        None => None,
    };
    let service = match opt_uuid_col(row, 14)? {
        Some(id) => Some(ServiceSummary {
            id,
            name: row.get(15)?,
            duration_minutes: minutes_col(row, 16)?,
        }),
        None => None,
    };
    let staff = match opt_uuid_col(row, 17)? {
        Some(id) => Some(StaffSummary {
            id,
            full_name: row.get(18)?,
            specialization: row.get(19)?,
        }),
        None => None,
    };

    Ok(AppointmentView {
        appointment,
        patient,
        service,
        staff,
    })
}

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (id, patient_id, service_id, staff_id, appointment_date,
                                   appointment_time, duration_minutes, status, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            appt.id.to_string(),
            appt.patient_id.to_string(),
            appt.service_id.map(|id| id.to_string()),
            appt.staff_id.map(|id| id.to_string()),
            appt.date,
            format_time(appt.time),
            appt.duration_minutes,
            appt.status.as_str(),
            appt.notes,
            appt.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &Uuid) -> Result<Option<Appointment>, DatabaseError> {
    let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments a WHERE a.id = ?1");
    Ok(conn
        .query_row(&sql, params![id.to_string()], appointment_from_row)
        .optional()?)
}

pub fn get_appointment_view(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<AppointmentView>, DatabaseError> {
    let sql = format!("{VIEW_SELECT} WHERE a.id = ?1");
    Ok(conn
        .query_row(&sql, params![id.to_string()], view_from_row)
        .optional()?)
}

/// Appointments with joined summaries, ordered by date then time.
///
/// Date, staff, patient and status filters run in SQL. The free-text search
/// spans joined names and is applied after loading.
pub fn list_appointment_views(
    conn: &Connection,
    filter: &AppointmentFilter,
) -> Result<Vec<AppointmentView>, DatabaseError> {
    let mut sql = format!("{VIEW_SELECT} WHERE 1=1");
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(from) = filter.date_from {
        values.push(Box::new(from));
        sql.push_str(&format!(" AND a.appointment_date >= ?{}", values.len()));
    }
    if let Some(to) = filter.date_to {
        values.push(Box::new(to));
        sql.push_str(&format!(" AND a.appointment_date <= ?{}", values.len()));
    }
    if let Some(staff_id) = filter.staff_id {
        values.push(Box::new(staff_id.to_string()));
        sql.push_str(&format!(" AND a.staff_id = ?{}", values.len()));
    }
    if let Some(patient_id) = filter.patient_id {
        values.push(Box::new(patient_id.to_string()));
        sql.push_str(&format!(" AND a.patient_id = ?{}", values.len()));
    }
    if let Some(status) = filter.status {
        values.push(Box::new(status.as_str()));
        sql.push_str(&format!(" AND a.status = ?{}", values.len()));
    }
    sql.push_str(" ORDER BY a.appointment_date ASC, a.appointment_time ASC");

    let mut stmt = conn.prepare(&sql)?;
    let refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let rows = stmt.query_map(refs.as_slice(), view_from_row)?;
    let mut views = rows.collect::<Result<Vec<_>, _>>()?;

    if let Some(ref query) = filter.search {
        views.retain(|v| v.matches_search(query));
    }
    Ok(views)
}

/// Start time and duration of every appointment on `date` that holds its
/// slots. With `staff_id` set, only that staff member's bookings and
/// unassigned bookings count.
pub fn list_slot_occupancy(
    conn: &Connection,
    date: NaiveDate,
    staff_id: Option<&Uuid>,
) -> Result<Vec<(NaiveTime, u32)>, DatabaseError> {
    let mut sql = String::from(
        "SELECT appointment_time, duration_minutes FROM appointments
         WHERE appointment_date = ?1 AND status != 'cancelled'",
    );
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(date)];
    if let Some(id) = staff_id {
        values.push(Box::new(id.to_string()));
        sql.push_str(" AND (staff_id = ?2 OR staff_id IS NULL)");
    }

    let mut stmt = conn.prepare(&sql)?;
    let refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let rows = stmt.query_map(refs.as_slice(), |row| {
        Ok((
            time_col(row, 0)?,
            minutes_col(row, 1)?.unwrap_or(DEFAULT_DURATION_MINUTES),
        ))
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn update_appointment_status(
    conn: &Connection,
    id: &Uuid,
    status: AppointmentStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = ?2 WHERE id = ?1",
        params![id.to_string(), status.as_str()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Appointment", id));
    }
    Ok(())
}

/// Overwrites every editable column of an existing appointment.
pub fn update_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET patient_id = ?2, service_id = ?3, staff_id = ?4,
                appointment_date = ?5, appointment_time = ?6, duration_minutes = ?7,
                status = ?8, notes = ?9
         WHERE id = ?1",
        params![
            appt.id.to_string(),
            appt.patient_id.to_string(),
            appt.service_id.map(|id| id.to_string()),
            appt.staff_id.map(|id| id.to_string()),
            appt.date,
            format_time(appt.time),
            appt.duration_minutes,
            appt.status.as_str(),
            appt.notes,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Appointment", appt.id));
    }
    Ok(())
}

pub fn delete_appointment(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM appointments WHERE id = ?1",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Appointment", id));
    }
    Ok(())
}

pub fn count_appointments_on(conn: &Connection, date: NaiveDate) -> Result<u32, DatabaseError> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE appointment_date = ?1",
        params![date],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn count_by_status(conn: &Connection, status: AppointmentStatus) -> Result<u32, DatabaseError> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE status = ?1",
        params![status.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}
