use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{conversion_error, format_time, opt_uuid_col, time_col, uuid_col};
use crate::db::DatabaseError;
use crate::models::*;

const STAFF_COLUMNS: &str = "id, full_name, specialization, is_active, working_days, \
     working_hours_start, working_hours_end, user_id";

/// Working days are stored as a comma-separated list of lowercase names.
fn join_days(days: &[Weekday]) -> String {
    days.iter().map(|d| d.as_str()).collect::<Vec<_>>().join(",")
}

fn split_days(raw: &str) -> Result<Vec<Weekday>, DatabaseError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

fn staff_from_row(row: &Row<'_>) -> rusqlite::Result<Staff> {
    let raw_days: String = row.get(4)?;
    Ok(Staff {
        id: uuid_col(row, 0)?,
        full_name: row.get(1)?,
        specialization: row.get(2)?,
        is_active: row.get(3)?,
        working_days: split_days(&raw_days).map_err(|e| conversion_error(4, e))?,
        working_hours_start: time_col(row, 5)?,
        working_hours_end: time_col(row, 6)?,
        user_id: opt_uuid_col(row, 7)?,
    })
}

pub fn insert_staff(conn: &Connection, staff: &Staff) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO staff (id, full_name, specialization, is_active, working_days,
                            working_hours_start, working_hours_end, user_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            staff.id.to_string(),
            staff.full_name,
            staff.specialization,
            staff.is_active,
            join_days(&staff.working_days),
            format_time(staff.working_hours_start),
            format_time(staff.working_hours_end),
            staff.user_id.map(|id| id.to_string()),
        ],
    )?;
    Ok(())
}

pub fn get_staff(conn: &Connection, id: &Uuid) -> Result<Option<Staff>, DatabaseError> {
    let sql = format!("SELECT {STAFF_COLUMNS} FROM staff WHERE id = ?1");
    Ok(conn
        .query_row(&sql, params![id.to_string()], staff_from_row)
        .optional()?)
}

pub fn list_staff(conn: &Connection, active_only: bool) -> Result<Vec<Staff>, DatabaseError> {
    let sql = if active_only {
        format!("SELECT {STAFF_COLUMNS} FROM staff WHERE is_active = 1 ORDER BY full_name ASC")
    } else {
        format!("SELECT {STAFF_COLUMNS} FROM staff ORDER BY full_name ASC")
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], staff_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn update_staff(conn: &Connection, staff: &Staff) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE staff SET full_name = ?2, specialization = ?3, is_active = ?4, working_days = ?5,
                          working_hours_start = ?6, working_hours_end = ?7, user_id = ?8
         WHERE id = ?1",
        params![
            staff.id.to_string(),
            staff.full_name,
            staff.specialization,
            staff.is_active,
            join_days(&staff.working_days),
            format_time(staff.working_hours_start),
            format_time(staff.working_hours_end),
            staff.user_id.map(|id| id.to_string()),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Staff", staff.id));
    }
    Ok(())
}

/// Removes a staff member. Their appointments stay on the books, unassigned.
pub fn delete_staff(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM staff WHERE id = ?1", params![id.to_string()])?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Staff", id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::fixtures::*;

    #[test]
    fn staff_round_trips_schedule() {
        let conn = open_memory_database().unwrap();
        let staff = make_staff(&conn, "Dr. Samuel");
        let stored = get_staff(&conn, &staff.id).unwrap().unwrap();
        assert_eq!(stored.working_days, Staff::default_working_days());
        assert_eq!(stored.working_hours_start, time("08:00"));
        assert_eq!(stored.working_hours_end, time("20:00"));
        assert!(stored.works_on(date("2026-03-02"))); // Monday
        assert!(!stored.works_on(date("2026-03-07"))); // Saturday
    }

    #[test]
    fn inactive_staff_hidden_from_active_list() {
        let conn = open_memory_database().unwrap();
        let mut staff = make_staff(&conn, "Dr. Samuel");
        make_staff(&conn, "Dr. Grace");
        staff.is_active = false;
        update_staff(&conn, &staff).unwrap();

        let active = list_staff(&conn, true).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].full_name, "Dr. Grace");
        assert_eq!(list_staff(&conn, false).unwrap().len(), 2);
    }

    #[test]
    fn deleting_staff_unassigns_appointments() {
        let conn = open_memory_database().unwrap();
        let staff = make_staff(&conn, "Dr. Samuel");
        let patient = make_patient(&conn, "Aline", "0788000000");
        let mut appt =
            make_appointment(&conn, patient.id, "2026-03-02", "09:00", 30, AppointmentStatus::Confirmed);
        appt.staff_id = Some(staff.id);
        crate::db::update_appointment(&conn, &appt).unwrap();

        delete_staff(&conn, &staff.id).unwrap();
        let stored = crate::db::get_appointment(&conn, &appt.id).unwrap().unwrap();
        assert_eq!(stored.staff_id, None);
    }

    #[test]
    fn unknown_weekday_is_rejected() {
        assert!(split_days("monday,funday").is_err());
        assert_eq!(split_days("").unwrap(), Vec::<Weekday>::new());
    }
}
