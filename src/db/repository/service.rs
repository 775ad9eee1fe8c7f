use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{minutes_col, uuid_col};
use crate::db::DatabaseError;
use crate::models::*;

const SERVICE_COLUMNS: &str = "id, name, description, duration_minutes, price, is_active";

fn service_from_row(row: &Row<'_>) -> rusqlite::Result<Service> {
    Ok(Service {
        id: uuid_col(row, 0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        duration_minutes: minutes_col(row, 3)?,
        price: row.get(4)?,
        is_active: row.get(5)?,
    })
}

pub fn insert_service(conn: &Connection, service: &Service) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO services (id, name, description, duration_minutes, price, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            service.id.to_string(),
            service.name,
            service.description,
            service.duration_minutes,
            service.price,
            service.is_active,
        ],
    )?;
    Ok(())
}

pub fn get_service(conn: &Connection, id: &Uuid) -> Result<Option<Service>, DatabaseError> {
    let sql = format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1");
    Ok(conn
        .query_row(&sql, params![id.to_string()], service_from_row)
        .optional()?)
}

/// Services ordered by name. `active_only` hides retired services from the
/// public booking form.
pub fn list_services(conn: &Connection, active_only: bool) -> Result<Vec<Service>, DatabaseError> {
    let sql = if active_only {
        format!("SELECT {SERVICE_COLUMNS} FROM services WHERE is_active = 1 ORDER BY name ASC")
    } else {
        format!("SELECT {SERVICE_COLUMNS} FROM services ORDER BY name ASC")
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], service_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn update_service(conn: &Connection, service: &Service) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE services SET name = ?2, description = ?3, duration_minutes = ?4, price = ?5, is_active = ?6
         WHERE id = ?1",
        params![
            service.id.to_string(),
            service.name,
            service.description,
            service.duration_minutes,
            service.price,
            service.is_active,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Service", service.id));
    }
    Ok(())
}

pub fn set_service_active(conn: &Connection, id: &Uuid, active: bool) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE services SET is_active = ?2 WHERE id = ?1",
        params![id.to_string(), active],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Service", id));
    }
    Ok(())
}

/// Deletes a service. Referenced services must be deactivated instead.
pub fn delete_service(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let dependents: i64 = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE service_id = ?1",
        params![id.to_string()],
        |row| row.get(0),
    )?;
    if dependents > 0 {
        return Err(DatabaseError::ConstraintViolation(
            "Cannot delete service with existing appointments".into(),
        ));
    }

    let changed = conn.execute("DELETE FROM services WHERE id = ?1", params![id.to_string()])?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Service", id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::fixtures::*;

    #[test]
    fn default_services_are_seeded() {
        let conn = open_memory_database().unwrap();
        let services = list_services(&conn, true).unwrap();
        assert_eq!(services.len(), 6);
        let root_canal = services.iter().find(|s| s.name == "Root Canal").unwrap();
        assert_eq!(root_canal.duration_minutes, Some(90));
    }

    #[test]
    fn missing_duration_reads_as_none_and_defaults() {
        let conn = open_memory_database().unwrap();
        let service = make_service(&conn, "Consultation", None);
        let stored = get_service(&conn, &service.id).unwrap().unwrap();
        assert_eq!(stored.duration_minutes, None);
        assert_eq!(stored.effective_duration(), DEFAULT_DURATION_MINUTES);
    }

    #[test]
    fn inactive_services_hidden_from_active_list() {
        let conn = open_memory_database().unwrap();
        let service = make_service(&conn, "Braces", Some(60));
        set_service_active(&conn, &service.id, false).unwrap();

        let active = list_services(&conn, true).unwrap();
        assert!(active.iter().all(|s| s.id != service.id));
        let all = list_services(&conn, false).unwrap();
        assert!(all.iter().any(|s| s.id == service.id));
    }

    #[test]
    fn delete_rejected_when_referenced() {
        let conn = open_memory_database().unwrap();
        let service = make_service(&conn, "Braces", Some(60));
        let patient = make_patient(&conn, "Aline", "0788000000");
        let mut appt =
            make_appointment(&conn, patient.id, "2026-03-02", "09:00", 60, AppointmentStatus::Pending);
        appt.service_id = Some(service.id);
        crate::db::update_appointment(&conn, &appt).unwrap();

        let err = delete_service(&conn, &service.id).unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
    }

    #[test]
    fn delete_unreferenced_succeeds() {
        let conn = open_memory_database().unwrap();
        let service = make_service(&conn, "Braces", Some(60));
        delete_service(&conn, &service.id).unwrap();
        assert!(get_service(&conn, &service.id).unwrap().is_none());
    }
}
