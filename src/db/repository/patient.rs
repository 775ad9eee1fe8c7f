use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{now_timestamp, uuid_col};
use crate::db::DatabaseError;
use crate::models::*;

const PATIENT_COLUMNS: &str =
    "id, full_name, phone, email, date_of_birth, address, created_at";

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: uuid_col(row, 0)?,
        full_name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        date_of_birth: row.get(4)?,
        address: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, full_name, phone, email, date_of_birth, address, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            patient.id.to_string(),
            patient.full_name,
            patient.phone,
            patient.email,
            patient.date_of_birth,
            patient.address,
            patient.created_at,
        ],
    )
    .map_err(|e| {
        if super::is_constraint_violation(&e) {
            DatabaseError::ConstraintViolation(format!(
                "A patient with phone {} already exists",
                patient.phone
            ))
        } else {
            DatabaseError::from(e)
        }
    })?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1");
    Ok(conn
        .query_row(&sql, params![id.to_string()], patient_from_row)
        .optional()?)
}

pub fn find_patient_by_phone(
    conn: &Connection,
    phone: &str,
) -> Result<Option<Patient>, DatabaseError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE phone = ?1");
    Ok(conn
        .query_row(&sql, params![phone], patient_from_row)
        .optional()?)
}

/// Returns the patient registered under `input.phone`, creating it when
/// absent. The insert is conditional on the UNIQUE(phone) index, so two
/// concurrent callers converge on the same row. The flag reports whether
/// this call created it.
pub fn find_or_create_patient(
    conn: &Connection,
    input: &PatientInput,
) -> Result<(Patient, bool), DatabaseError> {
    if let Some(existing) = find_patient_by_phone(conn, &input.phone)? {
        return Ok((existing, false));
    }

    let inserted = conn.execute(
        "INSERT INTO patients (id, full_name, phone, email, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(phone) DO NOTHING",
        params![
            Uuid::new_v4().to_string(),
            input.full_name,
            input.phone,
            input.email,
            now_timestamp(),
        ],
    )?;

    let patient = find_patient_by_phone(conn, &input.phone)?
        .ok_or_else(|| DatabaseError::not_found("Patient", &input.phone))?;
    Ok((patient, inserted == 1))
}

pub fn list_patients(
    conn: &Connection,
    filter: &PatientFilter,
) -> Result<Vec<Patient>, DatabaseError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY full_name ASC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], patient_from_row)?;
    let mut patients = rows.collect::<Result<Vec<_>, _>>()?;

    if let Some(ref query) = filter.search {
        let needle = query.trim().to_lowercase();
        if !needle.is_empty() {
            patients.retain(|p| {
                p.full_name.to_lowercase().contains(&needle) || p.phone.contains(&needle)
            });
        }
    }
    Ok(patients)
}

pub fn update_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    let changed = conn
        .execute(
            "UPDATE patients SET full_name = ?2, phone = ?3, email = ?4, date_of_birth = ?5, address = ?6
             WHERE id = ?1",
            params![
                patient.id.to_string(),
                patient.full_name,
                patient.phone,
                patient.email,
                patient.date_of_birth,
                patient.address,
            ],
        )
        .map_err(|e| {
            if super::is_constraint_violation(&e) {
                DatabaseError::ConstraintViolation(format!(
                    "A patient with phone {} already exists",
                    patient.phone
                ))
            } else {
                DatabaseError::from(e)
            }
        })?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Patient", patient.id));
    }
    Ok(())
}

/// Deletes a patient. Rejected while any appointment references it.
pub fn delete_patient(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let dependents: i64 = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE patient_id = ?1",
        params![id.to_string()],
        |row| row.get(0),
    )?;
    if dependents > 0 {
        return Err(DatabaseError::ConstraintViolation(
            "Cannot delete patient with existing appointments".into(),
        ));
    }

    let changed = conn.execute("DELETE FROM patients WHERE id = ?1", params![id.to_string()])?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Patient", id));
    }
    Ok(())
}

pub fn count_patients(conn: &Connection) -> Result<u32, DatabaseError> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::open_memory_database;

    fn input(name: &str, phone: &str) -> PatientInput {
        PatientInput {
            full_name: name.into(),
            phone: phone.into(),
            email: None,
        }
    }

    #[test]
    fn find_or_create_creates_once() {
        let conn = open_memory_database().unwrap();
        let (first, created) = find_or_create_patient(&conn, &input("Aline", "0788000000")).unwrap();
        assert!(created);

        let (second, created) =
            find_or_create_patient(&conn, &input("Aline M.", "0788000000")).unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
        // Existing record is reused as-is, not overwritten
        assert_eq!(second.full_name, "Aline");
        assert_eq!(count_patients(&conn).unwrap(), 1);
    }

    #[test]
    fn duplicate_phone_insert_is_constraint_violation() {
        let conn = open_memory_database().unwrap();
        make_patient(&conn, "Aline", "0788000000");
        let dup = Patient {
            id: Uuid::new_v4(),
            full_name: "Other".into(),
            phone: "0788000000".into(),
            email: None,
            date_of_birth: None,
            address: None,
            created_at: now_timestamp(),
        };
        let err = insert_patient(&conn, &dup).unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
    }

    #[test]
    fn delete_rejected_with_appointments() {
        let conn = open_memory_database().unwrap();
        let patient = make_patient(&conn, "Aline", "0788000000");
        make_appointment(&conn, patient.id, "2026-03-02", "09:00", 30, AppointmentStatus::Pending);

        let err = delete_patient(&conn, &patient.id).unwrap_err();
        assert!(err.to_string().contains("existing appointments"));
        assert!(get_patient(&conn, &patient.id).unwrap().is_some());
    }

    #[test]
    fn delete_without_appointments_succeeds() {
        let conn = open_memory_database().unwrap();
        let patient = make_patient(&conn, "Aline", "0788000000");
        delete_patient(&conn, &patient.id).unwrap();
        assert!(get_patient(&conn, &patient.id).unwrap().is_none());
    }

    #[test]
    fn delete_unknown_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = delete_patient(&conn, &Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn list_filters_by_name_or_phone() {
        let conn = open_memory_database().unwrap();
        make_patient(&conn, "Aline Uwase", "0788000000");
        make_patient(&conn, "Jean Bosco", "0722111111");

        let all = list_patients(&conn, &PatientFilter::default()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].full_name, "Aline Uwase");

        let by_name = list_patients(&conn, &PatientFilter { search: Some("bosco".into()) }).unwrap();
        assert_eq!(by_name.len(), 1);

        let by_phone = list_patients(&conn, &PatientFilter { search: Some("0788".into()) }).unwrap();
        assert_eq!(by_phone[0].full_name, "Aline Uwase");
    }

    #[test]
    fn update_changes_fields() {
        let conn = open_memory_database().unwrap();
        let mut patient = make_patient(&conn, "Aline", "0788000000");
        patient.email = Some("aline@example.com".into());
        update_patient(&conn, &patient).unwrap();
        let stored = get_patient(&conn, &patient.id).unwrap().unwrap();
        assert_eq!(stored.email.as_deref(), Some("aline@example.com"));
    }
}
