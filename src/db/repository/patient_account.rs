use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::uuid_col;
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_patient_account(
    conn: &Connection,
    user_id: &Uuid,
    patient_id: &Uuid,
) -> Result<PatientAccount, DatabaseError> {
    let account = PatientAccount {
        id: Uuid::new_v4(),
        user_id: *user_id,
        patient_id: *patient_id,
    };
    conn.execute(
        "INSERT INTO patient_accounts (id, user_id, patient_id) VALUES (?1, ?2, ?3)",
        params![
            account.id.to_string(),
            user_id.to_string(),
            patient_id.to_string()
        ],
    )
    .map_err(|e| {
        if super::is_constraint_violation(&e) {
            DatabaseError::ConstraintViolation("This user already has a patient account".into())
        } else {
            DatabaseError::from(e)
        }
    })?;
    Ok(account)
}

pub fn find_patient_account_by_user(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Option<PatientAccount>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT id, user_id, patient_id FROM patient_accounts WHERE user_id = ?1",
            params![user_id.to_string()],
            |row| {
                Ok(PatientAccount {
                    id: uuid_col(row, 0)?,
                    user_id: uuid_col(row, 1)?,
                    patient_id: uuid_col(row, 2)?,
                })
            },
        )
        .optional()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::fixtures::*;
    use crate::db::{insert_user, PasswordRecord};

    #[test]
    fn one_account_per_user() {
        let conn = open_memory_database().unwrap();
        let patient = make_patient(&conn, "Aline", "0788000000");
        let record = PasswordRecord {
            hash: vec![0; 32],
            salt: vec![0; 16],
        };
        let user = insert_user(&conn, "aline@example.com", "Aline", &record).unwrap();

        let account = insert_patient_account(&conn, &user.id, &patient.id).unwrap();
        let found = find_patient_account_by_user(&conn, &user.id).unwrap().unwrap();
        assert_eq!(found.id, account.id);
        assert_eq!(found.patient_id, patient.id);

        let err = insert_patient_account(&conn, &user.id, &patient.id).unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
    }
}
