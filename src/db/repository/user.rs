use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{enum_col, is_constraint_violation, now_timestamp, uuid_col};
use crate::db::DatabaseError;
use crate::models::*;

/// Stored password material for a user.
#[derive(Debug, Clone)]
pub struct PasswordRecord {
    pub hash: Vec<u8>,
    pub salt: Vec<u8>,
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_col(row, 0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Creates a user. Emails are compared case-insensitively and stored lowercased.
pub fn insert_user(
    conn: &Connection,
    email: &str,
    display_name: &str,
    password: &PasswordRecord,
) -> Result<User, DatabaseError> {
    let user = User {
        id: Uuid::new_v4(),
        email: email.trim().to_lowercase(),
        display_name: display_name.trim().to_string(),
        created_at: now_timestamp(),
    };
    conn.execute(
        "INSERT INTO users (id, email, display_name, password_hash, password_salt, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user.id.to_string(),
            user.email,
            user.display_name,
            password.hash,
            password.salt,
            user.created_at,
        ],
    )
    .map_err(|e| {
        if is_constraint_violation(&e) {
            DatabaseError::ConstraintViolation(format!(
                "An account with email {} already exists",
                user.email
            ))
        } else {
            DatabaseError::from(e)
        }
    })?;
    Ok(user)
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT id, email, display_name, created_at FROM users WHERE id = ?1",
            params![id.to_string()],
            user_from_row,
        )
        .optional()?)
}

pub fn find_user_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<(User, PasswordRecord)>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT id, email, display_name, created_at, password_hash, password_salt
             FROM users WHERE email = ?1",
            params![email.trim().to_lowercase()],
            |row| {
                Ok((
                    user_from_row(row)?,
                    PasswordRecord {
                        hash: row.get(4)?,
                        salt: row.get(5)?,
                    },
                ))
            },
        )
        .optional()?)
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT id, email, display_name, created_at FROM users ORDER BY email ASC")?;
    let rows = stmt.query_map([], user_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn get_user_roles(conn: &Connection, user_id: &Uuid) -> Result<Vec<Role>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT role FROM user_roles WHERE user_id = ?1")?;
    let rows = stmt.query_map(params![user_id.to_string()], |row| enum_col::<Role>(row, 0))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Grants `role` to a user. Granting a role the user already holds is a
/// constraint violation, not a no-op.
pub fn assign_role(
    conn: &Connection,
    user_id: &Uuid,
    role: Role,
) -> Result<RoleAssignment, DatabaseError> {
    let assignment = RoleAssignment {
        id: Uuid::new_v4(),
        user_id: *user_id,
        role,
    };
    conn.execute(
        "INSERT INTO user_roles (id, user_id, role) VALUES (?1, ?2, ?3)",
        params![
            assignment.id.to_string(),
            user_id.to_string(),
            role.as_str()
        ],
    )
    .map_err(|e| {
        if is_constraint_violation(&e) {
            DatabaseError::ConstraintViolation("This user already has this role".into())
        } else {
            DatabaseError::from(e)
        }
    })?;
    Ok(assignment)
}

pub fn remove_role(conn: &Connection, assignment_id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM user_roles WHERE id = ?1",
        params![assignment_id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("RoleAssignment", assignment_id));
    }
    Ok(())
}

pub fn list_role_assignments(conn: &Connection) -> Result<Vec<RoleAssignment>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, user_id, role FROM user_roles ORDER BY user_id, role")?;
    let rows = stmt.query_map([], |row| {
        Ok(RoleAssignment {
            id: uuid_col(row, 0)?,
            user_id: uuid_col(row, 1)?,
            role: enum_col(row, 2)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
