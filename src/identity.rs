//! Login accounts and role resolution.
//!
//! Passwords are stored as PBKDF2-HMAC-SHA256 digests with a per-user random
//! salt and compared in constant time.

use std::sync::LazyLock;

use pbkdf2::pbkdf2_hmac;
use regex::Regex;
use rusqlite::Connection;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;

use crate::authorization::{AuthState, RoleSet};
use crate::db::{self, DatabaseError, PasswordRecord};
use crate::models::{Role, User};

#[cfg(not(test))]
pub const PBKDF2_ITERATIONS: u32 = 600_000;
#[cfg(test)]
pub const PBKDF2_ITERATIONS: u32 = 1_000;

pub const HASH_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 32;
pub const MIN_PASSWORD_LENGTH: usize = 8;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    WeakPassword,

    #[error("Display name is required")]
    MissingName,

    #[error("User not found: {0}")]
    UnknownUser(Uuid),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

fn derive(password: &str, salt: &[u8]) -> [u8; HASH_LENGTH] {
    let mut out = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut out);
    out
}

pub fn hash_password(password: &str) -> PasswordRecord {
    let salt = generate_salt();
    PasswordRecord {
        hash: derive(password, &salt).to_vec(),
        salt: salt.to_vec(),
    }
}

pub fn verify_password(password: &str, record: &PasswordRecord) -> bool {
    let candidate = derive(password, &record.salt);
    candidate.ct_eq(record.hash.as_slice()).into()
}

fn validate_new_account(email: &str, display_name: &str, password: &str) -> Result<(), IdentityError> {
    if !EMAIL_RE.is_match(email.trim()) {
        return Err(IdentityError::InvalidEmail(email.trim().to_string()));
    }
    if display_name.trim().is_empty() {
        return Err(IdentityError::MissingName);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(IdentityError::WeakPassword);
    }
    Ok(())
}

/// Creates a login account. Holds no roles until one is assigned.
pub fn register_user(
    conn: &Connection,
    email: &str,
    display_name: &str,
    password: &str,
) -> Result<User, IdentityError> {
    validate_new_account(email, display_name, password)?;
    let user = db::insert_user(conn, email, display_name, &hash_password(password))?;
    tracing::info!(user_id = %user.id, "User registered");
    Ok(user)
}

/// Checks credentials and returns the user with their roles.
///
/// Unknown emails and wrong passwords are indistinguishable to the caller.
pub fn authenticate(
    conn: &Connection,
    email: &str,
    password: &str,
) -> Result<(User, RoleSet), IdentityError> {
    let Some((user, record)) = db::find_user_by_email(conn, email)? else {
        // Burn comparable time so unknown emails are not faster
        let _ = derive(password, &[0u8; SALT_LENGTH]);
        tracing::warn!("Login failed: unknown email");
        return Err(IdentityError::InvalidCredentials);
    };
    if !verify_password(password, &record) {
        tracing::warn!(user_id = %user.id, "Login failed: wrong password");
        return Err(IdentityError::InvalidCredentials);
    }
    let roles = load_roles(conn, &user.id)?;
    Ok((user, roles))
}

pub fn load_roles(conn: &Connection, user_id: &Uuid) -> Result<RoleSet, DatabaseError> {
    Ok(db::get_user_roles(conn, user_id)?.into_iter().collect())
}

/// Resolves a session's user into the gate's view of them. A session whose
/// user has since been deleted reads as anonymous.
pub fn auth_state_for(conn: &Connection, user_id: Option<Uuid>) -> Result<AuthState, DatabaseError> {
    let Some(user_id) = user_id else {
        return Ok(AuthState::Anonymous);
    };
    if db::get_user(conn, &user_id)?.is_none() {
        return Ok(AuthState::Anonymous);
    }
    Ok(AuthState::SignedIn {
        user_id,
        roles: load_roles(conn, &user_id)?,
    })
}

/// Grants a role to an existing user. Duplicates are rejected by the store.
pub fn grant_role(conn: &Connection, user_id: &Uuid, role: Role) -> Result<Uuid, IdentityError> {
    if db::get_user(conn, user_id)?.is_none() {
        return Err(IdentityError::UnknownUser(*user_id));
    }
    let assignment = db::assign_role(conn, user_id, role)?;
    tracing::info!(%user_id, %role, "Role granted");
    Ok(assignment.id)
}

/// Makes sure a `super_admin` login exists for `email`. Used at startup so a
/// fresh install has someone who can assign roles.
pub fn ensure_bootstrap_admin(
    conn: &Connection,
    email: &str,
    password: &str,
) -> Result<User, IdentityError> {
    let user = match db::find_user_by_email(conn, email)? {
        Some((user, _)) => user,
        None => register_user(conn, email, "Administrator", password)?,
    };
    if !load_roles(conn, &user.id)?.contains(Role::SuperAdmin) {
        db::assign_role(conn, &user.id, Role::SuperAdmin)?;
        tracing::info!(user_id = %user.id, "Bootstrap administrator granted super_admin");
    }
    Ok(user)
}
