//! Appointment lifecycle: booking, status changes, edits and deletion.
//!
//! Status moves along `pending → confirmed → completed`, with `cancelled`
//! reachable from `pending` and `confirmed`. `update_status` and
//! `update_appointment` overwrite without checking that graph; quick actions
//! do check it.

use chrono::{NaiveDate, NaiveTime};
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::*;
use crate::slots;

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Patient name and phone number are required")]
    MissingContact,

    #[error("Unknown service: {0}")]
    UnknownService(Uuid),

    #[error("Unknown staff member: {0}")]
    UnknownStaff(Uuid),

    #[error("Unknown patient: {0}")]
    UnknownPatient(Uuid),

    #[error("Duration must be between 1 and 1440 minutes, got {0}")]
    InvalidDuration(u32),

    #[error("The {time} slot on {date} was just taken. Please choose another time.")]
    SlotTaken { date: NaiveDate, time: String },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Appointment not found: {0}")]
    NotFound(Uuid),

    #[error("Duration must be between 1 and 1440 minutes, got {0}")]
    InvalidDuration(u32),

    #[error("Cannot {action} an appointment that is {status}")]
    InvalidTransition {
        action: QuickAction,
        status: AppointmentStatus,
    },

    #[error(transparent)]
    Database(DatabaseError),
}

impl AppointmentError {
    fn from_db(id: Uuid, err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { .. } => Self::NotFound(id),
            other => Self::Database(other),
        }
    }
}

// ─── Inputs ───────────────────────────────────────────────────────────────────

/// Public booking submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub patient: PatientInput,
    pub service_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub notes: Option<String>,
}

/// Staff-side creation for an already registered patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminAppointmentInput {
    pub patient_id: Uuid,
    pub service_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Falls back to the service's duration.
    pub duration_minutes: Option<u32>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

/// Full replacement of an appointment's editable fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentUpdate {
    pub patient_id: Uuid,
    pub service_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_minutes: u32,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BookingOptions {
    /// Re-check the requested slots inside the insert transaction.
    pub enforce_slot_conflicts: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingReceipt {
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub patient_created: bool,
}

// ─── Operations ───────────────────────────────────────────────────────────────

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Duration for a booking: the service's when one is attached, else the default.
fn resolve_duration(conn: &Connection, service_id: Option<Uuid>) -> Result<u32, BookingError> {
    match service_id {
        Some(id) => db::get_service(conn, &id)?
            .map(|s| s.effective_duration())
            .ok_or(BookingError::UnknownService(id)),
        None => Ok(DEFAULT_DURATION_MINUTES),
    }
}

fn check_staff(conn: &Connection, staff_id: Option<Uuid>) -> Result<(), BookingError> {
    if let Some(id) = staff_id {
        if db::get_staff(conn, &id)?.is_none() {
            return Err(BookingError::UnknownStaff(id));
        }
    }
    Ok(())
}

/// Inserts `appt`, optionally re-checking its slots under a write lock so
/// two concurrent bookings of the same slot cannot both commit.
fn commit_appointment(
    conn: &mut Connection,
    appt: &Appointment,
    options: BookingOptions,
) -> Result<(), BookingError> {
    if !options.enforce_slot_conflicts {
        db::insert_appointment(conn, appt)?;
        return Ok(());
    }

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(DatabaseError::from)?;
    let occupied = slots::fetch_occupied_slots(&tx, appt.date, appt.staff_id.as_ref())?;
    if !slots::span_is_free(&occupied, appt.time, appt.duration_minutes) {
        tracing::warn!(date = %appt.date, time = %appt.time, "Booking rejected, slot taken");
        return Err(BookingError::SlotTaken {
            date: appt.date,
            time: db::format_time(appt.time),
        });
    }
    db::insert_appointment(&tx, appt)?;
    tx.commit().map_err(DatabaseError::from)?;
    Ok(())
}

/// Books an appointment from the public form.
///
/// The patient is looked up by phone and created when absent. That step is
/// committed on its own: if the appointment insert then fails, the patient
/// stays and a retry reuses it.
pub fn create_booking(
    conn: &mut Connection,
    request: &BookingRequest,
    options: BookingOptions,
) -> Result<BookingReceipt, BookingError> {
    let input = PatientInput {
        full_name: request.patient.full_name.trim().to_string(),
        phone: request.patient.phone.trim().to_string(),
        email: non_blank(request.patient.email.clone()),
    };
    if input.full_name.is_empty() || input.phone.is_empty() {
        return Err(BookingError::MissingContact);
    }

    let duration_minutes = resolve_duration(conn, request.service_id)?;
    check_staff(conn, request.staff_id)?;

    let (patient, patient_created) = db::find_or_create_patient(conn, &input)?;
    if patient_created {
        tracing::info!(patient_id = %patient.id, "Registered new patient from booking");
    }

    let appt = Appointment {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        service_id: request.service_id,
        staff_id: request.staff_id,
        date: request.date,
        time: request.time,
        duration_minutes,
        status: AppointmentStatus::Pending,
        notes: non_blank(request.notes.clone()),
        created_at: db::now_timestamp(),
    };
    commit_appointment(conn, &appt, options)?;

    tracing::info!(
        appointment_id = %appt.id,
        date = %appt.date,
        time = %appt.time,
        duration = appt.duration_minutes,
        "Appointment booked"
    );
    Ok(BookingReceipt {
        appointment_id: appt.id,
        patient_id: patient.id,
        patient_created,
    })
}

/// Creates an appointment from the back-office dialog.
pub fn create_admin_appointment(
    conn: &mut Connection,
    input: &AdminAppointmentInput,
    options: BookingOptions,
) -> Result<Appointment, BookingError> {
    if db::get_patient(conn, &input.patient_id)?.is_none() {
        return Err(BookingError::UnknownPatient(input.patient_id));
    }
    if let Some(minutes) = input.duration_minutes.filter(|m| *m > MAX_DURATION_MINUTES) {
        return Err(BookingError::InvalidDuration(minutes));
    }
    let service_duration = resolve_duration(conn, input.service_id)?;
    check_staff(conn, input.staff_id)?;

    let appt = Appointment {
        id: Uuid::new_v4(),
        patient_id: input.patient_id,
        service_id: input.service_id,
        staff_id: input.staff_id,
        date: input.date,
        time: input.time,
        duration_minutes: input
            .duration_minutes
            .filter(|m| *m > 0)
            .unwrap_or(service_duration),
        status: input.status.unwrap_or(AppointmentStatus::Pending),
        notes: non_blank(input.notes.clone()),
        created_at: db::now_timestamp(),
    };
    commit_appointment(conn, &appt, options)?;

    tracing::info!(appointment_id = %appt.id, status = %appt.status, "Appointment created by staff");
    Ok(appt)
}

/// Overwrites the status. Any status may be written from any other.
pub fn update_status(
    conn: &Connection,
    id: &Uuid,
    status: AppointmentStatus,
) -> Result<(), AppointmentError> {
    db::update_appointment_status(conn, id, status).map_err(|e| AppointmentError::from_db(*id, e))?;
    tracing::info!(appointment_id = %id, %status, "Appointment status updated");
    Ok(())
}

/// Applies a confirm/cancel shortcut. Only offered, and only accepted, while
/// the appointment is pending.
pub fn apply_quick_action(
    conn: &Connection,
    id: &Uuid,
    action: QuickAction,
) -> Result<AppointmentStatus, AppointmentError> {
    let appt = db::get_appointment(conn, id)
        .map_err(|e| AppointmentError::from_db(*id, e))?
        .ok_or(AppointmentError::NotFound(*id))?;

    let target = action.target_status();
    if !appt.status.quick_actions().contains(&action) || !appt.status.can_transition_to(target) {
        return Err(AppointmentError::InvalidTransition {
            action,
            status: appt.status,
        });
    }

    db::update_appointment_status(conn, id, target).map_err(|e| AppointmentError::from_db(*id, e))?;
    tracing::info!(appointment_id = %id, %action, status = %target, "Quick action applied");
    Ok(target)
}

/// Replaces every editable field. Last writer wins.
pub fn update_appointment(
    conn: &Connection,
    id: &Uuid,
    update: &AppointmentUpdate,
) -> Result<Appointment, AppointmentError> {
    if update.duration_minutes > MAX_DURATION_MINUTES {
        return Err(AppointmentError::InvalidDuration(update.duration_minutes));
    }
    let existing = db::get_appointment(conn, id)
        .map_err(|e| AppointmentError::from_db(*id, e))?
        .ok_or(AppointmentError::NotFound(*id))?;

    let appt = Appointment {
        id: existing.id,
        patient_id: update.patient_id,
        service_id: update.service_id,
        staff_id: update.staff_id,
        date: update.date,
        time: update.time,
        duration_minutes: if update.duration_minutes == 0 {
            DEFAULT_DURATION_MINUTES
        } else {
            update.duration_minutes
        },
        status: update.status,
        notes: non_blank(update.notes.clone()),
        created_at: existing.created_at,
    };
    db::update_appointment(conn, &appt).map_err(|e| AppointmentError::from_db(*id, e))?;
    tracing::info!(appointment_id = %id, "Appointment updated");
    Ok(appt)
}

/// Hard delete.
pub fn delete_appointment(conn: &Connection, id: &Uuid) -> Result<(), AppointmentError> {
    db::delete_appointment(conn, id).map_err(|e| AppointmentError::from_db(*id, e))?;
    tracing::info!(appointment_id = %id, "Appointment deleted");
    Ok(())
}
