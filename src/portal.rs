//! Patient self-service: account registration, appointment history and
//! reschedule/cancel requests.
//!
//! Requests are advisory. Staff read them and act on the appointment
//! through the normal lifecycle operations.

use chrono::{NaiveDate, NaiveTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, repository::now_timestamp, DatabaseError};
use crate::identity::{self, IdentityError};
use crate::models::*;

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Patient name and phone number are required")]
    MissingContact,

    #[error("No patient account is linked to this login")]
    NoPatientAccount,

    #[error("Appointment not found: {0}")]
    AppointmentNotFound(Uuid),

    #[error("Please give a reason for your request")]
    MissingReason,

    #[error("A reschedule request needs a preferred date and time")]
    MissingRequestedSlot,

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

// ─── Registration ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct PortalRegistration {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisteredAccount {
    pub user: User,
    pub account: PatientAccount,
    pub patient: Patient,
    /// False when the phone matched a patient already on file.
    pub patient_created: bool,
}

/// Creates the login, finds or creates the patient by phone, then links them.
/// Runs in one transaction so a failure leaves no half-registered account.
pub fn register_patient_account(
    conn: &mut Connection,
    input: &PortalRegistration,
) -> Result<RegisteredAccount, PortalError> {
    let full_name = input.full_name.trim();
    let phone = input.phone.trim();
    if full_name.is_empty() || phone.is_empty() {
        return Err(PortalError::MissingContact);
    }

    let tx = conn.transaction().map_err(DatabaseError::from)?;
    let user = identity::register_user(&tx, &input.email, full_name, &input.password)?;
    let (patient, patient_created) = db::find_or_create_patient(
        &tx,
        &PatientInput {
            full_name: full_name.to_string(),
            phone: phone.to_string(),
            email: Some(user.email.clone()),
        },
    )?;
    let account = db::insert_patient_account(&tx, &user.id, &patient.id)?;
    tx.commit().map_err(DatabaseError::from)?;

    tracing::info!(
        user_id = %user.id,
        patient_id = %patient.id,
        patient_created,
        "Patient account registered"
    );
    Ok(RegisteredAccount {
        user,
        account,
        patient,
        patient_created,
    })
}

pub fn account_for_user(conn: &Connection, user_id: &Uuid) -> Result<PatientAccount, PortalError> {
    db::find_patient_account_by_user(conn, user_id)?.ok_or(PortalError::NoPatientAccount)
}

// ─── Appointments ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct PatientAppointment {
    pub id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub service: String,
    pub staff: String,
    pub notes: Option<String>,
}

impl From<&AppointmentView> for PatientAppointment {
    fn from(view: &AppointmentView) -> Self {
        Self {
            id: view.appointment.id,
            date: view.appointment.date,
            time: view.appointment.time,
            status: view.appointment.status,
            service: view.service_label().to_string(),
            staff: view.staff_label_for_patient().to_string(),
            notes: view.appointment.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MyAppointments {
    pub upcoming: Vec<PatientAppointment>,
    pub past: Vec<PatientAppointment>,
}

/// Upcoming means dated today or later and not cancelled. Everything else,
/// cancelled bookings included, is past. Both lists are newest first.
pub fn my_appointments(
    conn: &Connection,
    account: &PatientAccount,
    today: NaiveDate,
) -> Result<MyAppointments, PortalError> {
    let filter = AppointmentFilter {
        patient_id: Some(account.patient_id),
        ..AppointmentFilter::default()
    };
    let mut views = db::list_appointment_views(conn, &filter)?;
    views.reverse();

    let (upcoming, past): (Vec<_>, Vec<_>) = views.iter().partition(|v| {
        v.appointment.date >= today && v.appointment.status != AppointmentStatus::Cancelled
    });
    Ok(MyAppointments {
        upcoming: upcoming.into_iter().map(PatientAppointment::from).collect(),
        past: past.into_iter().map(PatientAppointment::from).collect(),
    })
}

// ─── Change requests ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeRequestInput {
    pub appointment_id: Uuid,
    pub request_type: ChangeRequestType,
    pub reason: String,
    pub requested_date: Option<NaiveDate>,
    pub requested_time: Option<NaiveTime>,
}

/// Files a reschedule or cancel request against one of the account's own
/// appointments. Someone else's appointment reads as not found.
pub fn file_change_request(
    conn: &Connection,
    account: &PatientAccount,
    input: &ChangeRequestInput,
) -> Result<ChangeRequest, PortalError> {
    let reason = input.reason.trim();
    if reason.is_empty() {
        return Err(PortalError::MissingReason);
    }

    let appointment = db::get_appointment(conn, &input.appointment_id)?
        .filter(|a| a.patient_id == account.patient_id)
        .ok_or(PortalError::AppointmentNotFound(input.appointment_id))?;

    let (requested_date, requested_time) = match input.request_type {
        ChangeRequestType::Reschedule => match (input.requested_date, input.requested_time) {
            (Some(d), Some(t)) => (Some(d), Some(t)),
            _ => return Err(PortalError::MissingRequestedSlot),
        },
        ChangeRequestType::Cancel => (None, None),
    };

    let request = ChangeRequest {
        id: Uuid::new_v4(),
        appointment_id: appointment.id,
        patient_account_id: account.id,
        request_type: input.request_type,
        reason: reason.to_string(),
        requested_date,
        requested_time,
        status: ChangeRequestStatus::Pending,
        created_at: now_timestamp(),
    };
    db::insert_change_request(conn, &request)?;
    tracing::info!(
        request_id = %request.id,
        appointment_id = %appointment.id,
        kind = %request.request_type,
        "Change request filed"
    );
    Ok(request)
}

pub fn my_change_requests(
    conn: &Connection,
    account: &PatientAccount,
) -> Result<Vec<ChangeRequest>, PortalError> {
    Ok(db::list_change_requests_for_account(conn, &account.id)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::fixtures::*;

    fn registration(email: &str, phone: &str) -> PortalRegistration {
        PortalRegistration {
            email: email.into(),
            password: "password123".into(),
            full_name: "Aline Mukamana".into(),
            phone: phone.into(),
        }
    }

    #[test]
    fn registration_links_existing_patient_by_phone() {
        let mut conn = open_memory_database().unwrap();
        let walk_in = make_patient(&conn, "Aline M.", "0788111222");

        let registered =
            register_patient_account(&mut conn, &registration("aline@example.com", "0788111222"))
                .unwrap();
        assert!(!registered.patient_created);
        assert_eq!(registered.patient.id, walk_in.id);
        assert_eq!(registered.account.patient_id, walk_in.id);
    }

    #[test]
    fn registration_creates_patient_when_phone_is_new() {
        let mut conn = open_memory_database().unwrap();
        let registered =
            register_patient_account(&mut conn, &registration("new@example.com", "0788999000"))
                .unwrap();
        assert!(registered.patient_created);
        assert_eq!(registered.patient.email.as_deref(), Some("new@example.com"));
        assert_eq!(db::count_patients(&conn).unwrap(), 1);
    }

    #[test]
    fn failed_registration_leaves_nothing_behind() {
        let mut conn = open_memory_database().unwrap();
        register_patient_account(&mut conn, &registration("dup@example.com", "0788000001")).unwrap();

        let err =
            register_patient_account(&mut conn, &registration("dup@example.com", "0788000002"))
                .unwrap_err();
        assert!(matches!(err, PortalError::Identity(_)));
        assert!(db::find_patient_by_phone(&conn, "0788000002").unwrap().is_none());
    }

    #[test]
    fn registration_requires_contact() {
        let mut conn = open_memory_database().unwrap();
        let err = register_patient_account(&mut conn, &registration("x@example.com", "  "))
            .unwrap_err();
        assert!(matches!(err, PortalError::MissingContact));
    }

    #[test]
    fn appointments_split_upcoming_and_past() {
        let mut conn = open_memory_database().unwrap();
        let registered =
            register_patient_account(&mut conn, &registration("a@example.com", "0788000000"))
                .unwrap();
        let pid = registered.patient.id;
        make_appointment(&conn, pid, "2026-03-01", "09:00", 30, AppointmentStatus::Completed);
        make_appointment(&conn, pid, "2026-03-10", "09:00", 30, AppointmentStatus::Pending);
        make_appointment(&conn, pid, "2026-03-12", "10:00", 30, AppointmentStatus::Cancelled);
        make_appointment(&conn, pid, "2026-03-05", "11:00", 30, AppointmentStatus::Confirmed);

        let mine = my_appointments(&conn, &registered.account, date("2026-03-05")).unwrap();
        let upcoming: Vec<_> = mine.upcoming.iter().map(|a| a.date).collect();
        assert_eq!(upcoming, vec![date("2026-03-10"), date("2026-03-05")]);
        assert_eq!(mine.past.len(), 2);
        assert!(mine.past.iter().any(|a| a.status == AppointmentStatus::Cancelled));
        assert_eq!(mine.upcoming[0].staff, "Any Available");
        assert_eq!(mine.upcoming[0].service, "General Appointment");
    }

    #[test]
    fn reschedule_needs_date_and_time() {
        let mut conn = open_memory_database().unwrap();
        let registered =
            register_patient_account(&mut conn, &registration("a@example.com", "0788000000"))
                .unwrap();
        let appt = make_appointment(
            &conn,
            registered.patient.id,
            "2026-03-10",
            "09:00",
            30,
            AppointmentStatus::Pending,
        );

        let mut input = ChangeRequestInput {
            appointment_id: appt.id,
            request_type: ChangeRequestType::Reschedule,
            reason: "Travelling".into(),
            requested_date: Some(date("2026-03-12")),
            requested_time: None,
        };
        assert!(matches!(
            file_change_request(&conn, &registered.account, &input),
            Err(PortalError::MissingRequestedSlot)
        ));

        input.requested_time = Some(time("14:00"));
        let request = file_change_request(&conn, &registered.account, &input).unwrap();
        assert_eq!(request.status, ChangeRequestStatus::Pending);
        assert_eq!(my_change_requests(&conn, &registered.account).unwrap().len(), 1);
    }

    #[test]
    fn cancel_request_drops_requested_slot_and_needs_reason() {
        let mut conn = open_memory_database().unwrap();
        let registered =
            register_patient_account(&mut conn, &registration("a@example.com", "0788000000"))
                .unwrap();
        let appt = make_appointment(
            &conn,
            registered.patient.id,
            "2026-03-10",
            "09:00",
            30,
            AppointmentStatus::Pending,
        );

        let mut input = ChangeRequestInput {
            appointment_id: appt.id,
            request_type: ChangeRequestType::Cancel,
            reason: "   ".into(),
            requested_date: Some(date("2026-03-12")),
            requested_time: Some(time("14:00")),
        };
        assert!(matches!(
            file_change_request(&conn, &registered.account, &input),
            Err(PortalError::MissingReason)
        ));

        input.reason = "Feeling better".into();
        let request = file_change_request(&conn, &registered.account, &input).unwrap();
        assert_eq!(request.requested_date, None);
        assert_eq!(request.requested_time, None);
    }

    #[test]
    fn cannot_file_against_someone_elses_appointment() {
        let mut conn = open_memory_database().unwrap();
        let registered =
            register_patient_account(&mut conn, &registration("a@example.com", "0788000000"))
                .unwrap();
        let stranger = make_patient(&conn, "Someone Else", "0788555555");
        let theirs =
            make_appointment(&conn, stranger.id, "2026-03-10", "09:00", 30, AppointmentStatus::Pending);

        let input = ChangeRequestInput {
            appointment_id: theirs.id,
            request_type: ChangeRequestType::Cancel,
            reason: "Mine now".into(),
            requested_date: None,
            requested_time: None,
        };
        assert!(matches!(
            file_change_request(&conn, &registered.account, &input),
            Err(PortalError::AppointmentNotFound(_))
        ));
    }

    #[test]
    fn login_without_account_has_no_portal() {
        let conn = open_memory_database().unwrap();
        let user = identity::register_user(&conn, "staff@clinic.rw", "Staff", "password123").unwrap();
        assert!(matches!(
            account_for_user(&conn, &user.id),
            Err(PortalError::NoPatientAccount)
        ));
    }
}
