use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AppointmentStatus, QuickAction};

/// Shown when an appointment has no assigned staff member (admin views).
pub const UNASSIGNED_STAFF_LABEL: &str = "Unassigned";
/// Shown when a booking leaves the staff choice open (patient-facing views).
pub const ANY_AVAILABLE_STAFF_LABEL: &str = "Any Available";
/// Shown when the joined patient row is missing from a projection.
pub const MISSING_PATIENT_LABEL: &str = "N/A";
/// Shown when no service is attached.
pub const NO_SERVICE_LABEL: &str = "General Appointment";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub service_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_minutes: u32,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Appointment {
    /// Minutes since midnight of the start time.
    pub fn start_minutes(&self) -> u32 {
        self.time.hour() * 60 + self.time.minute()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSummary {
    pub id: Uuid,
    pub name: String,
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffSummary {
    pub id: Uuid,
    pub full_name: String,
    pub specialization: Option<String>,
}

/// Appointment with its joined patient/service/staff rows. Each join may be
/// absent (nullable reference or dangling row) and is modelled as `Option`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient: Option<PatientSummary>,
    pub service: Option<ServiceSummary>,
    pub staff: Option<StaffSummary>,
}

impl AppointmentView {
    pub fn patient_label(&self) -> &str {
        self.patient
            .as_ref()
            .map(|p| p.full_name.as_str())
            .unwrap_or(MISSING_PATIENT_LABEL)
    }

    pub fn service_label(&self) -> &str {
        self.service
            .as_ref()
            .map(|s| s.name.as_str())
            .unwrap_or(NO_SERVICE_LABEL)
    }

    /// Staff label for back-office screens.
    pub fn staff_label(&self) -> &str {
        self.staff
            .as_ref()
            .map(|s| s.full_name.as_str())
            .unwrap_or(UNASSIGNED_STAFF_LABEL)
    }

    /// Staff label for the patient portal.
    pub fn staff_label_for_patient(&self) -> &str {
        self.staff
            .as_ref()
            .map(|s| s.full_name.as_str())
            .unwrap_or(ANY_AVAILABLE_STAFF_LABEL)
    }

    pub fn quick_actions(&self) -> &'static [QuickAction] {
        self.appointment.status.quick_actions()
    }

    /// Case-insensitive search over patient name and service name.
    pub fn matches_search(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let in_patient = self
            .patient
            .as_ref()
            .is_some_and(|p| p.full_name.to_lowercase().contains(&needle));
        let in_service = self
            .service
            .as_ref()
            .is_some_and(|s| s.name.to_lowercase().contains(&needle));
        in_patient || in_service
    }
}
