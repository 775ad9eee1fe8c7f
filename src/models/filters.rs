use chrono::NaiveDate;
use uuid::Uuid;

use super::enums::AppointmentStatus;

/// Inclusive date window plus optional staff scope for appointment listing.
#[derive(Debug, Default, Clone)]
pub struct AppointmentFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub staff_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    /// Case-insensitive match on patient name or service name.
    pub search: Option<String>,
}

impl AppointmentFilter {
    pub fn for_range(date_from: NaiveDate, date_to: NaiveDate) -> Self {
        Self {
            date_from: Some(date_from),
            date_to: Some(date_to),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct PatientFilter {
    pub search: Option<String>,
}
