use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{ChangeRequestStatus, ChangeRequestType};

/// Patient-initiated reschedule/cancel request. Advisory only: staff act on
/// the appointment separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_account_id: Uuid,
    pub request_type: ChangeRequestType,
    pub reason: String,
    pub requested_date: Option<NaiveDate>,
    pub requested_time: Option<NaiveTime>,
    pub status: ChangeRequestStatus,
    pub created_at: NaiveDateTime,
}
