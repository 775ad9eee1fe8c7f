//! Slot availability.
//!
//! A slot is a 30-minute interval labelled by its start ("HH:MM"). An
//! appointment occupies every slot that any part of `[start, start+duration)`
//! falls in. Cancelled appointments occupy nothing.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime, Timelike};
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::config::SLOT_MINUTES;
use crate::db::{self, DatabaseError};
use crate::models::DEFAULT_DURATION_MINUTES;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Times offered by the booking form: mornings 08:00–11:30, afternoons
/// 14:00–19:00. Nothing is offered over the midday break.
pub const BOOKING_SLOTS: [&str; 19] = [
    "08:00", "08:30", "09:00", "09:30", "10:00", "10:30", "11:00", "11:30", // morning
    "14:00", "14:30", "15:00", "15:30", "16:00", "16:30", "17:00", "17:30", "18:00", "18:30",
    "19:00",
];

/// Occupied slot labels, sorted.
pub type OccupiedSlots = BTreeSet<String>;

/// "HH:MM" label for a minute offset from midnight.
pub fn slot_label(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

fn minutes_of(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Slot labels covered by one appointment span. Spans are clipped at
/// midnight.
pub fn covered_slots(start: NaiveTime, duration_minutes: u32) -> Vec<String> {
    let duration = if duration_minutes == 0 {
        DEFAULT_DURATION_MINUTES
    } else {
        duration_minutes
    };
    let start = minutes_of(start);
    let end = start.saturating_add(duration).min(MINUTES_PER_DAY);
    let first = start - start % SLOT_MINUTES;

    (first..end)
        .step_by(SLOT_MINUTES as usize)
        .map(slot_label)
        .collect()
}

/// Union of the slots covered by each `(start, duration)` span.
pub fn occupied_slots<I>(spans: I) -> OccupiedSlots
where
    I: IntoIterator<Item = (NaiveTime, u32)>,
{
    spans
        .into_iter()
        .flat_map(|(start, duration)| covered_slots(start, duration))
        .collect()
}

/// Occupied slots for `date`, read from the store.
///
/// `staff_id` narrows the check to one staff member's calendar plus the
/// unassigned bookings. Without it every booking shares one calendar.
pub fn fetch_occupied_slots(
    conn: &Connection,
    date: NaiveDate,
    staff_id: Option<&Uuid>,
) -> Result<OccupiedSlots, DatabaseError> {
    let spans = db::list_slot_occupancy(conn, date, staff_id)?;
    let occupied = occupied_slots(spans);
    tracing::debug!(%date, occupied = occupied.len(), "Computed slot occupancy");
    Ok(occupied)
}

/// Booking-form slots not in `occupied`.
pub fn available_slots(occupied: &OccupiedSlots) -> Vec<&'static str> {
    BOOKING_SLOTS
        .iter()
        .copied()
        .filter(|label| !occupied.contains(*label))
        .collect()
}

/// True when none of the slots a new booking would cover are taken.
pub fn span_is_free(occupied: &OccupiedSlots, start: NaiveTime, duration_minutes: u32) -> bool {
    covered_slots(start, duration_minutes)
        .iter()
        .all(|label| !occupied.contains(label))
}

/// True when `label` is one of the booking-form slots.
pub fn is_booking_slot(label: &str) -> bool {
    BOOKING_SLOTS.contains(&label)
}

/// Availability snapshot for one date as served to the booking form.
#[derive(Debug, Clone, Serialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub staff_id: Option<Uuid>,
    pub occupied: Vec<String>,
    pub available: Vec<String>,
}

pub fn day_availability(
    conn: &Connection,
    date: NaiveDate,
    staff_id: Option<Uuid>,
) -> Result<DayAvailability, DatabaseError> {
    let occupied = fetch_occupied_slots(conn, date, staff_id.as_ref())?;
    let available = available_slots(&occupied)
        .into_iter()
        .map(String::from)
        .collect();
    Ok(DayAvailability {
        date,
        staff_id,
        occupied: occupied.into_iter().collect(),
        available,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::fixtures::*;
    use crate::models::AppointmentStatus;

    fn labels(set: &OccupiedSlots) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    #[test]
    fn forty_five_minutes_covers_two_slots() {
        assert_eq!(covered_slots(time("09:00"), 45), vec!["09:00", "09:30"]);
    }

    #[test]
    fn exact_multiple_does_not_spill() {
        assert_eq!(covered_slots(time("09:00"), 60), vec!["09:00", "09:30"]);
        assert_eq!(covered_slots(time("09:00"), 30), vec!["09:00"]);
    }

    #[test]
    fn zero_duration_defaults_to_one_slot() {
        assert_eq!(covered_slots(time("14:30"), 0), vec!["14:30"]);
    }

    #[test]
    fn unaligned_start_blocks_containing_slot() {
        assert_eq!(covered_slots(time("09:15"), 30), vec!["09:00", "09:30"]);
        assert_eq!(covered_slots(time("09:10"), 10), vec!["09:00"]);
    }

    #[test]
    fn ninety_minute_treatment() {
        assert_eq!(
            covered_slots(time("10:00"), 90),
            vec!["10:00", "10:30", "11:00"]
        );
    }

    #[test]
    fn span_is_clipped_at_midnight() {
        assert_eq!(covered_slots(time("23:00"), 120), vec!["23:00", "23:30"]);
        assert_eq!(covered_slots(time("23:30"), u32::MAX), vec!["23:30"]);
    }

    #[test]
    fn union_has_set_semantics() {
        let occupied = occupied_slots([(time("09:00"), 60), (time("09:30"), 30), (time("15:00"), 30)]);
        assert_eq!(labels(&occupied), vec!["09:00", "09:30", "15:00"]);
    }

    #[test]
    fn booking_grid_skips_midday_break() {
        assert_eq!(BOOKING_SLOTS.first(), Some(&"08:00"));
        assert_eq!(BOOKING_SLOTS.last(), Some(&"19:00"));
        assert!(!is_booking_slot("12:00"));
        assert!(!is_booking_slot("13:30"));
        assert!(is_booking_slot("11:30"));
        assert!(is_booking_slot("14:00"));
    }

    #[test]
    fn available_is_grid_minus_occupied() {
        let occupied = occupied_slots([(time("08:00"), 60)]);
        let available = available_slots(&occupied);
        assert_eq!(available.len(), BOOKING_SLOTS.len() - 2);
        assert_eq!(available[0], "09:00");
    }

    #[test]
    fn span_free_check() {
        let occupied = occupied_slots([(time("10:00"), 30)]);
        assert!(span_is_free(&occupied, time("09:00"), 60));
        assert!(!span_is_free(&occupied, time("09:30"), 45));
        assert!(!span_is_free(&occupied, time("10:00"), 30));
    }

    #[test]
    fn teeth_cleaning_at_nine_occupies_two_slots() {
        let conn = open_memory_database().unwrap();
        let patient = make_patient(&conn, "Aline", "0788000000");
        make_appointment(&conn, patient.id, "2026-03-02", "09:00", 45, AppointmentStatus::Pending);

        let occupied = fetch_occupied_slots(&conn, date("2026-03-02"), None).unwrap();
        assert_eq!(labels(&occupied), vec!["09:00", "09:30"]);
    }

    #[test]
    fn oversized_stored_duration_blocks_rest_of_day() {
        let conn = open_memory_database().unwrap();
        let patient = make_patient(&conn, "Aline", "0788000000");
        make_appointment(&conn, patient.id, "2026-03-02", "09:00", u32::MAX, AppointmentStatus::Confirmed);

        let occupied = fetch_occupied_slots(&conn, date("2026-03-02"), None).unwrap();
        assert_eq!(occupied.len(), 30);
        assert_eq!(occupied.first().map(String::as_str), Some("09:00"));
        assert_eq!(occupied.last().map(String::as_str), Some("23:30"));
        assert_eq!(available_slots(&occupied), vec!["08:00", "08:30"]);
    }

    #[test]
    fn cancelled_twin_does_not_count() {
        let conn = open_memory_database().unwrap();
        let patient = make_patient(&conn, "Aline", "0788000000");
        make_appointment(&conn, patient.id, "2026-03-02", "08:00", 30, AppointmentStatus::Confirmed);
        make_appointment(&conn, patient.id, "2026-03-02", "08:00", 30, AppointmentStatus::Cancelled);

        let occupied = fetch_occupied_slots(&conn, date("2026-03-02"), None).unwrap();
        assert_eq!(labels(&occupied), vec!["08:00"]);
    }

    #[test]
    fn cancellation_frees_slots() {
        let conn = open_memory_database().unwrap();
        let patient = make_patient(&conn, "Aline", "0788000000");
        let appt =
            make_appointment(&conn, patient.id, "2026-03-02", "10:00", 30, AppointmentStatus::Confirmed);
        assert!(!fetch_occupied_slots(&conn, date("2026-03-02"), None).unwrap().is_empty());

        db::update_appointment_status(&conn, &appt.id, AppointmentStatus::Cancelled).unwrap();
        assert!(fetch_occupied_slots(&conn, date("2026-03-02"), None).unwrap().is_empty());
    }

    #[test]
    fn other_dates_are_ignored() {
        let conn = open_memory_database().unwrap();
        let patient = make_patient(&conn, "Aline", "0788000000");
        make_appointment(&conn, patient.id, "2026-03-03", "10:00", 30, AppointmentStatus::Pending);

        let availability = day_availability(&conn, date("2026-03-02"), None).unwrap();
        assert!(availability.occupied.is_empty());
        assert_eq!(availability.available.len(), BOOKING_SLOTS.len());
    }
}
