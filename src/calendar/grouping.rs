use std::collections::BTreeMap;

use chrono::{NaiveDate, Timelike};
use uuid::Uuid;

use super::types::*;
use crate::models::AppointmentView;

/// Keeps only appointments assigned to `staff_id`. `None` keeps everything.
pub fn filter_by_staff(appointments: Vec<AppointmentView>, staff_id: Option<Uuid>) -> Vec<AppointmentView> {
    match staff_id {
        Some(id) => appointments
            .into_iter()
            .filter(|a| a.appointment.staff_id == Some(id))
            .collect(),
        None => appointments,
    }
}

pub fn group_by_date(appointments: &[AppointmentView]) -> BTreeMap<NaiveDate, Vec<AppointmentView>> {
    let mut groups: BTreeMap<NaiveDate, Vec<AppointmentView>> = BTreeMap::new();
    for appt in appointments {
        groups
            .entry(appt.appointment.date)
            .or_default()
            .push(appt.clone());
    }
    for day in groups.values_mut() {
        day.sort_by_key(|a| a.appointment.time);
    }
    groups
}

/// Buckets by date and start hour (09:45 lands in the 9 o'clock bucket).
pub fn group_by_hour(
    appointments: &[AppointmentView],
) -> BTreeMap<(NaiveDate, u32), Vec<AppointmentView>> {
    let mut groups: BTreeMap<(NaiveDate, u32), Vec<AppointmentView>> = BTreeMap::new();
    for appt in appointments {
        groups
            .entry((appt.appointment.date, appt.appointment.time.hour()))
            .or_default()
            .push(appt.clone());
    }
    for bucket in groups.values_mut() {
        bucket.sort_by_key(|a| a.appointment.time);
    }
    groups
}

pub fn hour_label(hour: u32) -> String {
    format!("{hour:02}:00")
}

pub(crate) fn day_column(
    date: NaiveDate,
    today: NaiveDate,
    by_hour: &BTreeMap<(NaiveDate, u32), Vec<AppointmentView>>,
) -> DayColumn {
    let rows = (FIRST_HOUR_ROW..=LAST_HOUR_ROW)
        .map(|hour| HourRow {
            hour,
            label: hour_label(hour),
            appointments: by_hour.get(&(date, hour)).cloned().unwrap_or_default(),
        })
        .collect();
    let outside_hours = by_hour
        .range((date, 0)..=(date, 23))
        .filter(|((_, hour), _)| !(FIRST_HOUR_ROW..=LAST_HOUR_ROW).contains(hour))
        .flat_map(|(_, appts)| appts.iter().cloned())
        .collect();

    DayColumn {
        date,
        is_today: date == today,
        rows,
        outside_hours,
    }
}

pub(crate) fn month_cell(
    date: NaiveDate,
    anchor_month: (i32, u32),
    today: NaiveDate,
    by_date: &BTreeMap<NaiveDate, Vec<AppointmentView>>,
) -> MonthCell {
    use chrono::Datelike;

    let day = by_date.get(&date).map(Vec::as_slice).unwrap_or_default();
    MonthCell {
        date,
        in_current_month: (date.year(), date.month()) == anchor_month,
        is_today: date == today,
        appointments: day.iter().take(MONTH_CELL_LIMIT).cloned().collect(),
        overflow: day.len().saturating_sub(MONTH_CELL_LIMIT),
    }
}
