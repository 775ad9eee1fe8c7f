//! Calendar views over the appointment book.
//!
//! Day, week (Monday–Sunday) and month pages. Month pages load the calendar
//! month but draw whole weeks, so leading and trailing cells belong to the
//! neighbouring months and stay empty. Read-only.

mod fetch;
mod grouping;
mod types;
mod window;

pub use fetch::*;
pub use grouping::{filter_by_staff, group_by_date, group_by_hour, hour_label};
pub use types::*;
pub use window::*;

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::fixtures::*;
    use crate::db::update_appointment;
    use crate::models::AppointmentStatus;

    #[test]
    fn week_window_is_monday_to_sunday() {
        // 2026-03-05 is a Thursday
        let w = data_window(CalendarView::Week, date("2026-03-05"));
        assert_eq!(w.start, date("2026-03-02"));
        assert_eq!(w.end, date("2026-03-08"));

        // Sunday belongs to the week that started the Monday before
        let w = data_window(CalendarView::Week, date("2026-03-08"));
        assert_eq!(w.start, date("2026-03-02"));
    }

    #[test]
    fn day_window_is_anchor_only() {
        let w = data_window(CalendarView::Day, date("2026-03-05"));
        assert_eq!(w.start, w.end);
        assert_eq!(w.days().count(), 1);
    }

    #[test]
    fn month_grid_pads_to_whole_weeks() {
        // March 2026 starts on a Sunday and ends on a Tuesday
        let data = data_window(CalendarView::Month, date("2026-03-17"));
        assert_eq!(data.start, date("2026-03-01"));
        assert_eq!(data.end, date("2026-03-31"));

        let grid = grid_window(CalendarView::Month, date("2026-03-17"));
        assert_eq!(grid.start, date("2026-02-23"));
        assert_eq!(grid.end, date("2026-04-05"));
        assert_eq!(grid.days().count() % 7, 0);
    }

    #[test]
    fn month_already_on_week_boundaries_has_no_padding() {
        // February 2027 runs Monday 1st to Sunday 28th
        let grid = grid_window(CalendarView::Month, date("2027-02-10"));
        assert_eq!(grid.start, date("2027-02-01"));
        assert_eq!(grid.end, date("2027-02-28"));
    }

    #[test]
    fn navigation_steps_by_view_unit() {
        let day = CalendarCursor::new(CalendarView::Day, date("2026-03-31"));
        assert_eq!(day.next().anchor, date("2026-04-01"));
        assert_eq!(day.previous().anchor, date("2026-03-30"));

        let week = day.with_view(CalendarView::Week);
        assert_eq!(week.anchor, date("2026-03-31"));
        assert_eq!(week.next().anchor, date("2026-04-07"));

        let month = CalendarCursor::new(CalendarView::Month, date("2026-01-31"));
        assert_eq!(month.next().anchor, date("2026-02-28"));
        assert_eq!(month.previous().anchor, date("2025-12-31"));

        let reset = month.today(date("2026-10-17"));
        assert_eq!(reset.anchor, date("2026-10-17"));
        assert_eq!(reset.view, CalendarView::Month);
    }

    #[test]
    fn titles_follow_view() {
        assert_eq!(title(CalendarView::Day, date("2026-03-05")), "Thursday, March 5, 2026");
        assert_eq!(
            title(CalendarView::Week, date("2026-03-05")),
            "Week of Mar 2 - Mar 8, 2026"
        );
        assert_eq!(title(CalendarView::Month, date("2026-03-05")), "March 2026");
    }

    #[test]
    fn view_parses_from_query_value() {
        assert_eq!("week".parse::<CalendarView>().unwrap(), CalendarView::Week);
        assert!("year".parse::<CalendarView>().is_err());
    }

    #[test]
    fn day_view_buckets_by_start_hour() {
        let conn = open_memory_database().unwrap();
        let patient = make_patient(&conn, "Aline", "0788000000");
        make_appointment(&conn, patient.id, "2026-03-05", "09:30", 30, AppointmentStatus::Pending);
        make_appointment(&conn, patient.id, "2026-03-05", "09:00", 30, AppointmentStatus::Confirmed);
        make_appointment(&conn, patient.id, "2026-03-05", "14:00", 30, AppointmentStatus::Pending);
        make_appointment(&conn, patient.id, "2026-03-06", "09:00", 30, AppointmentStatus::Pending);

        let snapshot = load_calendar(&conn, CalendarView::Day, date("2026-03-05"), None, date("2026-03-05"))
            .unwrap();
        assert_eq!(snapshot.total, 3);
        let CalendarBody::Day { column } = snapshot.body else {
            panic!("expected day body");
        };
        assert!(column.is_today);
        assert_eq!(column.rows.len(), 13);
        assert_eq!(column.rows[0].label, "08:00");
        assert_eq!(column.rows[12].label, "20:00");

        let nine = &column.rows[1];
        assert_eq!(nine.hour, 9);
        let times: Vec<_> = nine.appointments.iter().map(|a| a.appointment.time).collect();
        assert_eq!(times, vec![time("09:00"), time("09:30")]);
        assert_eq!(column.rows[6].appointments.len(), 1);
    }

    #[test]
    fn early_appointments_are_kept_outside_hour_rows() {
        let conn = open_memory_database().unwrap();
        let patient = make_patient(&conn, "Aline", "0788000000");
        make_appointment(&conn, patient.id, "2026-03-05", "07:30", 30, AppointmentStatus::Pending);

        let snapshot =
            load_calendar(&conn, CalendarView::Day, date("2026-03-05"), None, date("2026-03-01")).unwrap();
        let CalendarBody::Day { column } = snapshot.body else {
            panic!("expected day body");
        };
        assert!(column.rows.iter().all(|r| r.appointments.is_empty()));
        assert_eq!(column.outside_hours.len(), 1);
    }

    #[test]
    fn week_view_has_seven_columns() {
        let conn = open_memory_database().unwrap();
        let patient = make_patient(&conn, "Aline", "0788000000");
        make_appointment(&conn, patient.id, "2026-03-08", "10:00", 30, AppointmentStatus::Pending);
        make_appointment(&conn, patient.id, "2026-03-09", "10:00", 30, AppointmentStatus::Pending);

        let snapshot =
            load_calendar(&conn, CalendarView::Week, date("2026-03-04"), None, date("2026-03-04")).unwrap();
        assert_eq!(snapshot.total, 1);
        let CalendarBody::Week { columns } = snapshot.body else {
            panic!("expected week body");
        };
        assert_eq!(columns.len(), 7);
        assert_eq!(columns[0].date, date("2026-03-02"));
        assert!(columns[2].is_today);
        assert_eq!(columns[6].rows[2].appointments.len(), 1);
    }

    #[test]
    fn month_cells_cap_listing_and_flag_neighbours() {
        let conn = open_memory_database().unwrap();
        let patient = make_patient(&conn, "Aline", "0788000000");
        for at in ["08:00", "09:00", "10:00", "11:00", "14:00"] {
            make_appointment(&conn, patient.id, "2026-03-10", at, 30, AppointmentStatus::Pending);
        }
        // Outside the month: not loaded even though the grid shows the day
        make_appointment(&conn, patient.id, "2026-04-02", "09:00", 30, AppointmentStatus::Pending);

        let snapshot =
            load_calendar(&conn, CalendarView::Month, date("2026-03-10"), None, date("2026-03-10")).unwrap();
        assert_eq!(snapshot.total, 5);
        let CalendarBody::Month { weeks } = snapshot.body else {
            panic!("expected month body");
        };
        assert_eq!(weeks.len(), 6);
        assert!(weeks.iter().all(|w| w.len() == 7));

        let first = &weeks[0][0];
        assert_eq!(first.date, date("2026-02-23"));
        assert!(!first.in_current_month);

        let busy = weeks
            .iter()
            .flatten()
            .find(|c| c.date == date("2026-03-10"))
            .unwrap();
        assert!(busy.is_today);
        assert!(busy.in_current_month);
        assert_eq!(busy.appointments.len(), 3);
        assert_eq!(busy.overflow, 2);

        let april = weeks.last().unwrap().iter().find(|c| c.date == date("2026-04-02")).unwrap();
        assert!(april.appointments.is_empty());
    }

    #[test]
    fn staff_filter_applies_before_grouping() {
        let conn = open_memory_database().unwrap();
        let patient = make_patient(&conn, "Aline", "0788000000");
        let staff = make_staff(&conn, "Dr. Samuel");
        let mut mine =
            make_appointment(&conn, patient.id, "2026-03-05", "09:00", 30, AppointmentStatus::Pending);
        mine.staff_id = Some(staff.id);
        update_appointment(&conn, &mine).unwrap();
        make_appointment(&conn, patient.id, "2026-03-05", "09:30", 30, AppointmentStatus::Pending);

        let all =
            load_calendar(&conn, CalendarView::Day, date("2026-03-05"), None, date("2026-03-05")).unwrap();
        assert_eq!(all.total, 2);

        let scoped = load_calendar(
            &conn,
            CalendarView::Day,
            date("2026-03-05"),
            Some(staff.id),
            date("2026-03-05"),
        )
        .unwrap();
        assert_eq!(scoped.total, 1);
        let CalendarBody::Day { column } = scoped.body else {
            panic!("expected day body");
        };
        assert_eq!(column.rows[1].appointments[0].appointment.id, mine.id);
    }
}
