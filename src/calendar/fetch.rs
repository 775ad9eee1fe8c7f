use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;
use uuid::Uuid;

use super::grouping::{day_column, filter_by_staff, group_by_date, group_by_hour, month_cell};
use super::types::*;
use super::window::{data_window, grid_window, title};
use crate::db::{self, DatabaseError};
use crate::models::AppointmentFilter;

/// Loads and lays out one calendar page.
///
/// `staff_id` restricts the page to appointments assigned to that staff
/// member. Grouping happens after the filter.
pub fn load_calendar(
    conn: &Connection,
    view: CalendarView,
    anchor: NaiveDate,
    staff_id: Option<Uuid>,
    today: NaiveDate,
) -> Result<CalendarSnapshot, DatabaseError> {
    let window = data_window(view, anchor);
    let grid = grid_window(view, anchor);

    let filter = AppointmentFilter::for_range(window.start, window.end);
    let appointments = filter_by_staff(db::list_appointment_views(conn, &filter)?, staff_id);
    let total = appointments.len();

    let body = match view {
        CalendarView::Day => {
            let by_hour = group_by_hour(&appointments);
            CalendarBody::Day {
                column: day_column(anchor, today, &by_hour),
            }
        }
        CalendarView::Week => {
            let by_hour = group_by_hour(&appointments);
            CalendarBody::Week {
                columns: grid.days().map(|d| day_column(d, today, &by_hour)).collect(),
            }
        }
        CalendarView::Month => {
            let by_date = group_by_date(&appointments);
            let anchor_month = (anchor.year(), anchor.month());
            let cells: Vec<MonthCell> = grid
                .days()
                .map(|d| month_cell(d, anchor_month, today, &by_date))
                .collect();
            CalendarBody::Month {
                weeks: cells.chunks(7).map(<[MonthCell]>::to_vec).collect(),
            }
        }
    };

    tracing::debug!(view = view.as_str(), %anchor, total, "Calendar loaded");
    Ok(CalendarSnapshot {
        anchor,
        title: title(view, anchor),
        window,
        grid,
        total,
        body,
    })
}
