use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;

use super::types::{CalendarView, DateWindow};

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

/// Sunday of the week containing `date`.
pub fn week_end(date: NaiveDate) -> NaiveDate {
    let monday = week_start(date);
    monday.checked_add_days(Days::new(6)).unwrap_or(monday)
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn month_end(date: NaiveDate) -> NaiveDate {
    let first = month_start(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// Dates whose appointments a view shows.
pub fn data_window(view: CalendarView, anchor: NaiveDate) -> DateWindow {
    match view {
        CalendarView::Day => DateWindow {
            start: anchor,
            end: anchor,
        },
        CalendarView::Week => DateWindow {
            start: week_start(anchor),
            end: week_end(anchor),
        },
        CalendarView::Month => DateWindow {
            start: month_start(anchor),
            end: month_end(anchor),
        },
    }
}

/// Dates a view draws. Month grids are padded to whole Monday–Sunday weeks.
pub fn grid_window(view: CalendarView, anchor: NaiveDate) -> DateWindow {
    match view {
        CalendarView::Month => DateWindow {
            start: week_start(month_start(anchor)),
            end: week_end(month_end(anchor)),
        },
        other => data_window(other, anchor),
    }
}

pub fn title(view: CalendarView, anchor: NaiveDate) -> String {
    match view {
        CalendarView::Day => anchor.format("%A, %B %-d, %Y").to_string(),
        CalendarView::Week => format!(
            "Week of {} - {}",
            week_start(anchor).format("%b %-d"),
            week_end(anchor).format("%b %-d, %Y")
        ),
        CalendarView::Month => anchor.format("%B %Y").to_string(),
    }
}

/// View mode plus anchor date, with the page's navigation controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarCursor {
    pub view: CalendarView,
    pub anchor: NaiveDate,
}

impl CalendarCursor {
    pub fn new(view: CalendarView, anchor: NaiveDate) -> Self {
        Self { view, anchor }
    }

    /// One day, week or month forward.
    pub fn next(self) -> Self {
        let anchor = match self.view {
            CalendarView::Day => self.anchor.checked_add_days(Days::new(1)),
            CalendarView::Week => self.anchor.checked_add_days(Days::new(7)),
            CalendarView::Month => self.anchor.checked_add_months(Months::new(1)),
        };
        Self {
            anchor: anchor.unwrap_or(self.anchor),
            ..self
        }
    }

    pub fn previous(self) -> Self {
        let anchor = match self.view {
            CalendarView::Day => self.anchor.checked_sub_days(Days::new(1)),
            CalendarView::Week => self.anchor.checked_sub_days(Days::new(7)),
            CalendarView::Month => self.anchor.checked_sub_months(Months::new(1)),
        };
        Self {
            anchor: anchor.unwrap_or(self.anchor),
            ..self
        }
    }

    pub fn today(self, today: NaiveDate) -> Self {
        Self {
            anchor: today,
            ..self
        }
    }

    /// Changes the view mode. The anchor stays put.
    pub fn with_view(self, view: CalendarView) -> Self {
        Self { view, ..self }
    }
}
