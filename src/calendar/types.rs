use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::DatabaseError;
use crate::models::AppointmentView;

/// At most this many appointments are listed per month cell.
pub const MONTH_CELL_LIMIT: usize = 3;

/// Hour rows of the day and week views: 08:00 through 20:00.
pub const FIRST_HOUR_ROW: u32 = 8;
pub const LAST_HOUR_ROW: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarView {
    Day,
    Week,
    Month,
}

impl CalendarView {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl std::str::FromStr for CalendarView {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(DatabaseError::InvalidEnum {
                field: "CalendarView".into(),
                value: s.into(),
            }),
        }
    }
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// One hour row: every appointment whose start hour equals `hour`.
#[derive(Debug, Clone, Serialize)]
pub struct HourRow {
    pub hour: u32,
    pub label: String,
    pub appointments: Vec<AppointmentView>,
}

/// One column of the day or week view.
#[derive(Debug, Clone, Serialize)]
pub struct DayColumn {
    pub date: NaiveDate,
    pub is_today: bool,
    pub rows: Vec<HourRow>,
    /// Appointments starting before the first or after the last hour row.
    pub outside_hours: Vec<AppointmentView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthCell {
    pub date: NaiveDate,
    pub in_current_month: bool,
    pub is_today: bool,
    /// First few appointments of the day, by start time.
    pub appointments: Vec<AppointmentView>,
    /// How many more the cell does not list ("+N more").
    pub overflow: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum CalendarBody {
    Day { column: DayColumn },
    Week { columns: Vec<DayColumn> },
    Month { weeks: Vec<Vec<MonthCell>> },
}

/// Everything the calendar page renders for one view and anchor.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarSnapshot {
    pub anchor: NaiveDate,
    pub title: String,
    /// Dates whose appointments were loaded.
    pub window: DateWindow,
    /// Dates the grid shows. Wider than `window` for months.
    pub grid: DateWindow,
    pub total: usize,
    #[serde(flatten)]
    pub body: CalendarBody,
}
