use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Weekday;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    pub id: Uuid,
    pub full_name: String,
    pub specialization: Option<String>,
    pub is_active: bool,
    pub working_days: Vec<Weekday>,
    pub working_hours_start: NaiveTime,
    pub working_hours_end: NaiveTime,
    pub user_id: Option<Uuid>,
}

impl Staff {
    pub fn default_working_days() -> Vec<Weekday> {
        vec![
            Weekday::Monday,
            Weekday::Tuesday,
            Weekday::Wednesday,
            Weekday::Thursday,
            Weekday::Friday,
        ]
    }

    pub fn works_on(&self, date: NaiveDate) -> bool {
        use chrono::Datelike;
        self.working_days.contains(&Weekday::from(date.weekday()))
    }

    pub fn works_at(&self, time: NaiveTime) -> bool {
        time >= self.working_hours_start && time < self.working_hours_end
    }
}
