//! Back-office landing screen: today's schedule and headline counts.

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

use crate::authorization::{navigation_for, NavItem, RoleSet};
use crate::db::{self, DatabaseError};
use crate::models::*;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub today_appointments: u32,
    pub total_patients: u32,
    pub pending_appointments: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub date: NaiveDate,
    pub stats: DashboardStats,
    /// Today's appointments, earliest first.
    pub today: Vec<AppointmentView>,
    pub navigation: Vec<NavItem>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

pub fn dashboard_stats(conn: &Connection, today: NaiveDate) -> Result<DashboardStats, DatabaseError> {
    Ok(DashboardStats {
        today_appointments: db::count_appointments_on(conn, today)?,
        total_patients: db::count_patients(conn)?,
        pending_appointments: db::count_by_status(conn, AppointmentStatus::Pending)?,
    })
}

pub fn load_dashboard(
    conn: &Connection,
    today: NaiveDate,
    roles: RoleSet,
) -> Result<Dashboard, DatabaseError> {
    let today_list = db::list_appointment_views(conn, &AppointmentFilter::for_range(today, today))?;
    Ok(Dashboard {
        date: today,
        stats: dashboard_stats(conn, today)?,
        today: today_list,
        navigation: navigation_for(roles),
    })
}
