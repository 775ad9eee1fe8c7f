use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Duration applied when a service carries none.
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// Longest duration a service or appointment may carry: one day.
pub const MAX_DURATION_MINUTES: u32 = 24 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: Option<u32>,
    pub price: Option<f64>,
    pub is_active: bool,
}

impl Service {
    pub fn effective_duration(&self) -> u32 {
        match self.duration_minutes {
            Some(minutes) if minutes > 0 => minutes,
            _ => DEFAULT_DURATION_MINUTES,
        }
    }
}
