//! Booking wizard state.
//!
//! Service → Staff (optional) → Date & time → Details → Done. The wizard
//! owns everything collected so far; `can_advance` is a pure function of it.
//! Availability is fetched by the caller and handed back through
//! [`BookingWizard::slots_loaded`].

use chrono::{Days, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::appointment::{BookingReceipt, BookingRequest};
use crate::config::BOOKING_WINDOW_DAYS;
use crate::db::parse_clock;
use crate::models::{PatientInput, Service};
use crate::slots::{self, OccupiedSlots};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Service,
    Staff,
    DateTime,
    Details,
    Done,
}

impl WizardStep {
    /// 1-based position shown in the progress bar. `Done` is past the end.
    pub fn number(self) -> u8 {
        match self {
            Self::Service => 1,
            Self::Staff => 2,
            Self::DateTime => 3,
            Self::Details => 4,
            Self::Done => 5,
        }
    }

    fn next(self) -> Self {
        match self {
            Self::Service => Self::Staff,
            Self::Staff => Self::DateTime,
            Self::DateTime => Self::Details,
            Self::Details | Self::Done => Self::Done,
        }
    }

    fn previous(self) -> Self {
        match self {
            Self::Service | Self::Staff => Self::Service,
            Self::DateTime => Self::Staff,
            Self::Details => Self::DateTime,
            Self::Done => Self::Done,
        }
    }
}

/// Availability for the chosen date. Only `Ready` lets a time be picked; a
/// failed fetch never falls back to "everything free".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SlotGrid {
    Loading,
    Ready { occupied: OccupiedSlots },
    Unavailable { reason: String },
}

impl SlotGrid {
    pub fn is_selectable(&self, label: &str) -> bool {
        match self {
            Self::Ready { occupied } => slots::is_booking_slot(label) && !occupied.contains(label),
            Self::Loading | Self::Unavailable { .. } => false,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum WizardError {
    #[error("Please select a service")]
    NoService,

    #[error("Step {0} is incomplete")]
    Incomplete(u8),

    #[error("{0} is not a bookable date")]
    DateOutOfRange(NaiveDate),

    #[error("Please select a date first")]
    NoDate,

    #[error("Available times are still loading")]
    SlotsLoading,

    #[error("Available times could not be loaded: {0}")]
    SlotsUnavailable(String),

    #[error("{0} is not available")]
    SlotTaken(String),

    #[error("A booking is already being submitted")]
    SubmissionInFlight,

    #[error("This booking has already been submitted")]
    AlreadyDone,
}

/// The 14 bookable dates, starting tomorrow.
pub fn bookable_dates(today: NaiveDate) -> Vec<NaiveDate> {
    (1..=u64::from(BOOKING_WINDOW_DAYS))
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingWizard {
    step: WizardStep,
    today: NaiveDate,
    service: Option<Service>,
    staff_id: Option<Uuid>,
    date: Option<NaiveDate>,
    time: Option<String>,
    slot_grid: Option<SlotGrid>,
    patient: PatientInput,
    notes: Option<String>,
    submitting: bool,
    last_error: Option<String>,
    receipt: Option<BookingReceipt>,
}

impl BookingWizard {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            step: WizardStep::Service,
            today,
            service: None,
            staff_id: None,
            date: None,
            time: None,
            slot_grid: None,
            patient: PatientInput::default(),
            notes: None,
            submitting: false,
            last_error: None,
            receipt: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn slot_grid(&self) -> Option<&SlotGrid> {
        self.slot_grid.as_ref()
    }

    pub fn selected_time(&self) -> Option<&str> {
        self.time.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn receipt(&self) -> Option<&BookingReceipt> {
        self.receipt.as_ref()
    }

    pub fn select_service(&mut self, service: Service) {
        self.service = Some(service);
    }

    /// `None` leaves the choice to the clinic.
    pub fn select_staff(&mut self, staff_id: Option<Uuid>) {
        if self.staff_id != staff_id {
            self.staff_id = staff_id;
            // Occupancy depends on the staff scope
            if self.date.is_some() {
                self.begin_loading();
            }
        }
    }

    /// Picks a date and clears any chosen time. The grid goes to `Loading`
    /// until [`slots_loaded`](Self::slots_loaded) is called for that date.
    pub fn select_date(&mut self, date: NaiveDate) -> Result<(), WizardError> {
        if !bookable_dates(self.today).contains(&date) {
            return Err(WizardError::DateOutOfRange(date));
        }
        self.date = Some(date);
        self.begin_loading();
        Ok(())
    }

    fn begin_loading(&mut self) {
        self.time = None;
        self.slot_grid = Some(SlotGrid::Loading);
    }

    /// Delivers an availability result. Results for a date other than the
    /// one currently selected are stale and dropped.
    pub fn slots_loaded(&mut self, date: NaiveDate, result: Result<OccupiedSlots, String>) {
        if self.date != Some(date) {
            tracing::debug!(%date, "Dropping stale availability result");
            return;
        }
        self.slot_grid = Some(match result {
            Ok(occupied) => SlotGrid::Ready { occupied },
            Err(reason) => SlotGrid::Unavailable { reason },
        });
    }

    pub fn select_time(&mut self, label: &str) -> Result<(), WizardError> {
        match self.slot_grid.as_ref() {
            None => Err(WizardError::NoDate),
            Some(SlotGrid::Loading) => Err(WizardError::SlotsLoading),
            Some(SlotGrid::Unavailable { reason }) => Err(WizardError::SlotsUnavailable(reason.clone())),
            Some(grid) if grid.is_selectable(label) => {
                self.time = Some(label.to_string());
                Ok(())
            }
            Some(_) => Err(WizardError::SlotTaken(label.to_string())),
        }
    }

    pub fn set_details(&mut self, patient: PatientInput, notes: Option<String>) {
        self.patient = patient;
        self.notes = notes;
    }

    /// Whether the current step has everything it needs.
    pub fn can_advance(&self) -> bool {
        match self.step {
            WizardStep::Service => self.service.is_some(),
            WizardStep::Staff => true,
            WizardStep::DateTime => match (self.date, self.time.as_deref(), self.slot_grid.as_ref()) {
                (Some(_), Some(label), Some(grid)) => grid.is_selectable(label),
                _ => false,
            },
            WizardStep::Details => {
                !self.patient.full_name.trim().is_empty() && !self.patient.phone.trim().is_empty()
            }
            WizardStep::Done => false,
        }
    }

    /// Moves to the next step. Leaving `Details` happens only through
    /// submission.
    pub fn advance(&mut self) -> Result<WizardStep, WizardError> {
        if self.step == WizardStep::Details || self.step == WizardStep::Done {
            return Err(WizardError::Incomplete(self.step.number()));
        }
        if !self.can_advance() {
            return Err(match self.step {
                WizardStep::Service => WizardError::NoService,
                other => WizardError::Incomplete(other.number()),
            });
        }
        self.step = self.step.next();
        Ok(self.step)
    }

    pub fn back(&mut self) -> WizardStep {
        if !self.submitting {
            self.step = self.step.previous();
        }
        self.step
    }

    /// Builds the booking request and marks the wizard in flight. A second
    /// call before [`finish_submit`](Self::finish_submit) is refused.
    pub fn begin_submit(&mut self) -> Result<BookingRequest, WizardError> {
        if self.step == WizardStep::Done {
            return Err(WizardError::AlreadyDone);
        }
        if self.submitting {
            return Err(WizardError::SubmissionInFlight);
        }
        let service = self.service.as_ref().ok_or(WizardError::NoService)?;
        if self.step != WizardStep::Details || !self.can_advance() {
            return Err(WizardError::Incomplete(self.step.number()));
        }
        let (date, time) = match (self.date, self.time.as_deref().and_then(parse_clock)) {
            (Some(date), Some(time)) => (date, time),
            _ => return Err(WizardError::Incomplete(WizardStep::DateTime.number())),
        };

        self.submitting = true;
        self.last_error = None;
        Ok(BookingRequest {
            patient: self.patient.clone(),
            service_id: Some(service.id),
            staff_id: self.staff_id,
            date,
            time,
            notes: self.notes.clone(),
        })
    }

    /// Records the submission outcome. Success moves to `Done`; failure stays
    /// on `Details` and keeps the message for display.
    pub fn finish_submit(&mut self, outcome: Result<BookingReceipt, String>) {
        self.submitting = false;
        match outcome {
            Ok(receipt) => {
                self.receipt = Some(receipt);
                self.step = WizardStep::Done;
            }
            Err(message) => {
                self.last_error = Some(message);
            }
        }
    }
}
