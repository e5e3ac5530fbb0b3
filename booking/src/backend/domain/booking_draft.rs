//! Booking draft state machine.
//!
//! The draft holds the in-progress selection (date, then time) for one tutor.
//! Its central rule is that a chosen time belongs to the date that was active
//! when it was chosen: changing the date always clears the time.
//!
//! | From              | Event                   | To        | Side effect               |
//! |-------------------|-------------------------|-----------|---------------------------|
//! | Empty             | select_date             | DateOnly  | fetch slots for date      |
//! | DateOnly          | select_time             | TimeSet   | none                      |
//! | TimeSet           | select_date (different) | DateOnly  | clear time, refetch slots |
//! | DateOnly/TimeSet  | select_date (same)      | unchanged | none                      |
//!
//! A `TimeSet` draft is complete: [`derive_details`] is defined only there.

use chrono::NaiveDate;
use shared::TutorDetails;
use tracing::debug;

use crate::backend::domain::models::{BookingDetails, PreconditionViolation, SlotTime};

/// Lesson length used when the caller does not override it
pub const DEFAULT_LESSON_MINUTES: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    Empty,
    DateOnly,
    TimeSet,
}

/// Chosen start time together with the slot price the provider quoted for it
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedSlot {
    pub time: SlotTime,
    pub price: Option<f64>,
}

/// Result of [`BookingDraft::select_date`], naming the side effect the caller must run
#[derive(Debug, Clone, PartialEq)]
pub enum DateTransition {
    /// Entered `DateOnly` for `date`; slots must be fetched for it
    FetchSlots {
        date: NaiveDate,
        cleared: Option<SelectedSlot>,
    },
    /// Same date reselected, nothing to do
    Unchanged,
}

impl DateTransition {
    pub fn needs_fetch(&self) -> bool {
        matches!(self, DateTransition::FetchSlots { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("Select a date before choosing a time")]
    NoDateSelected,
}

/// The date and slot of a complete draft
#[derive(Debug, Clone, PartialEq)]
pub struct CompleteSelection {
    pub date: NaiveDate,
    pub slot: SelectedSlot,
}

/// In-progress selection for one tutor
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    tutor_id: String,
    selected_date: Option<NaiveDate>,
    selected_slot: Option<SelectedSlot>,
}

impl BookingDraft {
    pub fn new(tutor_id: impl Into<String>) -> Self {
        Self {
            tutor_id: tutor_id.into(),
            selected_date: None,
            selected_slot: None,
        }
    }

    pub fn tutor_id(&self) -> &str {
        &self.tutor_id
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.selected_date
    }

    pub fn selected_time(&self) -> Option<SlotTime> {
        self.selected_slot.as_ref().map(|slot| slot.time)
    }

    pub fn selected_slot(&self) -> Option<&SelectedSlot> {
        self.selected_slot.as_ref()
    }

    pub fn state(&self) -> DraftState {
        match (self.selected_date, &self.selected_slot) {
            (None, _) => DraftState::Empty,
            (Some(_), None) => DraftState::DateOnly,
            (Some(_), Some(_)) => DraftState::TimeSet,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state() == DraftState::TimeSet
    }

    /// Choose a date. A different date clears any chosen time.
    pub fn select_date(&mut self, date: NaiveDate) -> DateTransition {
        if self.selected_date == Some(date) {
            return DateTransition::Unchanged;
        }

        let cleared = self.selected_slot.take();
        if let Some(slot) = &cleared {
            debug!("Date changed to {}, clearing time {}", date, slot.time);
        }
        self.selected_date = Some(date);
        DateTransition::FetchSlots { date, cleared }
    }

    /// Choose a start time on the selected date, replacing any earlier choice
    pub fn select_time(&mut self, time: SlotTime, price: Option<f64>) -> Result<(), DraftError> {
        if self.selected_date.is_none() {
            return Err(DraftError::NoDateSelected);
        }
        self.selected_slot = Some(SelectedSlot { time, price });
        Ok(())
    }

    /// Drop the chosen time, keeping the date
    pub fn clear_time(&mut self) -> Option<SelectedSlot> {
        self.selected_slot.take()
    }

    /// Back to `Empty`, e.g. after navigating away
    pub fn reset(&mut self) {
        self.selected_date = None;
        self.selected_slot = None;
    }

    /// The selection of a complete draft, or which part is missing
    pub fn complete(&self) -> Result<CompleteSelection, PreconditionViolation> {
        let date = self.selected_date.ok_or(PreconditionViolation::MissingDate)?;
        let slot = self
            .selected_slot
            .clone()
            .ok_or(PreconditionViolation::MissingTime)?;
        Ok(CompleteSelection { date, slot })
    }
}

/// Price of a lesson. A slot-specific price wins over the hourly rate.
pub fn lesson_price(hourly_rate: f64, duration_minutes: u32, slot_price: Option<f64>) -> f64 {
    let raw = slot_price.unwrap_or(hourly_rate * f64::from(duration_minutes) / 60.0);
    (raw * 100.0).round() / 100.0
}

/// Project a complete draft into the values shown before submitting.
/// Returns `None` unless the draft is `TimeSet`.
pub fn derive_details(
    draft: &BookingDraft,
    tutor: &TutorDetails,
    duration_minutes: u32,
) -> Option<BookingDetails> {
    let selection = draft.complete().ok()?;
    let time = selection.slot.time;

    Some(BookingDetails {
        tutor_id: draft.tutor_id().to_string(),
        tutor_name: tutor.name.clone(),
        date: selection.date,
        time,
        end_time: time.add_minutes(duration_minutes),
        duration_minutes,
        price: lesson_price(tutor.hourly_rate, duration_minutes, selection.slot.price),
        subject: Some(tutor.subject.clone()).filter(|s| !s.trim().is_empty()),
        timezone: tutor.timezone.clone(),
    })
}
