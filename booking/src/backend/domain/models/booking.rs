use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::CreateBookingRequest;

use super::slot_time::SlotTime;
use crate::backend::domain::time_slots::format_time;

/// Read-only projection of a complete draft, shown on the confirmation step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingDetails {
    pub tutor_id: String,
    pub tutor_name: String,
    pub date: NaiveDate,
    pub time: SlotTime,
    pub end_time: SlotTime,
    pub duration_minutes: u32,
    pub price: f64,
    pub subject: Option<String>,
    /// Tutor's timezone label, passed through for display only
    pub timezone: Option<String>,
}

impl BookingDetails {
    /// Request body for the booking store
    pub fn to_create_request(&self, notes: Option<String>) -> CreateBookingRequest {
        CreateBookingRequest {
            tutor_id: self.tutor_id.clone(),
            date: self.date,
            time: self.time.to_string(),
            duration: self.duration_minutes,
            subject: self.subject.clone(),
            notes,
        }
    }

    /// e.g. "2:00 PM - 3:00 PM"
    pub fn time_range_label(&self) -> String {
        let start = format_time(&self.time.to_string()).unwrap_or_else(|_| self.time.to_string());
        let end = format_time(&self.end_time.to_string()).unwrap_or_else(|_| self.end_time.to_string());
        format!("{} - {}", start, end)
    }

    pub fn formatted_price(&self) -> String {
        format!("${:.2}", self.price)
    }
}

/// `confirm` was reached without a complete draft. This is a state-machine
/// bug, not something the user can fix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionViolation {
    #[error("no date selected")]
    MissingDate,
    #[error("no time selected")]
    MissingTime,
    #[error("draft is for tutor '{draft}' but confirmation was requested for '{tutor}'")]
    TutorMismatch { draft: String, tutor: String },
}

/// Outcome of a failed booking submission, as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    /// The slot was taken between fetching slots and submitting
    #[error("{message}")]
    Conflict { message: String },
    #[error("{message}")]
    Network { message: String },
    /// Any other rejection from the booking store
    #[error("{message}")]
    Rejected { message: String },
    #[error("A booking request is already being submitted")]
    SubmissionInProgress,
    #[error("Booking flow precondition violated: {0}")]
    Precondition(#[from] PreconditionViolation),
}

impl BookingError {
    /// Whether the user can act on this error (pick another slot, retry)
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, BookingError::Precondition(_))
    }

    /// Text to surface to the user. Store messages are passed through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            BookingError::Conflict { message }
            | BookingError::Network { message }
            | BookingError::Rejected { message } => message.clone(),
            BookingError::SubmissionInProgress => "Your booking is still being submitted".to_string(),
            BookingError::Precondition(_) => "Something went wrong. Please start the booking again.".to_string(),
        }
    }
}
