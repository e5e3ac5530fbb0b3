use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Public profile data of a tutor that the booking flow needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorDetails {
    pub id: String,
    pub name: String,
    pub subject: String,
    /// Base price for one hour of tuition
    pub hourly_rate: f64,
    /// Opaque IANA-style identifier taken from the tutor profile, never interpreted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// A single bookable start time on a given date for a given tutor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Wall-clock start time, 24-hour "HH:MM"
    pub time: String,
    pub available: bool,
    /// Slot-specific price; overrides the tutor's hourly rate when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl TimeSlot {
    pub fn open(time: &str) -> Self {
        Self {
            time: time.to_string(),
            available: true,
            price: None,
        }
    }
}

/// Calendar days on which a tutor has at least one open slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableDatesResponse {
    pub tutor_id: String,
    pub dates: Vec<NaiveDate>,
}

/// Slots offered by a tutor on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlotsResponse {
    pub tutor_id: String,
    pub date: NaiveDate,
    pub slots: Vec<TimeSlot>,
}

/// Lifecycle of a persisted booking. Transitions are owned by the booking store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    /// Whether a booking in this status still occupies its slot
    pub fn holds_slot(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }
}

/// Booking ID in format: "booking::<uuid>"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub tutor_id: String,
    pub student_id: String,
    /// ISO calendar date, no time component
    pub date: NaiveDate,
    /// Start time, 24-hour "HH:MM"
    pub time: String,
    /// Lesson length in minutes
    pub duration: u32,
    pub status: BookingStatus,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Generate a new booking ID
    pub fn generate_id() -> String {
        format!("booking::{}", Uuid::new_v4().simple())
    }

    /// Validate a booking ID and return its unique part
    pub fn parse_id(id: &str) -> Result<&str, BookingIdError> {
        let unique = id
            .strip_prefix("booking::")
            .ok_or(BookingIdError::InvalidFormat)?;
        if unique.is_empty() {
            return Err(BookingIdError::MissingIdentifier);
        }
        Ok(unique)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BookingIdError {
    InvalidFormat,
    MissingIdentifier,
}

impl fmt::Display for BookingIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingIdError::InvalidFormat => write!(f, "Invalid booking ID format"),
            BookingIdError::MissingIdentifier => write!(f, "Booking ID has no identifier"),
        }
    }
}

impl std::error::Error for BookingIdError {}

/// Request to persist a new booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub tutor_id: String,
    pub date: NaiveDate,
    pub time: String,
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Error body returned by the REST API; `message` is meant to be shown verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub message: String,
}

impl ApiErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Format a month filter value ("2025-06")
pub fn format_month_key(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}

/// Parse a month filter value ("2025-06") into (year, month)
pub fn parse_month_key(key: &str) -> Option<(i32, u32)> {
    let (year, month) = key.split_once('-')?;
    let year = year.parse::<i32>().ok()?;
    let month = month.parse::<u32>().ok()?;
    if (1..=12).contains(&month) {
        Some((year, month))
    } else {
        None
    }
}
