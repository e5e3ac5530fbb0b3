//! # Collaborator Traits
//!
//! This module defines the contracts the booking core consumes from its
//! external collaborators. Availability, tutor profiles and persisted
//! bookings are owned elsewhere; the domain layer only sees these traits,
//! so the HTTP client and the in-memory store are interchangeable.

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::{Booking, CreateBookingRequest, TimeSlot, TutorDetails};

/// Credentials of the signed-in student, handed to the core explicitly.
///
/// Session refresh is owned by the auth collaborator; the core never reads
/// session state from anywhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub student_id: String,
    pub access_token: String,
}

impl SessionContext {
    pub fn new(student_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            access_token: access_token.into(),
        }
    }
}

/// Failure reported by a collaborator call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The requested slot is no longer free
    #[error("{0}")]
    Conflict(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Not signed in")]
    Unauthorized,
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Source of truth for when a tutor can be booked
#[async_trait]
pub trait AvailabilityProvider: Send + Sync {
    /// Calendar days with at least one open slot, optionally limited to one month
    async fn available_dates(&self, tutor_id: &str, month: Option<(i32, u32)>) -> ServiceResult<Vec<NaiveDate>>;

    /// Slots offered on one date, including ones already taken
    async fn available_time_slots(&self, tutor_id: &str, date: NaiveDate) -> ServiceResult<Vec<TimeSlot>>;
}

/// Read access to tutor profiles
#[async_trait]
pub trait TutorDirectory: Send + Sync {
    async fn tutor_details(&self, tutor_id: &str) -> ServiceResult<TutorDetails>;
}

/// Persists bookings and is the only arbiter of slot conflicts
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Create a booking; fails with [`ServiceError::Conflict`] when the slot is taken
    async fn create_booking(&self, session: &SessionContext, request: &CreateBookingRequest) -> ServiceResult<Booking>;

    /// Bookings of the signed-in student, newest lesson first
    async fn user_bookings(&self, session: &SessionContext) -> ServiceResult<Vec<Booking>>;

    async fn cancel_booking(&self, session: &SessionContext, booking_id: &str) -> ServiceResult<()>;
}
