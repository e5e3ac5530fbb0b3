//! Booking request orchestration.
//!
//! Turns a complete draft into a create-booking call against the
//! [`BookingStore`], interprets the outcome, and keeps a cached copy of the
//! student's bookings current. The store decides whether a slot is still
//! free; this layer never retries and never edits the draft, so after a
//! conflict the user can simply pick another time.

use shared::{Booking, TutorDetails};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::backend::domain::booking_draft::{derive_details, BookingDraft};
use crate::backend::domain::models::{BookingDetails, BookingError, PreconditionViolation};
use crate::backend::storage::traits::{BookingStore, ServiceError, SessionContext};

/// Clears the in-flight flag when the submission ends, including when the
/// submitting future is dropped early.
struct SubmitGuard<'a>(&'a AtomicBool);

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct BookingOrchestrator<S: BookingStore + ?Sized> {
    store: Arc<S>,
    session: SessionContext,
    duration_minutes: u32,
    in_flight: AtomicBool,
    bookings: RwLock<Option<Vec<Booking>>>,
}

impl<S: BookingStore + ?Sized> BookingOrchestrator<S> {
    pub fn new(store: Arc<S>, session: SessionContext, duration_minutes: u32) -> Self {
        Self {
            store,
            session,
            duration_minutes,
            in_flight: AtomicBool::new(false),
            bookings: RwLock::new(None),
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Details for a complete draft, or the violated precondition.
    ///
    /// Reaching this with an incomplete draft is a flow bug, so it is
    /// logged at error level.
    pub fn details_for(&self, draft: &BookingDraft, tutor: &TutorDetails) -> Result<BookingDetails, BookingError> {
        if draft.tutor_id() != tutor.id {
            let violation = PreconditionViolation::TutorMismatch {
                draft: draft.tutor_id().to_string(),
                tutor: tutor.id.clone(),
            };
            error!("Refusing to confirm booking: {}", violation);
            return Err(violation.into());
        }
        if let Err(violation) = draft.complete() {
            error!("Refusing to confirm booking: {}", violation);
            return Err(violation.into());
        }
        derive_details(draft, tutor, self.duration_minutes).ok_or_else(|| PreconditionViolation::MissingTime.into())
    }

    /// Submit the booking described by a complete draft
    pub async fn confirm(
        &self,
        draft: &BookingDraft,
        tutor: &TutorDetails,
        notes: Option<String>,
    ) -> Result<Booking, BookingError> {
        let details = self.details_for(draft, tutor)?;
        self.submit(&details, notes).await
    }

    /// Submit already derived details. A second call while one is in flight
    /// is refused without reaching the store.
    pub async fn submit(&self, details: &BookingDetails, notes: Option<String>) -> Result<Booking, BookingError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Ignoring duplicate booking submission for {} at {}", details.date, details.time);
            return Err(BookingError::SubmissionInProgress);
        }
        let _guard = SubmitGuard(&self.in_flight);

        let request = details.to_create_request(notes);
        info!(
            "Submitting booking with {} on {} at {} for {} minutes",
            request.tutor_id, request.date, request.time, request.duration
        );

        match self.store.create_booking(&self.session, &request).await {
            Ok(booking) => {
                info!("Booking {} created with status {:?}", booking.id, booking.status);
                self.refresh_after_change().await;
                Ok(booking)
            }
            Err(e) => {
                warn!("Booking request failed: {}", e);
                Err(booking_error(e))
            }
        }
    }

    /// The student's bookings, served from cache when available
    pub async fn user_bookings(&self) -> Result<Vec<Booking>, BookingError> {
        if let Some(cached) = self.bookings.read().await.as_ref() {
            return Ok(cached.clone());
        }
        self.refresh_user_bookings().await
    }

    /// Reload the student's bookings from the store
    pub async fn refresh_user_bookings(&self) -> Result<Vec<Booking>, BookingError> {
        let bookings = self.store.user_bookings(&self.session).await.map_err(booking_error)?;
        *self.bookings.write().await = Some(bookings.clone());
        Ok(bookings)
    }

    pub async fn cancel_booking(&self, booking_id: &str) -> Result<(), BookingError> {
        self.store
            .cancel_booking(&self.session, booking_id)
            .await
            .map_err(booking_error)?;
        info!("Cancelled booking {}", booking_id);
        self.refresh_after_change().await;
        Ok(())
    }

    async fn refresh_after_change(&self) {
        *self.bookings.write().await = None;
        if let Err(e) = self.refresh_user_bookings().await {
            // The change itself succeeded; the list reloads on next access
            warn!("Failed to refresh bookings: {}", e);
        }
    }
}

/// Store failures as the user sees them. Conflict and rejection messages
/// are kept verbatim.
fn booking_error(error: ServiceError) -> BookingError {
    match error {
        ServiceError::Conflict(message) => BookingError::Conflict { message },
        ServiceError::Rejected { message, .. } => BookingError::Rejected { message },
        e @ ServiceError::Network(_) => BookingError::Network { message: e.to_string() },
        e => BookingError::Rejected { message: e.to_string() },
    }
}
