//! # In-Memory Booking Repository
//!
//! Persists bookings in a [`MemoryConnection`] and rejects any booking whose
//! lesson would overlap an active booking for the same tutor. The check and
//! the insert happen under one write lock, so two students racing for the
//! same slot cannot both succeed.

use async_trait::async_trait;
use chrono::Utc;
use shared::{Booking, BookingStatus, CreateBookingRequest};
use tracing::{info, warn};

use super::connection::MemoryConnection;
use crate::backend::domain::booking_draft::lesson_price;
use crate::backend::domain::models::{InvalidSlotTime, SlotTime};
use crate::backend::storage::traits::{BookingStore, ServiceError, ServiceResult, SessionContext};

/// Longest lesson the store accepts, in minutes
pub const MAX_LESSON_MINUTES: u32 = 8 * 60;

#[derive(Clone)]
pub struct BookingRepository {
    connection: MemoryConnection,
}

impl BookingRepository {
    pub fn new(connection: MemoryConnection) -> Self {
        Self { connection }
    }

    fn rejected(message: String) -> ServiceError {
        ServiceError::Rejected {
            status: 400,
            message,
        }
    }
}

#[async_trait]
impl BookingStore for BookingRepository {
    async fn create_booking(&self, session: &SessionContext, request: &CreateBookingRequest) -> ServiceResult<Booking> {
        let start: SlotTime = request
            .time
            .parse()
            .map_err(|e: InvalidSlotTime| Self::rejected(e.to_string()))?;
        if request.duration == 0 || request.duration > MAX_LESSON_MINUTES {
            return Err(Self::rejected(format!(
                "Lesson duration must be between 1 and {} minutes",
                MAX_LESSON_MINUTES
            )));
        }

        let mut data = self.connection.data.write().await;

        let tutor = data
            .tutors
            .get(&request.tutor_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("Tutor '{}'", request.tutor_id)))?;

        let offered = data
            .schedules
            .get(&request.tutor_id)
            .and_then(|schedule| schedule.get(&request.date))
            .and_then(|slots| slots.iter().find(|slot| slot.time == start))
            .cloned();
        let Some(slot) = offered else {
            return Err(Self::rejected(format!(
                "{} does not offer a lesson at {} on {}",
                tutor.name, start, request.date
            )));
        };

        if let Some(existing) = data.overlapping_booking(&request.tutor_id, request.date, start, request.duration) {
            warn!(
                "Rejecting booking for {} on {} at {}: overlaps {}",
                request.tutor_id, request.date, start, existing.id
            );
            return Err(ServiceError::Conflict(
                "This time slot is no longer available. Please choose another time.".to_string(),
            ));
        }

        let booking = Booking {
            id: Booking::generate_id(),
            tutor_id: request.tutor_id.clone(),
            student_id: session.student_id.clone(),
            date: request.date,
            time: start.to_string(),
            duration: request.duration,
            status: BookingStatus::Pending,
            price: lesson_price(tutor.hourly_rate, request.duration, slot.price),
            subject: request.subject.clone(),
            notes: request.notes.clone(),
            created_at: Utc::now(),
        };
        data.bookings.push(booking.clone());

        info!(
            "Created booking {} for student {} with {} on {} at {}",
            booking.id, booking.student_id, booking.tutor_id, booking.date, booking.time
        );
        Ok(booking)
    }

    async fn user_bookings(&self, session: &SessionContext) -> ServiceResult<Vec<Booking>> {
        let data = self.connection.data.read().await;
        let mut bookings: Vec<Booking> = data
            .bookings
            .iter()
            .filter(|b| b.student_id == session.student_id)
            .cloned()
            .collect();
        // Newest lesson first
        bookings.sort_by(|a, b| (b.date, &b.time).cmp(&(a.date, &a.time)));
        Ok(bookings)
    }

    async fn cancel_booking(&self, session: &SessionContext, booking_id: &str) -> ServiceResult<()> {
        let mut data = self.connection.data.write().await;
        let booking = data
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id && b.student_id == session.student_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Booking '{}'", booking_id)))?;

        if booking.status != BookingStatus::Cancelled {
            booking.status = BookingStatus::Cancelled;
            info!("Cancelled booking {}", booking_id);
        }
        Ok(())
    }
}
