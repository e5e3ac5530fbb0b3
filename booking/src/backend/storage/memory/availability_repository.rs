//! # In-Memory Availability Repository
//!
//! Serves tutor profiles and availability from a [`MemoryConnection`].
//! A published slot is reported as unavailable while an active booking
//! covers its start time, and a date is listed only while at least one of
//! its slots is still open.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use shared::{TimeSlot, TutorDetails};
use tracing::debug;

use super::connection::MemoryConnection;
use crate::backend::storage::traits::{AvailabilityProvider, ServiceError, ServiceResult, TutorDirectory};

#[derive(Clone)]
pub struct AvailabilityRepository {
    connection: MemoryConnection,
}

impl AvailabilityRepository {
    pub fn new(connection: MemoryConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl AvailabilityProvider for AvailabilityRepository {
    async fn available_dates(&self, tutor_id: &str, month: Option<(i32, u32)>) -> ServiceResult<Vec<NaiveDate>> {
        let data = self.connection.data.read().await;
        if !data.tutors.contains_key(tutor_id) {
            return Err(ServiceError::NotFound(format!("Tutor '{}'", tutor_id)));
        }

        let Some(schedule) = data.schedules.get(tutor_id) else {
            return Ok(Vec::new());
        };

        let dates: Vec<NaiveDate> = schedule
            .iter()
            .filter(|(date, _)| month.map_or(true, |(y, m)| date.year() == y && date.month() == m))
            .filter(|(date, slots)| {
                slots
                    .iter()
                    .any(|slot| !data.slot_taken(tutor_id, **date, slot.time))
            })
            .map(|(date, _)| *date)
            .collect();

        debug!("Tutor {} has {} available dates", tutor_id, dates.len());
        Ok(dates)
    }

    async fn available_time_slots(&self, tutor_id: &str, date: NaiveDate) -> ServiceResult<Vec<TimeSlot>> {
        let data = self.connection.data.read().await;
        if !data.tutors.contains_key(tutor_id) {
            return Err(ServiceError::NotFound(format!("Tutor '{}'", tutor_id)));
        }

        let slots = data
            .schedules
            .get(tutor_id)
            .and_then(|schedule| schedule.get(&date))
            .map(|slots| {
                slots
                    .iter()
                    .map(|slot| TimeSlot {
                        time: slot.time.to_string(),
                        available: !data.slot_taken(tutor_id, date, slot.time),
                        price: slot.price,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(slots)
    }
}

#[async_trait]
impl TutorDirectory for AvailabilityRepository {
    async fn tutor_details(&self, tutor_id: &str) -> ServiceResult<TutorDetails> {
        let data = self.connection.data.read().await;
        data.tutors
            .get(tutor_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("Tutor '{}'", tutor_id)))
    }
}
