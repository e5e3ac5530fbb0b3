//! # In-Memory Connection
//!
//! Shared state behind the in-memory repositories: tutor profiles, the
//! weekly schedules tutors publish, and the bookings made against them.
//! All repositories created from one connection see the same data.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use shared::{Booking, TutorDetails};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::backend::domain::models::{SlotTime, MINUTES_PER_DAY};

/// A start time a tutor offers on a specific date
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledSlot {
    pub time: SlotTime,
    pub price: Option<f64>,
}

impl ScheduledSlot {
    pub fn new(time: SlotTime) -> Self {
        Self { time, price: None }
    }

    pub fn priced(time: SlotTime, price: f64) -> Self {
        Self {
            time,
            price: Some(price),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct MemoryData {
    pub tutors: HashMap<String, TutorDetails>,
    pub schedules: HashMap<String, BTreeMap<NaiveDate, Vec<ScheduledSlot>>>,
    pub bookings: Vec<Booking>,
}

impl MemoryData {
    /// Active lessons for a tutor that can reach into `date`, as minute
    /// spans measured from midnight of `date`. Lessons from the day before
    /// or after are shifted by a whole day, so one that runs past midnight
    /// covers the start of the next date.
    fn active_spans<'a>(&'a self, tutor_id: &'a str, date: NaiveDate) -> impl Iterator<Item = (&'a Booking, i64, i64)> + 'a {
        self.bookings
            .iter()
            .filter(move |b| b.tutor_id == tutor_id && b.status.holds_slot())
            .filter_map(move |booking| {
                let days = booking.date.signed_duration_since(date).num_days();
                if !(-1..=1).contains(&days) {
                    return None;
                }
                let (start, end) = lesson_span(booking)?;
                let shift = days * i64::from(MINUTES_PER_DAY);
                Some((booking, shift + i64::from(start), shift + i64::from(end)))
            })
    }

    /// Whether an active lesson is running at `time`
    pub fn slot_taken(&self, tutor_id: &str, date: NaiveDate, time: SlotTime) -> bool {
        let minute = i64::from(time.minute_of_day());
        self.active_spans(tutor_id, date)
            .any(|(_, start, end)| minute >= start && minute < end)
    }

    /// First active lesson whose span intersects [start, start + duration)
    pub fn overlapping_booking<'a>(
        &'a self,
        tutor_id: &'a str,
        date: NaiveDate,
        start: SlotTime,
        duration: u32,
    ) -> Option<&'a Booking> {
        let new_start = i64::from(start.minute_of_day());
        let new_end = new_start + i64::from(duration);
        self.active_spans(tutor_id, date)
            .find(|(_, start, end)| new_start < *end && *start < new_end)
            .map(|(booking, _, _)| booking)
    }
}

/// Minute-of-day span a booking occupies, starting on its own date
fn lesson_span(booking: &Booking) -> Option<(u32, u32)> {
    let start = booking.time.parse::<SlotTime>().ok()?.minute_of_day();
    Some((start, start + booking.duration))
}

/// Handle to the in-memory data set; cheap to clone
#[derive(Clone, Default)]
pub struct MemoryConnection {
    pub(crate) data: Arc<RwLock<MemoryData>>,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_tutor(&self, tutor: TutorDetails) {
        let mut data = self.data.write().await;
        data.tutors.insert(tutor.id.clone(), tutor);
    }

    /// Publish (or replace) the slots a tutor offers on a date
    pub async fn set_schedule(&self, tutor_id: &str, date: NaiveDate, mut slots: Vec<ScheduledSlot>) {
        slots.sort_by_key(|slot| slot.time);
        slots.dedup_by_key(|slot| slot.time);
        let mut data = self.data.write().await;
        data.schedules
            .entry(tutor_id.to_string())
            .or_default()
            .insert(date, slots);
    }

    pub async fn booking_count(&self) -> usize {
        self.data.read().await.bookings.len()
    }

    /// Seed two tutors with weekday schedules for the next `days` days
    pub async fn with_demo_data(today: NaiveDate, days: u32) -> Self {
        let connection = Self::new();

        connection
            .add_tutor(TutorDetails {
                id: "tutor-ada".to_string(),
                name: "Ada Lovelace".to_string(),
                subject: "Mathematics".to_string(),
                hourly_rate: 40.0,
                timezone: Some("Europe/London".to_string()),
            })
            .await;
        connection
            .add_tutor(TutorDetails {
                id: "tutor-alan".to_string(),
                name: "Alan Turing".to_string(),
                subject: "Computer Science".to_string(),
                hourly_rate: 55.0,
                timezone: Some("Europe/London".to_string()),
            })
            .await;

        for offset in 0..i64::from(days) {
            let date = today + Duration::days(offset);
            match date.weekday() {
                Weekday::Sat | Weekday::Sun => continue,
                _ => {}
            }
            connection
                .set_schedule("tutor-ada", date, demo_slots(&[("09:00", None), ("10:00", None), ("14:00", None), ("18:00", Some(50.0))]))
                .await;
            if offset % 2 == 0 {
                connection
                    .set_schedule("tutor-alan", date, demo_slots(&[("07:30", None), ("12:30", None), ("17:00", None), ("20:00", Some(65.0))]))
                    .await;
            }
        }

        info!("Seeded demo availability for {} days from {}", days, today);
        connection
    }
}

fn demo_slots(times: &[(&str, Option<f64>)]) -> Vec<ScheduledSlot> {
    times
        .iter()
        .filter_map(|(raw, price)| {
            raw.parse::<SlotTime>()
                .ok()
                .map(|time| ScheduledSlot { time, price: *price })
        })
        .collect()
}
