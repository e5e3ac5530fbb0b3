//! Slot fetch bookkeeping.
//!
//! Every slot fetch is started with [`SlotBoard::begin`], which bumps a
//! generation counter and hands out a ticket. A response is applied only if
//! its ticket still carries the current generation, so a slow response for a
//! date the user has already moved away from can never overwrite the slots
//! of the date now selected.

use chrono::NaiveDate;
use shared::TimeSlot;
use tracing::debug;

use crate::backend::domain::models::SlotTime;
use crate::backend::domain::time_slots::{slot_display, SlotDisplay};

/// Identifies one slot fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRequestTicket {
    generation: u64,
    date: NaiveDate,
}

impl SlotRequestTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

/// A response arrived for a fetch that has since been superseded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("slots for {date} (generation {generation}) superseded by generation {current}")]
pub struct StaleSelection {
    pub date: NaiveDate,
    pub generation: u64,
    pub current: u64,
}

/// Slots shown for the currently selected date
#[derive(Debug, Clone, Default)]
pub struct SlotBoard {
    generation: u64,
    date: Option<NaiveDate>,
    slots: Vec<TimeSlot>,
    loading: bool,
    error: Option<String>,
}

impl SlotBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start fetching slots for `date`, superseding any fetch in flight
    pub fn begin(&mut self, date: NaiveDate) -> SlotRequestTicket {
        self.generation += 1;
        self.date = Some(date);
        self.slots.clear();
        self.loading = true;
        self.error = None;
        SlotRequestTicket {
            generation: self.generation,
            date,
        }
    }

    pub fn is_current(&self, ticket: &SlotRequestTicket) -> bool {
        ticket.generation == self.generation && self.date == Some(ticket.date)
    }

    fn check(&self, ticket: &SlotRequestTicket) -> Result<(), StaleSelection> {
        if self.is_current(ticket) {
            return Ok(());
        }
        let stale = StaleSelection {
            date: ticket.date,
            generation: ticket.generation,
            current: self.generation,
        };
        debug!("Discarding {}", stale);
        Err(stale)
    }

    /// Store the slots a fetch returned
    pub fn apply(&mut self, ticket: &SlotRequestTicket, slots: Vec<TimeSlot>) -> Result<(), StaleSelection> {
        self.check(ticket)?;
        self.slots = slots;
        self.loading = false;
        Ok(())
    }

    /// Record that a fetch failed. The board shows no slots afterwards.
    pub fn fail(&mut self, ticket: &SlotRequestTicket, message: impl Into<String>) -> Result<(), StaleSelection> {
        self.check(ticket)?;
        self.slots.clear();
        self.loading = false;
        self.error = Some(message.into());
        Ok(())
    }

    /// Forget the current date; any fetch in flight becomes stale
    pub fn clear(&mut self) {
        self.generation += 1;
        self.date = None;
        self.slots.clear();
        self.loading = false;
        self.error = None;
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Every slot of the last applied response, taken ones included
    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    /// Start times still open for booking, in provider order
    pub fn open_times(&self) -> Vec<&str> {
        self.slots
            .iter()
            .filter(|slot| slot.available)
            .map(|slot| slot.time.as_str())
            .collect()
    }

    /// The open slot starting at `time`, if any
    pub fn find_open(&self, time: SlotTime) -> Option<&TimeSlot> {
        self.slots
            .iter()
            .filter(|slot| slot.available)
            .find(|slot| slot.time.parse::<SlotTime>().map_or(false, |t| t == time))
    }

    /// Whether the last fetch failed and the date can be fetched again
    pub fn needs_retry(&self) -> bool {
        !self.loading && self.error.is_some()
    }

    pub fn display(&self) -> SlotDisplay {
        match &self.error {
            Some(message) if !self.loading => SlotDisplay::Failed(message.clone()),
            _ => slot_display(&self.open_times(), self.loading),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn slot(time: &str, available: bool) -> TimeSlot {
        TimeSlot {
            time: time.to_string(),
            available,
            price: None,
        }
    }

    #[test]
    fn test_begin_marks_loading() {
        let mut board = SlotBoard::new();
        let ticket = board.begin(date(2025, 6, 13));

        assert!(board.is_loading());
        assert_eq!(board.display(), SlotDisplay::Loading);
        assert_eq!(ticket.date(), date(2025, 6, 13));
        assert!(board.is_current(&ticket));
    }

    #[test]
    fn test_apply_current_response() {
        let mut board = SlotBoard::new();
        let ticket = board.begin(date(2025, 6, 13));
        board
            .apply(&ticket, vec![slot("09:00", true), slot("14:00", false)])
            .unwrap();

        assert!(!board.is_loading());
        assert_eq!(board.open_times(), vec!["09:00"]);
        assert!(board.find_open("09:00".parse().unwrap()).is_some());
        assert!(board.find_open("14:00".parse().unwrap()).is_none());
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut board = SlotBoard::new();
        let first = board.begin(date(2025, 6, 13));
        let second = board.begin(date(2025, 6, 14));

        // Response for the 14th arrives first
        board.apply(&second, vec![slot("10:00", true)]).unwrap();

        // The late response for the 13th must not overwrite it
        let result = board.apply(&first, vec![slot("16:00", true)]);
        assert_eq!(
            result,
            Err(StaleSelection {
                date: date(2025, 6, 13),
                generation: first.generation(),
                current: second.generation(),
            })
        );
        assert_eq!(board.date(), Some(date(2025, 6, 14)));
        assert_eq!(board.open_times(), vec!["10:00"]);
    }

    #[test]
    fn test_refetching_same_date_supersedes_earlier_ticket() {
        let mut board = SlotBoard::new();
        let first = board.begin(date(2025, 6, 13));
        let second = board.begin(date(2025, 6, 13));

        assert!(board.apply(&first, vec![slot("09:00", true)]).is_err());
        assert!(board.is_loading());
        board.apply(&second, vec![slot("11:00", true)]).unwrap();
        assert_eq!(board.open_times(), vec!["11:00"]);
    }

    #[test]
    fn test_failure_and_empty_response() {
        let mut board = SlotBoard::new();
        let ticket = board.begin(date(2025, 6, 13));
        board.fail(&ticket, "Network error: timed out").unwrap();

        assert!(!board.is_loading());
        assert_eq!(board.error(), Some("Network error: timed out"));
        assert!(board.needs_retry());
        assert_eq!(
            board.display(),
            SlotDisplay::Failed("Network error: timed out".to_string())
        );

        let ticket = board.begin(date(2025, 6, 14));
        assert_eq!(board.error(), None);
        assert!(!board.needs_retry());
        board.apply(&ticket, vec![slot("09:00", false)]).unwrap();
        assert_eq!(board.display(), SlotDisplay::NoSlots);
    }

    #[test]
    fn test_clear_invalidates_in_flight_fetch() {
        let mut board = SlotBoard::new();
        let ticket = board.begin(date(2025, 6, 13));
        board.clear();

        assert!(board.apply(&ticket, vec![slot("09:00", true)]).is_err());
        assert_eq!(board.date(), None);
        assert!(board.slots().is_empty());
    }
}
