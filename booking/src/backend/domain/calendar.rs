//! Calendar domain logic for lesson booking.
//!
//! This module turns a tutor's availability snapshot into a fixed six-week
//! month grid and handles month navigation. The UI should only render the
//! cells it is given; whether a day can be picked is decided here.

use chrono::{Datelike, Duration, Local, NaiveDate};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Six full weeks, so the grid height never changes between months
pub const GRID_CELLS: usize = 42;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    #[error("Invalid month: {0}. Must be between 1 and 12")]
    InvalidMonth(u32),
    #[error("Year {0} is outside the supported calendar range")]
    YearOutOfRange(i32),
    #[error("{0} is not available for booking")]
    NotSelectable(NaiveDate),
}

/// Month currently shown by the calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFocus {
    pub year: i32,
    pub month: u32,
}

impl CalendarFocus {
    pub fn new(year: i32, month: u32) -> Result<Self, CalendarError> {
        if !(1..=12).contains(&month) {
            return Err(CalendarError::InvalidMonth(month));
        }
        Ok(Self { year, month })
    }

    /// Focus on the month that contains `date`
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

/// Immutable set of calendar days with at least one open slot, as fetched
/// from the availability provider. Cloning shares the underlying set.
#[derive(Debug, Clone, Default)]
pub struct AvailabilitySnapshot {
    dates: Arc<BTreeSet<NaiveDate>>,
}

impl AvailabilitySnapshot {
    pub fn new<I: IntoIterator<Item = NaiveDate>>(dates: I) -> Self {
        Self {
            dates: Arc::new(dates.into_iter().collect()),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Available dates falling inside the given month
    pub fn in_month(&self, year: i32, month: u32) -> Vec<NaiveDate> {
        self.dates
            .iter()
            .filter(|d| d.year() == year && d.month() == month)
            .copied()
            .collect()
    }

    pub fn dates(&self) -> &BTreeSet<NaiveDate> {
        &self.dates
    }

    /// True when both snapshots are the very same fetch result
    pub fn same_snapshot(&self, other: &AvailabilitySnapshot) -> bool {
        Arc::ptr_eq(&self.dates, &other.dates)
    }
}

/// Earliest and optional latest bookable dates, applied on top of "not in the past"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateBounds {
    pub min_date: NaiveDate,
    pub max_date: Option<NaiveDate>,
}

impl DateBounds {
    pub fn new(min_date: NaiveDate, max_date: Option<NaiveDate>) -> Self {
        Self { min_date, max_date }
    }

    /// Bounds starting today, optionally limited to a booking window
    pub fn from_today(today: NaiveDate, window_days: Option<u32>) -> Self {
        Self {
            min_date: today,
            max_date: window_days.map(|days| today + Duration::days(i64::from(days))),
        }
    }

    /// Whether a date is disabled regardless of availability
    pub fn disables(&self, date: NaiveDate, today: NaiveDate) -> bool {
        date < today
            || date < self.min_date
            || self.max_date.map_or(false, |max| date > max)
    }
}

/// One day of the month grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub in_current_month: bool,
    pub is_today: bool,
    pub is_available: bool,
    pub is_selected: bool,
    pub is_disabled: bool,
}

impl CalendarCell {
    /// A cell can be picked only when it is available and not disabled
    pub fn is_selectable(&self) -> bool {
        self.is_available && !self.is_disabled
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }
}

/// A rendered month: always exactly [`GRID_CELLS`] cells starting on a Sunday
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarGrid {
    pub year: i32,
    pub month: u32,
    pub cells: Vec<CalendarCell>,
}

impl CalendarGrid {
    /// Rows of seven cells, Sunday first
    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarCell]> {
        self.cells.chunks(7)
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&CalendarCell> {
        self.cells.iter().find(|cell| cell.date == date)
    }

    /// Report a click on `date` upward; only selectable cells produce a selection
    pub fn try_select(&self, date: NaiveDate) -> Result<NaiveDate, CalendarError> {
        match self.cell(date) {
            Some(cell) if cell.is_selectable() => Ok(date),
            _ => Err(CalendarError::NotSelectable(date)),
        }
    }

    pub fn has_selectable_dates(&self) -> bool {
        self.cells
            .iter()
            .any(|cell| cell.in_current_month && cell.is_selectable())
    }
}

/// Calendar service that handles all calendar-related business logic
#[derive(Clone, Default)]
pub struct CalendarService;

impl CalendarService {
    pub fn new() -> Self {
        Self
    }

    /// Build the 42-cell grid for a month.
    ///
    /// Availability is compared by calendar day. Disabled days (past, before
    /// `bounds.min_date`, after `bounds.max_date`) are never selectable even
    /// when the tutor lists them as available.
    pub fn build_grid(
        &self,
        year: i32,
        month: u32,
        available: &AvailabilitySnapshot,
        selected: Option<NaiveDate>,
        bounds: DateBounds,
        today: NaiveDate,
    ) -> Result<CalendarGrid, CalendarError> {
        if !(1..=12).contains(&month) {
            return Err(CalendarError::InvalidMonth(month));
        }
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or(CalendarError::YearOutOfRange(year))?;
        let lead = i64::from(self.first_day_of_month(first));
        let start = first
            .checked_sub_signed(Duration::days(lead))
            .ok_or(CalendarError::YearOutOfRange(year))?;

        let mut cells = Vec::with_capacity(GRID_CELLS);
        for offset in 0..GRID_CELLS as i64 {
            let date = start
                .checked_add_signed(Duration::days(offset))
                .ok_or(CalendarError::YearOutOfRange(year))?;
            cells.push(CalendarCell {
                date,
                in_current_month: date.month() == month && date.year() == year,
                is_today: date == today,
                is_available: available.contains(date),
                is_selected: selected == Some(date),
                is_disabled: bounds.disables(date, today),
            });
        }

        debug!(
            "Built calendar grid for {}/{}: {} of {} days available",
            month,
            year,
            available.in_month(year, month).len(),
            self.days_in_month(month, year)
        );

        Ok(CalendarGrid { year, month, cells })
    }

    /// Number of days in a month: the day before the first of the next
    /// month. Zero for a month chrono cannot represent.
    pub fn days_in_month(&self, month: u32, year: i32) -> u32 {
        let next = self.next_month(CalendarFocus { year, month });
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|_| NaiveDate::from_ymd_opt(next.year, next.month, 1))
            .and_then(|first_of_next| first_of_next.pred_opt())
            .map_or(0, |last| last.day())
    }

    pub fn is_leap_year(&self, year: i32) -> bool {
        NaiveDate::from_ymd_opt(year, 2, 29).is_some()
    }

    /// Weekday of the given date, 0 = Sunday .. 6 = Saturday
    pub fn first_day_of_month(&self, first: NaiveDate) -> u32 {
        first.weekday().num_days_from_sunday()
    }

    /// Get the human-readable name for a month number
    pub fn month_name(&self, month: u32) -> &'static str {
        match month {
            1 => "January", 2 => "February", 3 => "March", 4 => "April",
            5 => "May", 6 => "June", 7 => "July", 8 => "August",
            9 => "September", 10 => "October", 11 => "November", 12 => "December",
            _ => "Invalid Month",
        }
    }

    /// Header text for a month grid, e.g. "June 2025"
    pub fn month_title(&self, focus: CalendarFocus) -> String {
        format!("{} {}", self.month_name(focus.month), focus.year)
    }

    /// Format a date for human-readable display, e.g. "June 13, 2025"
    pub fn format_date_for_display(&self, date: NaiveDate) -> String {
        format!("{} {}, {}", self.month_name(date.month()), date.day(), date.year())
    }

    /// Navigate to the previous month
    pub fn previous_month(&self, focus: CalendarFocus) -> CalendarFocus {
        if focus.month == 1 {
            CalendarFocus { year: focus.year - 1, month: 12 }
        } else {
            CalendarFocus { year: focus.year, month: focus.month - 1 }
        }
    }

    /// Navigate to the next month
    pub fn next_month(&self, focus: CalendarFocus) -> CalendarFocus {
        if focus.month == 12 {
            CalendarFocus { year: focus.year + 1, month: 1 }
        } else {
            CalendarFocus { year: focus.year, month: focus.month + 1 }
        }
    }

    /// Today's date in the local timezone of the running process
    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Navigable calendar over one availability snapshot.
///
/// Moving between months only changes which part of the snapshot is rendered;
/// it never refetches or alters the snapshot.
#[derive(Debug, Clone)]
pub struct CalendarView {
    focus: CalendarFocus,
    snapshot: AvailabilitySnapshot,
    bounds: DateBounds,
}

impl CalendarView {
    pub fn new(focus: CalendarFocus, snapshot: AvailabilitySnapshot, bounds: DateBounds) -> Self {
        Self {
            focus,
            snapshot,
            bounds,
        }
    }

    pub fn focus(&self) -> CalendarFocus {
        self.focus
    }

    pub fn snapshot(&self) -> &AvailabilitySnapshot {
        &self.snapshot
    }

    pub fn bounds(&self) -> DateBounds {
        self.bounds
    }

    pub fn previous_month(&mut self) -> CalendarFocus {
        self.focus = CalendarService.previous_month(self.focus);
        debug!("Calendar moved to {}/{}", self.focus.month, self.focus.year);
        self.focus
    }

    pub fn next_month(&mut self) -> CalendarFocus {
        self.focus = CalendarService.next_month(self.focus);
        debug!("Calendar moved to {}/{}", self.focus.month, self.focus.year);
        self.focus
    }

    /// Render the focused month
    pub fn grid(&self, selected: Option<NaiveDate>, today: NaiveDate) -> Result<CalendarGrid, CalendarError> {
        CalendarService.build_grid(
            self.focus.year,
            self.focus.month,
            &self.snapshot,
            selected,
            self.bounds,
            today,
        )
    }

    /// Same rule as [`CalendarCell::is_selectable`], for dates outside the focused month too
    pub fn is_selectable(&self, date: NaiveDate, today: NaiveDate) -> bool {
        self.snapshot.contains(date) && !self.bounds.disables(date, today)
    }
}
