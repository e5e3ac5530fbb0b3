//! Time-slot display logic.
//!
//! Groups a tutor's open start times into morning, afternoon and evening
//! buckets and formats them for a 12-hour clock.

use tracing::debug;

use crate::backend::domain::models::slot_time::SlotTime;

pub const MORNING_START_HOUR: u32 = 6;
pub const AFTERNOON_START_HOUR: u32 = 12;
pub const EVENING_START_HOUR: u32 = 17;
/// Slots starting at or after this hour are not shown
pub const DAY_END_HOUR: u32 = 22;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeSlotError {
    #[error("Invalid time '{0}', expected HH:MM")]
    InvalidTime(String),
}

/// Part of the day a slot is displayed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
}

impl DayPeriod {
    /// Bucket for an hour of the day. Hours outside [06, 22) have no bucket.
    pub fn for_hour(hour: u32) -> Option<Self> {
        match hour {
            h if (MORNING_START_HOUR..AFTERNOON_START_HOUR).contains(&h) => Some(DayPeriod::Morning),
            h if (AFTERNOON_START_HOUR..EVENING_START_HOUR).contains(&h) => Some(DayPeriod::Afternoon),
            h if (EVENING_START_HOUR..DAY_END_HOUR).contains(&h) => Some(DayPeriod::Evening),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DayPeriod::Morning => "Morning",
            DayPeriod::Afternoon => "Afternoon",
            DayPeriod::Evening => "Evening",
        }
    }

    pub fn all() -> [DayPeriod; 3] {
        [DayPeriod::Morning, DayPeriod::Afternoon, DayPeriod::Evening]
    }
}

/// Slot start times split by part of day, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedSlots {
    pub morning: Vec<String>,
    pub afternoon: Vec<String>,
    pub evening: Vec<String>,
}

impl GroupedSlots {
    pub fn bucket(&self, period: DayPeriod) -> &[String] {
        match period {
            DayPeriod::Morning => &self.morning,
            DayPeriod::Afternoon => &self.afternoon,
            DayPeriod::Evening => &self.evening,
        }
    }

    pub fn len(&self) -> usize {
        self.morning.len() + self.afternoon.len() + self.evening.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Non-empty buckets in display order
    pub fn periods(&self) -> impl Iterator<Item = (DayPeriod, &[String])> {
        DayPeriod::all()
            .into_iter()
            .map(move |period| (period, self.bucket(period)))
            .filter(|(_, times)| !times.is_empty())
    }
}

/// What the slot picker should render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotDisplay {
    /// A fetch is in flight; render placeholders
    Loading,
    /// Nothing bookable on the selected date
    NoSlots,
    Grouped(GroupedSlots),
    /// The last fetch failed; offer a retry alongside the message
    Failed(String),
}

/// Partition "HH:MM" strings by starting hour.
///
/// Times outside [06:00, 22:00) and strings that do not parse are dropped.
pub fn group_slots<S: AsRef<str>>(times: &[S]) -> GroupedSlots {
    let mut grouped = GroupedSlots::default();

    for raw in times {
        let raw = raw.as_ref();
        let period = raw
            .parse::<SlotTime>()
            .ok()
            .and_then(|time| DayPeriod::for_hour(time.hour()));

        match period {
            Some(DayPeriod::Morning) => grouped.morning.push(raw.to_string()),
            Some(DayPeriod::Afternoon) => grouped.afternoon.push(raw.to_string()),
            Some(DayPeriod::Evening) => grouped.evening.push(raw.to_string()),
            None => debug!("Dropping slot '{}' outside the displayed day", raw),
        }
    }

    grouped
}

/// Display state for a list of slot times. `loading` wins over any data.
pub fn slot_display<S: AsRef<str>>(times: &[S], loading: bool) -> SlotDisplay {
    if loading {
        return SlotDisplay::Loading;
    }
    let grouped = group_slots(times);
    if grouped.is_empty() {
        SlotDisplay::NoSlots
    } else {
        SlotDisplay::Grouped(grouped)
    }
}

/// Convert "HH:MM" to "h:mm AM/PM". Midnight is 12 AM, noon is 12 PM.
pub fn format_time(time: &str) -> Result<String, TimeSlotError> {
    let parsed: SlotTime = time
        .parse()
        .map_err(|_| TimeSlotError::InvalidTime(time.to_string()))?;
    // Minute text is kept exactly as given
    let minute = time.trim().split_once(':').map(|(_, m)| m).unwrap_or("00");

    let hour = parsed.hour();
    let suffix = if hour >= 12 { "PM" } else { "AM" };
    let display_hour = match hour {
        0 => 12,
        h if h > 12 => h - 12,
        h => h,
    };

    Ok(format!("{}:{} {}", display_hour, minute, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time_boundaries() {
        assert_eq!(format_time("00:00").unwrap(), "12:00 AM");
        assert_eq!(format_time("12:00").unwrap(), "12:00 PM");
        assert_eq!(format_time("13:30").unwrap(), "1:30 PM");
        assert_eq!(format_time("09:05").unwrap(), "9:05 AM");
        assert_eq!(format_time("11:59").unwrap(), "11:59 AM");
        assert_eq!(format_time("23:45").unwrap(), "11:45 PM");
    }

    #[test]
    fn test_format_time_rejects_invalid_input() {
        assert_eq!(
            format_time("noon"),
            Err(TimeSlotError::InvalidTime("noon".to_string()))
        );
        assert!(format_time("24:00").is_err());
    }

    #[test]
    fn test_group_slots_by_period() {
        let times = ["06:00", "09:30", "11:59", "12:00", "16:30", "17:00", "21:30"];
        let grouped = group_slots(&times);

        assert_eq!(grouped.morning, vec!["06:00", "09:30", "11:59"]);
        assert_eq!(grouped.afternoon, vec!["12:00", "16:30"]);
        assert_eq!(grouped.evening, vec!["17:00", "21:30"]);
    }

    #[test]
    fn test_group_slots_is_complete_inside_display_window() {
        // Every quarter hour between 06:00 and 21:45
        let times: Vec<String> = (6..22)
            .flat_map(|h| [0, 15, 30, 45].map(move |m| format!("{:02}:{:02}", h, m)))
            .collect();
        let grouped = group_slots(&times);

        assert_eq!(grouped.len(), times.len());
        for time in &times {
            let hits = DayPeriod::all()
                .iter()
                .filter(|p| grouped.bucket(**p).contains(time))
                .count();
            assert_eq!(hits, 1, "{time} should appear in exactly one bucket");
        }
    }

    #[test]
    fn test_group_slots_drops_times_outside_window() {
        let grouped = group_slots(&["05:59", "22:00", "23:30", "00:00", "garbage", "08:00"]);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped.morning, vec!["08:00"]);
    }

    #[test]
    fn test_periods_skip_empty_buckets() {
        let grouped = group_slots(&["18:00", "07:00"]);
        let periods: Vec<_> = grouped.periods().map(|(p, _)| p).collect();
        assert_eq!(periods, vec![DayPeriod::Morning, DayPeriod::Evening]);
        assert_eq!(DayPeriod::Evening.label(), "Evening");
    }

    #[test]
    fn test_slot_display_states() {
        let empty: [&str; 0] = [];
        assert_eq!(slot_display(&empty, false), SlotDisplay::NoSlots);
        assert_eq!(slot_display(&["10:00"], true), SlotDisplay::Loading);
        assert_eq!(slot_display(&empty, true), SlotDisplay::Loading);
        match slot_display(&["10:00", "14:00"], false) {
            SlotDisplay::Grouped(grouped) => assert_eq!(grouped.len(), 2),
            other => panic!("expected grouped slots, got {:?}", other),
        }
    }
}
