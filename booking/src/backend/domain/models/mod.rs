pub mod booking;
pub mod slot_time;

pub use booking::{BookingDetails, BookingError, PreconditionViolation};
pub use slot_time::{InvalidSlotTime, SlotTime, MINUTES_PER_DAY};
