//! # In-Memory Storage
//!
//! Reference implementation of the collaborator traits, used by the bundled
//! REST server and by tests. Every repository built from the same
//! [`MemoryConnection`] shares one data set.

pub mod availability_repository;
pub mod booking_repository;
pub mod connection;

pub use availability_repository::AvailabilityRepository;
pub use booking_repository::{BookingRepository, MAX_LESSON_MINUTES};
pub use connection::{MemoryConnection, ScheduledSlot};
