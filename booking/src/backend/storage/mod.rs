//! # Storage Module
//!
//! Handles access to the data the booking core does not own: tutor
//! profiles, tutor availability, and persisted bookings.
//!
//! The domain layer talks to storage only through the traits in [`traits`],
//! so the backing implementation can be swapped without touching booking
//! logic.
//!
//! ## Implementations
//!
//! - **memory**: in-process store behind a `tokio::sync::RwLock`, the sole
//!   arbiter of slot conflicts for the bundled server
//! - **HTTP client**: lives in `io::client` and speaks the REST contract of
//!   the bundled server
//!
//! ## Design Principles
//!
//! - **Repository Pattern**: one repository per concern, sharing a connection
//! - **Dependency Inversion**: domain code depends on the traits, not on a backend
//! - **Testability**: the in-memory store doubles as a test fixture

pub mod memory;
pub mod traits;

pub use memory::{AvailabilityRepository, BookingRepository, MemoryConnection, ScheduledSlot};
pub use traits::{AvailabilityProvider, BookingStore, ServiceError, ServiceResult, SessionContext, TutorDirectory};
