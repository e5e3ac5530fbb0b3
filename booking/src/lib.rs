//! TutEasy lesson booking core.
//!
//! Converts tutor availability into a navigable calendar, drives the
//! date, time and confirm steps of booking a lesson, and submits bookings
//! to a store that rejects double bookings. A reference REST server and a
//! matching HTTP client are included.

pub mod backend;

pub use backend::domain::{BookingDraft, BookingFlow, BookingOrchestrator};
pub use backend::storage::{AvailabilityProvider, BookingStore, SessionContext, TutorDirectory};
pub use backend::{create_router, initialize_backend, AppState, BookingConfig};
