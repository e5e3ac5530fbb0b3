//! # Domain Module
//!
//! Contains the lesson booking logic: turning a tutor's availability into a
//! calendar, grouping the slots of a day, tracking the student's selection,
//! and submitting the booking.
//!
//! Everything here is independent of transport and storage. Collaborators
//! are reached through the traits in `storage::traits`.
//!
//! ## Module Organization
//!
//! - **calendar**: month grid generation, date bounds and month navigation
//! - **time_slots**: morning/afternoon/evening grouping and 12-hour formatting
//! - **booking_draft**: the date-then-time selection state machine and price derivation
//! - **slot_board**: generation-counted slot fetches, discarding stale responses
//! - **booking_orchestrator**: create-booking calls, duplicate-submit guard, bookings cache
//! - **booking_flow**: the per-tutor facade a booking screen drives
//!
//! ## Business Rules
//!
//! - A date is selectable only if the tutor has an open slot on it and it
//!   lies within the booking bounds
//! - Changing the date always clears the chosen time
//! - A slot-specific price overrides the tutor's hourly rate
//! - Only the booking store decides whether a slot is still free

pub mod booking_draft;
pub mod booking_flow;
pub mod booking_orchestrator;
pub mod calendar;
pub mod models;
pub mod slot_board;
pub mod time_slots;

pub use booking_draft::{BookingDraft, DateTransition, DraftError, DraftState};
pub use booking_flow::{BookingFlow, ConfirmationStage, FlowError, SlotFetch, SlotUpdate};
pub use booking_orchestrator::BookingOrchestrator;
pub use calendar::{CalendarError, CalendarGrid, CalendarService, CalendarView};
pub use slot_board::{SlotBoard, SlotRequestTicket, StaleSelection};
pub use time_slots::{SlotDisplay, TimeSlotError};
