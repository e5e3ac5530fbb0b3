//! # IO Module
//!
//! The boundary between the booking core and the network.
//!
//! - **rest**: axum handlers of the reference collaborator server, serving
//!   tutor profiles, availability and bookings from the in-memory store
//! - **client**: `reqwest` implementation of the collaborator traits that
//!   speaks the same REST contract
//!
//! Both sides share their request and response types through the `shared`
//! crate, and both carry conflict messages through unchanged so the
//! student sees exactly what the store reported.

pub mod client;
pub mod rest;

pub use client::{ClientSetupError, HttpBookingClient};
