//! # Backend Module
//!
//! Contains all non-UI logic for lesson booking.
//!
//! - **Domain**: calendar, slot grouping, the booking draft and flow
//! - **Storage**: collaborator traits and the in-memory reference store
//! - **IO**: the REST server and the HTTP client for it
//!
//! ## Architecture
//!
//! ```text
//! Booking screen
//!     ↓
//! Domain Layer (BookingFlow, BookingOrchestrator)
//!     ↓
//! Collaborator traits (AvailabilityProvider, TutorDirectory, BookingStore)
//!     ↓
//! HttpBookingClient  ──HTTP──▶  REST API  ──▶  in-memory store
//! ```

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::backend::domain::CalendarService;
use crate::backend::storage::{AvailabilityRepository, BookingRepository, MemoryConnection};

pub use config::{BookingConfig, ClientConfig, ConfigError, ServerConfig};

/// Shared state of the REST server
#[derive(Clone)]
pub struct AppState {
    pub availability_repository: AvailabilityRepository,
    pub booking_repository: BookingRepository,
}

impl AppState {
    pub fn new(connection: MemoryConnection) -> Self {
        Self {
            availability_repository: AvailabilityRepository::new(connection.clone()),
            booking_repository: BookingRepository::new(connection),
        }
    }
}

/// Initialize the server state, seeded with demo tutors
pub async fn initialize_backend(config: &BookingConfig) -> Result<AppState> {
    config.validate()?;

    info!("Setting up in-memory store");
    let today = CalendarService::new().today();
    let demo_days = config.booking_window_days.unwrap_or(60);
    let connection = MemoryConnection::with_demo_data(today, demo_days).await;

    info!("Setting up application state");
    Ok(AppState::new(connection))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, server: &ServerConfig) -> Result<Router> {
    let origin = server
        .allowed_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid allowed origin '{}'", server.allowed_origin))?;

    // CORS setup to allow the web frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .nest("/tutors", io::rest::tutor_apis::router())
        .nest("/bookings", io::rest::booking_apis::router());

    Ok(Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state))
}
