//! HTTP client for the booking REST API.
//!
//! Implements the collaborator traits over the endpoints served by
//! [`crate::backend::create_router`], so the booking core can run against a
//! remote server exactly as it runs against the in-memory store.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use shared::{
    format_month_key, ApiErrorResponse, AvailableDatesResponse, Booking, CreateBookingRequest, TimeSlot,
    TimeSlotsResponse, TutorDetails,
};
use tracing::debug;

use crate::backend::config::ClientConfig;
use crate::backend::storage::traits::{
    AvailabilityProvider, BookingStore, ServiceError, ServiceResult, SessionContext, TutorDirectory,
};

#[derive(Debug, thiserror::Error)]
pub enum ClientSetupError {
    #[error("Invalid API base URL '{0}'")]
    BaseUrl(String),
    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct HttpBookingClient {
    client: Client,
    base_url: Url,
}

impl HttpBookingClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientSetupError> {
        let base_url = Url::parse(&config.api_base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ClientSetupError::BaseUrl(config.api_base_url.clone()))?;
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self { client, base_url })
    }

    /// `<base>/api/<segments..>`, each segment percent-encoded on its own
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }
}

fn transport_error(e: reqwest::Error) -> ServiceError {
    ServiceError::Network(e.to_string())
}

/// Turn a non-success response into the matching [`ServiceError`]
async fn error_from_response(response: Response) -> ServiceError {
    let status = response.status();
    let message = match response.json::<ApiErrorResponse>().await {
        Ok(body) => body.message,
        Err(_) => status.canonical_reason().unwrap_or("Request failed").to_string(),
    };

    match status {
        StatusCode::CONFLICT => ServiceError::Conflict(message),
        StatusCode::NOT_FOUND => ServiceError::NotFound(message),
        StatusCode::UNAUTHORIZED => ServiceError::Unauthorized,
        status => ServiceError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ServiceResult<T> {
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }
    response
        .json::<T>()
        .await
        .map_err(|e| ServiceError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl TutorDirectory for HttpBookingClient {
    async fn tutor_details(&self, tutor_id: &str) -> ServiceResult<TutorDetails> {
        let response = self
            .client
            .get(self.url(&["tutors", tutor_id]))
            .send()
            .await
            .map_err(transport_error)?;
        decode(response).await
    }
}

#[async_trait]
impl AvailabilityProvider for HttpBookingClient {
    async fn available_dates(&self, tutor_id: &str, month: Option<(i32, u32)>) -> ServiceResult<Vec<NaiveDate>> {
        let mut request = self.client.get(self.url(&["tutors", tutor_id, "available-dates"]));
        if let Some((year, month)) = month {
            request = request.query(&[("month", format_month_key(year, month))]);
        }

        let response = request.send().await.map_err(transport_error)?;
        let body: AvailableDatesResponse = decode(response).await?;
        debug!("Fetched {} available dates for {}", body.dates.len(), tutor_id);
        Ok(body.dates)
    }

    async fn available_time_slots(&self, tutor_id: &str, date: NaiveDate) -> ServiceResult<Vec<TimeSlot>> {
        let response = self
            .client
            .get(self.url(&["tutors", tutor_id, "time-slots"]))
            .query(&[("date", date.format("%Y-%m-%d").to_string())])
            .send()
            .await
            .map_err(transport_error)?;
        let body: TimeSlotsResponse = decode(response).await?;
        Ok(body.slots)
    }
}

#[async_trait]
impl BookingStore for HttpBookingClient {
    async fn create_booking(&self, session: &SessionContext, request: &CreateBookingRequest) -> ServiceResult<Booking> {
        let response = self
            .client
            .post(self.url(&["bookings"]))
            .bearer_auth(&session.access_token)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;
        decode(response).await
    }

    async fn user_bookings(&self, session: &SessionContext) -> ServiceResult<Vec<Booking>> {
        let response = self
            .client
            .get(self.url(&["bookings"]))
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(transport_error)?;
        decode(response).await
    }

    async fn cancel_booking(&self, session: &SessionContext, booking_id: &str) -> ServiceResult<()> {
        let response = self
            .client
            .delete(self.url(&["bookings", booking_id]))
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::booking_flow::{BookingFlow, ConfirmationStage};
    use crate::backend::domain::booking_orchestrator::BookingOrchestrator;
    use crate::backend::domain::models::BookingError;
    use crate::backend::storage::memory::{MemoryConnection, ScheduledSlot};
    use crate::backend::{create_router, AppState, BookingConfig};
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Serve a seeded in-memory store on an ephemeral port
    async fn spawn_server() -> HttpBookingClient {
        let connection = MemoryConnection::new();
        connection
            .add_tutor(TutorDetails {
                id: "tutor-1".to_string(),
                name: "Ada Lovelace".to_string(),
                subject: "Mathematics".to_string(),
                hourly_rate: 40.0,
                timezone: None,
            })
            .await;
        connection
            .set_schedule(
                "tutor-1",
                date(2030, 6, 13),
                vec![
                    ScheduledSlot::new("09:00".parse().unwrap()),
                    ScheduledSlot::new("14:00".parse().unwrap()),
                ],
            )
            .await;

        let config = BookingConfig::default();
        let app = create_router(AppState::new(connection), &config.server).unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        HttpBookingClient::new(&ClientConfig {
            api_base_url: format!("http://{}", addr),
            request_timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_client_round_trip() {
        let client = spawn_server().await;
        let session = SessionContext::new("student-1", "student-1");

        let tutor = client.tutor_details("tutor-1").await.unwrap();
        assert_eq!(tutor.name, "Ada Lovelace");
        assert!(matches!(
            client.tutor_details("nobody").await,
            Err(ServiceError::NotFound(_))
        ));

        let dates = client.available_dates("tutor-1", Some((2030, 6))).await.unwrap();
        assert_eq!(dates, vec![date(2030, 6, 13)]);

        let slots = client.available_time_slots("tutor-1", date(2030, 6, 13)).await.unwrap();
        assert_eq!(slots.len(), 2);

        let request = CreateBookingRequest {
            tutor_id: "tutor-1".to_string(),
            date: date(2030, 6, 13),
            time: "09:00".to_string(),
            duration: 60,
            subject: None,
            notes: None,
        };
        let booking = client.create_booking(&session, &request).await.unwrap();
        assert_eq!(booking.student_id, "student-1");

        let other = SessionContext::new("student-2", "student-2");
        let conflict = client.create_booking(&other, &request).await;
        assert!(matches!(conflict, Err(ServiceError::Conflict(_))));

        client.cancel_booking(&session, &booking.id).await.unwrap();
        let bookings = client.user_bookings(&session).await.unwrap();
        assert_eq!(bookings.len(), 1);

        let anonymous = SessionContext::new("", "");
        assert_eq!(client.user_bookings(&anonymous).await, Err(ServiceError::Unauthorized));
    }

    #[tokio::test]
    async fn test_booking_flow_over_http() {
        let client = spawn_server().await;
        let config = BookingConfig::default();
        let today = date(2030, 6, 1);

        let mut flow = BookingFlow::open(&client, &client, "tutor-1", &config, today).await.unwrap();
        let ticket = flow.select_date(date(2030, 6, 13), today).unwrap().unwrap();
        flow.load_slots(&client, ticket).await;
        flow.select_time("14:00").unwrap();
        flow.review().unwrap();

        let orchestrator = BookingOrchestrator::new(
            Arc::new(client.clone()),
            SessionContext::new("student-1", "student-1"),
            config.default_duration_minutes,
        );
        let booking = flow.confirm(&orchestrator, None).await.unwrap();
        assert_eq!(booking.time, "14:00");
        assert!(matches!(flow.stage(), ConfirmationStage::Confirmed(_)));
        assert_eq!(orchestrator.user_bookings().await.unwrap().len(), 1);

        // A second student racing for the same slot loses
        let mut draft = crate::backend::domain::BookingDraft::new("tutor-1");
        draft.select_date(date(2030, 6, 13));
        draft.select_time("14:00".parse().unwrap(), None).unwrap();
        let rival = BookingOrchestrator::new(
            Arc::new(client.clone()),
            SessionContext::new("student-2", "student-2"),
            60,
        );
        let result = rival.confirm(&draft, flow.tutor(), None).await;
        assert!(matches!(result, Err(BookingError::Conflict { .. })));
    }

    #[test]
    fn test_ids_are_encoded_as_single_segments() {
        let client = HttpBookingClient::new(&ClientConfig {
            api_base_url: "http://localhost:3000/".to_string(),
            request_timeout_secs: 2,
        })
        .unwrap();

        assert_eq!(
            client.url(&["tutors", "tutor-1", "time-slots"]).as_str(),
            "http://localhost:3000/api/tutors/tutor-1/time-slots"
        );
        assert_eq!(
            client.url(&["tutors", "a/b c?"]).as_str(),
            "http://localhost:3000/api/tutors/a%2Fb%20c%3F"
        );

        let prefixed = HttpBookingClient::new(&ClientConfig {
            api_base_url: "https://tuteasy.example/v1".to_string(),
            request_timeout_secs: 2,
        })
        .unwrap();
        assert_eq!(
            prefixed.url(&["bookings"]).as_str(),
            "https://tuteasy.example/v1/api/bookings"
        );

        let invalid = HttpBookingClient::new(&ClientConfig {
            api_base_url: "mailto:tutor@example.com".to_string(),
            request_timeout_secs: 2,
        });
        assert!(matches!(invalid, Err(ClientSetupError::BaseUrl(_))));
    }

    #[tokio::test]
    async fn test_tutor_id_with_slash_stays_one_path_segment() {
        let client = spawn_server().await;
        // Unencoded, this would hit the time-slots route of tutor-1
        let result = client.tutor_details("tutor-1/time-slots").await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_network_error() {
        let client = HttpBookingClient::new(&ClientConfig {
            api_base_url: "http://127.0.0.1:1".to_string(),
            request_timeout_secs: 2,
        })
        .unwrap();

        let result = client.tutor_details("tutor-1").await;
        assert!(matches!(result, Err(ServiceError::Network(_))));
    }
}
