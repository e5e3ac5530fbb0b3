use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{delete, get},
    Router,
};
use shared::{Booking, CreateBookingRequest};
use tracing::info;

use super::{bearer_session, service_error_response, ApiResult};
use crate::backend::storage::traits::{BookingStore, ServiceError};
use crate::backend::AppState;

/// Create a router for booking related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bookings).post(create_booking))
        .route("/:id", delete(cancel_booking))
}

async fn create_booking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateBookingRequest>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    info!("POST /api/bookings - request: {:?}", request);
    let session = bearer_session(&headers)?;

    let booking = state
        .booking_repository
        .create_booking(&session, &request)
        .await
        .map_err(service_error_response)?;

    Ok((StatusCode::CREATED, Json(booking)))
}

async fn list_bookings(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<Vec<Booking>>> {
    info!("GET /api/bookings");
    let session = bearer_session(&headers)?;

    state
        .booking_repository
        .user_bookings(&session)
        .await
        .map(Json)
        .map_err(service_error_response)
}

async fn cancel_booking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
) -> ApiResult<StatusCode> {
    info!("DELETE /api/bookings/{}", booking_id);
    let session = bearer_session(&headers)?;

    if let Err(e) = Booking::parse_id(&booking_id) {
        return Err(service_error_response(ServiceError::NotFound(format!(
            "Booking '{}' ({})",
            booking_id, e
        ))));
    }

    state
        .booking_repository
        .cancel_booking(&session, &booking_id)
        .await
        .map_err(service_error_response)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::memory::{MemoryConnection, ScheduledSlot};
    use crate::backend::storage::AvailabilityRepository;
    use crate::backend::storage::BookingRepository;
    use axum::{
        body::Body,
        http::{Method, Request},
    };
    use chrono::NaiveDate;
    use serde_json::json;
    use shared::{ApiErrorResponse, BookingStatus, TutorDetails};
    use tower::util::ServiceExt; // for `oneshot`

    async fn setup_test_app() -> Router {
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
                NaiveDate::from_ymd_opt(2025, 6, 13).unwrap(),
                vec![
                    ScheduledSlot::new("09:00".parse().unwrap()),
                    ScheduledSlot::new("10:00".parse().unwrap()),
                ],
            )
            .await;

        let app_state = AppState {
            availability_repository: AvailabilityRepository::new(connection.clone()),
            booking_repository: BookingRepository::new(connection),
        };
        router().with_state(app_state)
    }

    fn request(method: Method, uri: &str, token: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn booking_body(time: &str) -> serde_json::Value {
        json!({
            "tutor_id": "tutor-1",
            "date": "2025-06-13",
            "time": time,
            "duration": 60,
            "subject": "Mathematics"
        })
    }

    async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
    }

    #[tokio::test]
    async fn test_create_booking() {
        let app = setup_test_app().await;

        let response = app
            .oneshot(request(Method::POST, "/", Some("student-1"), Some(booking_body("09:00"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let booking: Booking = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(booking.student_id, "student-1");
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.price, 40.0);
    }

    #[tokio::test]
    async fn test_double_booking_returns_conflict() {
        let app = setup_test_app().await;

        let first = app
            .clone()
            .oneshot(request(Method::POST, "/", Some("student-1"), Some(booking_body("10:00"))))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app
            .oneshot(request(Method::POST, "/", Some("student-2"), Some(booking_body("10:00"))))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);

        let error: ApiErrorResponse = serde_json::from_slice(&body_bytes(second).await).unwrap();
        assert_eq!(error.message, "This time slot is no longer available. Please choose another time.");
    }

    #[tokio::test]
    async fn test_requires_bearer_token() {
        let app = setup_test_app().await;

        let response = app
            .clone()
            .oneshot(request(Method::POST, "/", None, Some(booking_body("09:00"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app.oneshot(request(Method::GET, "/", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_list_and_cancel_bookings() {
        let app = setup_test_app().await;

        let created = app
            .clone()
            .oneshot(request(Method::POST, "/", Some("student-1"), Some(booking_body("09:00"))))
            .await
            .unwrap();
        let booking: Booking = serde_json::from_slice(&body_bytes(created).await).unwrap();

        let response = app
            .clone()
            .oneshot(request(Method::DELETE, &format!("/{}", booking.id), Some("student-1"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/", Some("student-1"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bookings: Vec<Booking> = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].status, BookingStatus::Cancelled);

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/", Some("student-2"), None))
            .await
            .unwrap();
        let bookings: Vec<Booking> = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(bookings.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_unknown_booking() {
        let app = setup_test_app().await;

        let response = app
            .clone()
            .oneshot(request(Method::DELETE, "/booking::does-not-exist", Some("student-1"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(request(Method::DELETE, "/not-a-booking-id", Some("student-1"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
