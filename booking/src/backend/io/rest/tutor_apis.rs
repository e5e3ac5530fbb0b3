use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::{parse_month_key, AvailableDatesResponse, TimeSlotsResponse, TutorDetails};
use tracing::info;

use super::{api_error, service_error_response, ApiResult};
use crate::backend::storage::traits::{AvailabilityProvider, TutorDirectory};
use crate::backend::AppState;

// Query parameters for the available dates API
#[derive(Debug, Deserialize)]
pub struct AvailableDatesQuery {
    pub month: Option<String>,
}

// Query parameters for the time slots API
#[derive(Debug, Deserialize)]
pub struct TimeSlotsQuery {
    pub date: String,
}

/// Create a router for tutor related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id", get(get_tutor))
        .route("/:id/available-dates", get(get_available_dates))
        .route("/:id/time-slots", get(get_time_slots))
}

async fn get_tutor(State(state): State<AppState>, Path(tutor_id): Path<String>) -> ApiResult<Json<TutorDetails>> {
    info!("GET /api/tutors/{}", tutor_id);

    state
        .availability_repository
        .tutor_details(&tutor_id)
        .await
        .map(Json)
        .map_err(service_error_response)
}

async fn get_available_dates(
    State(state): State<AppState>,
    Path(tutor_id): Path<String>,
    Query(query): Query<AvailableDatesQuery>,
) -> ApiResult<Json<AvailableDatesResponse>> {
    info!("GET /api/tutors/{}/available-dates - query: {:?}", tutor_id, query);

    let month = match query.month.as_deref() {
        Some(raw) => Some(
            parse_month_key(raw)
                .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, format!("Invalid month '{}', expected YYYY-MM", raw)))?,
        ),
        None => None,
    };

    let dates = state
        .availability_repository
        .available_dates(&tutor_id, month)
        .await
        .map_err(service_error_response)?;

    Ok(Json(AvailableDatesResponse { tutor_id, dates }))
}

async fn get_time_slots(
    State(state): State<AppState>,
    Path(tutor_id): Path<String>,
    Query(query): Query<TimeSlotsQuery>,
) -> ApiResult<Json<TimeSlotsResponse>> {
    info!("GET /api/tutors/{}/time-slots - query: {:?}", tutor_id, query);

    let date = NaiveDate::parse_from_str(&query.date, "%Y-%m-%d").map_err(|_| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Invalid date '{}', expected YYYY-MM-DD", query.date),
        )
    })?;

    let slots = state
        .availability_repository
        .available_time_slots(&tutor_id, date)
        .await
        .map_err(service_error_response)?;

    Ok(Json(TimeSlotsResponse { tutor_id, date, slots }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::memory::{MemoryConnection, ScheduledSlot};
    use crate::backend::storage::{AvailabilityRepository, BookingRepository};
    use axum::{
        body::Body,
        http::{Method, Request},
    };
    use shared::ApiErrorResponse;
    use tower::util::ServiceExt; // for `oneshot`

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn setup_test_app() -> Router {
        let connection = MemoryConnection::new();
        connection
            .add_tutor(TutorDetails {
                id: "tutor-1".to_string(),
                name: "Ada Lovelace".to_string(),
                subject: "Mathematics".to_string(),
                hourly_rate: 40.0,
                timezone: Some("Europe/London".to_string()),
            })
            .await;
        connection
            .set_schedule(
                "tutor-1",
                date(2025, 6, 13),
                vec![
                    ScheduledSlot::new("09:00".parse().unwrap()),
                    ScheduledSlot::priced("18:00".parse().unwrap(), 50.0),
                ],
            )
            .await;
        connection
            .set_schedule("tutor-1", date(2025, 7, 1), vec![ScheduledSlot::new("10:00".parse().unwrap())])
            .await;

        let app_state = AppState {
            availability_repository: AvailabilityRepository::new(connection.clone()),
            booking_repository: BookingRepository::new(connection),
        };
        router().with_state(app_state)
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_get_tutor() {
        let app = setup_test_app().await;

        let (status, body) = get(app.clone(), "/tutor-1").await;
        assert_eq!(status, StatusCode::OK);
        let tutor: TutorDetails = serde_json::from_slice(&body).unwrap();
        assert_eq!(tutor.name, "Ada Lovelace");
        assert_eq!(tutor.timezone.as_deref(), Some("Europe/London"));

        let (status, body) = get(app, "/nobody").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let error: ApiErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(error.message.contains("nobody"));
    }

    #[tokio::test]
    async fn test_available_dates_by_month() {
        let app = setup_test_app().await;

        let (status, body) = get(app.clone(), "/tutor-1/available-dates?month=2025-06").await;
        assert_eq!(status, StatusCode::OK);
        let response: AvailableDatesResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.dates, vec![date(2025, 6, 13)]);

        let (status, body) = get(app.clone(), "/tutor-1/available-dates").await;
        assert_eq!(status, StatusCode::OK);
        let response: AvailableDatesResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.dates.len(), 2);

        let (status, _) = get(app, "/tutor-1/available-dates?month=2025-13").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_time_slots() {
        let app = setup_test_app().await;

        let (status, body) = get(app.clone(), "/tutor-1/time-slots?date=2025-06-13").await;
        assert_eq!(status, StatusCode::OK);
        let response: TimeSlotsResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.date, date(2025, 6, 13));
        assert_eq!(response.slots.len(), 2);
        assert_eq!(response.slots[1].price, Some(50.0));

        let (status, _) = get(app, "/tutor-1/time-slots?date=13-06-2025").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
