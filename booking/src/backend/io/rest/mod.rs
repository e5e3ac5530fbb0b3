//! # REST API Interface Layer
//!
//! HTTP endpoints of the reference collaborator server. Handlers translate
//! requests into calls on the in-memory repositories and map
//! [`ServiceError`] values onto status codes with an [`ApiErrorResponse`]
//! body, which the HTTP client maps back.
//!
//! ## Endpoints
//!
//! - `GET /api/tutors/:id`
//! - `GET /api/tutors/:id/available-dates?month=YYYY-MM`
//! - `GET /api/tutors/:id/time-slots?date=YYYY-MM-DD`
//! - `GET /api/bookings`, `POST /api/bookings`
//! - `DELETE /api/bookings/:id`
//!
//! Booking endpoints need an `Authorization: Bearer <token>` header. Sign-in
//! is handled elsewhere, so the token is taken as the student id.

pub mod booking_apis;
pub mod tutor_apis;

use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use shared::ApiErrorResponse;
use tracing::{error, warn};

use crate::backend::storage::traits::{ServiceError, SessionContext};

pub type ApiError = (StatusCode, Json<ApiErrorResponse>);
pub type ApiResult<T> = Result<T, ApiError>;

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ApiErrorResponse::new(message)))
}

/// Map a repository failure onto the response the client expects
pub fn service_error_response(e: ServiceError) -> ApiError {
    let status = match &e {
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
        ServiceError::Rejected { status, .. } => StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST),
        ServiceError::Network(_) => StatusCode::BAD_GATEWAY,
        ServiceError::InvalidResponse(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("Request failed: {}", e);
    } else {
        warn!("Request rejected with {}: {}", status, e);
    }

    let message = match e {
        // Conflict and rejection texts go to the user untouched
        ServiceError::Conflict(message) | ServiceError::Rejected { message, .. } => message,
        other => other.to_string(),
    };
    api_error(status, message)
}

/// Session of the caller, from the bearer token
pub fn bearer_session(headers: &HeaderMap) -> ApiResult<SessionContext> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| service_error_response(ServiceError::Unauthorized))?;
    Ok(SessionContext::new(token, token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_session() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_session(&headers).unwrap_err().0, StatusCode::UNAUTHORIZED);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_session(&headers).unwrap_err().0, StatusCode::UNAUTHORIZED);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer student-7"));
        assert_eq!(bearer_session(&headers).unwrap().student_id, "student-7");
    }

    #[test]
    fn test_status_mapping() {
        let (status, Json(body)) = service_error_response(ServiceError::Conflict("Slot taken".to_string()));
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.message, "Slot taken");

        let (status, _) = service_error_response(ServiceError::Rejected {
            status: 422,
            message: "Bad duration".to_string(),
        });
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = service_error_response(ServiceError::NotFound("Tutor 'x'".to_string()));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
