use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Domain error taxonomy surfaced by every handler.
///
/// Not-found and conflict variants map to 4xx without retry semantics on the
/// same resource; database and pool failures roll the enclosing transaction
/// back and surface as opaque 500s.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Service not found")]
    ServiceNotFound,

    #[error("Time slot not found")]
    SlotNotFound,

    #[error("Time slot not available")]
    SlotUnavailable,

    #[error("Time slot is fully booked")]
    SlotFullyBooked,

    #[error("Booking not found")]
    BookingNotFound,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    AuthenticationFailed(String),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("connection pool error: {0}")]
    Pool(String),
}

impl From<shared::InvalidStatus> for BookingError {
    fn from(err: shared::InvalidStatus) -> Self {
        BookingError::Validation(err.to_string())
    }
}

impl From<bb8::RunError<diesel_async::pooled_connection::PoolError>> for BookingError {
    fn from(err: bb8::RunError<diesel_async::pooled_connection::PoolError>) -> Self {
        BookingError::Pool(err.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl BookingError {
    fn status_code(&self) -> StatusCode {
        match self {
            BookingError::ServiceNotFound
            | BookingError::BookingNotFound
            | BookingError::SlotNotFound => StatusCode::NOT_FOUND,
            BookingError::SlotUnavailable | BookingError::SlotFullyBooked => StatusCode::CONFLICT,
            BookingError::Validation(_) => StatusCode::BAD_REQUEST,
            BookingError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            BookingError::Database(_) | BookingError::Pool(_) | BookingError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("internal error: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
