pub mod calendar;
pub mod extract;
pub mod health;

use axum::{
    Json, Router,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use schedulify_core::ScheduleError;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// All routes, with state applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(extract::router())
        .merge(calendar::router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Convert errors to HTTP responses.
///
/// Pipeline errors caused by the request map to 400 and upstream extraction
/// failures to 502; everything else is a 500.
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn bad_request(error: impl Into<anyhow::Error>) -> Self {
        AppError {
            status: StatusCode::BAD_REQUEST,
            error: error.into(),
        }
    }
}

fn status_for(error: &anyhow::Error) -> StatusCode {
    match error.downcast_ref::<ScheduleError>() {
        Some(ScheduleError::ExternalExtraction { .. }) => StatusCode::BAD_GATEWAY,
        Some(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.error, "request failed");
        } else {
            tracing::debug!(status = %self.status, error = %self.error, "request rejected");
        }

        let body = Json(ErrorResponse {
            error: self.error.to_string(),
        });
        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let error = err.into();
        AppError {
            status: status_for(&error),
            error,
        }
    }
}

/// Serve calendar bytes as a `schedule.ics` download.
pub fn ics_response(bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"schedule.ics\""),
        ],
        bytes,
    )
        .into_response()
}
