//! Calendar export for reviewed events.

use axum::{Json, Router, extract::State, response::Response, routing::post};
use schedulify_core::CalendarRequest;
use schedulify_core::pipeline::export_request;

use crate::routes::{AppError, ics_response};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ics", post(make_ics))
        .route("/make-ics", post(make_ics))
}

/// POST /ics - Events and window in, `schedule.ics` out
async fn make_ics(
    State(state): State<AppState>,
    Json(req): Json<CalendarRequest>,
) -> Result<Response, AppError> {
    let bytes = export_request(&req, &state.settings)?;
    Ok(ics_response(bytes))
}
