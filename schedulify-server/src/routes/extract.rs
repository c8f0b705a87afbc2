//! Extraction endpoints: screenshot or text in, events out.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    response::Response,
    routing::post,
};
use chrono::NaiveDate;
use schedulify_core::date_range::resolve_timezone;
use schedulify_core::error::{ScheduleError, ScheduleResult};
use schedulify_core::pipeline::{export_calendar, report_from_payload, report_from_text};
use schedulify_core::{ExtractionReport, Settings};
use serde::Deserialize;

use crate::extractor::{Extraction, Upload};
use crate::routes::{AppError, ics_response};
use crate::state::AppState;

/// Screenshots and PDFs routinely exceed axum's 2 MB default.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/extract", post(extract))
        .route("/extract-gemini", post(extract))
        .route("/extract-to-ics", post(extract_to_ics))
        .route("/extract-text", post(extract_text))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// Optional window fields sent alongside an upload.
#[derive(Debug, Default, Deserialize)]
pub struct WindowFields {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub timezone: Option<String>,
}

fn date_field(field: &'static str, raw: &str) -> ScheduleResult<Option<NaiveDate>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ScheduleError::format(field, format!("'{}' is not a YYYY-MM-DD date", raw)))
}

fn accepts(content_type: &str) -> bool {
    content_type.starts_with("image/") || content_type == "application/pdf"
}

/// Read the `file` part and window fields; unknown parts are ignored.
async fn read_form(mut multipart: Multipart) -> Result<(Upload, WindowFields), AppError> {
    let mut upload = None;
    let mut window = WindowFields::default();

    while let Some(field) = multipart.next_field().await.map_err(AppError::bad_request)? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                if !accepts(&content_type) {
                    return Err(AppError::bad_request(anyhow::anyhow!(
                        "Please upload an image file (png/jpg/pdf)."
                    )));
                }
                let bytes = field.bytes().await.map_err(AppError::bad_request)?;
                upload = Some(Upload {
                    bytes: bytes.to_vec(),
                    content_type,
                });
            }
            "start_date" | "end_date" | "timezone" => {
                let text = field.text().await.map_err(AppError::bad_request)?;
                match name.as_str() {
                    "start_date" => window.start_date = date_field("start_date", &text)?,
                    "end_date" => window.end_date = date_field("end_date", &text)?,
                    _ => window.timezone = Some(text.trim().to_string()).filter(|tz| !tz.is_empty()),
                }
            }
            other => tracing::debug!(field = other, "ignoring form field"),
        }
    }

    let upload = upload.ok_or_else(|| AppError::bad_request(anyhow::anyhow!("Missing file upload")))?;
    Ok((upload, window))
}

fn report_for(
    extraction: Extraction,
    window: &WindowFields,
    settings: &Settings,
) -> ScheduleResult<ExtractionReport> {
    match extraction {
        Extraction::Payload(raw) => {
            // Some models echo the timezone they were given
            let timezone = window
                .timezone
                .clone()
                .or_else(|| raw.get("timezone").and_then(|tz| tz.as_str()).map(str::to_string));
            report_from_payload(&raw, window.start_date, window.end_date, timezone.as_deref(), settings)
        }
        Extraction::Text(text) => report_from_text(
            &text,
            window.start_date,
            window.end_date,
            window.timezone.as_deref(),
            settings,
        ),
    }
}

async fn run_extraction(state: &AppState, multipart: Multipart) -> Result<(ExtractionReport, WindowFields), AppError> {
    let (upload, window) = read_form(multipart).await?;
    let tz = resolve_timezone(
        window.timezone.as_deref(),
        state.settings.default_timezone.as_deref(),
    )?;

    tracing::info!(
        extractor = state.extractor.name(),
        content_type = %upload.content_type,
        bytes = upload.bytes.len(),
        "extracting schedule"
    );

    let extraction = state.extractor.extract(&upload, tz.name()).await?;
    let report = report_for(extraction, &window, &state.settings)?;
    Ok((report, window))
}

/// POST /extract - Screenshot to events, for review
async fn extract(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractionReport>, AppError> {
    let (report, _) = run_extraction(&state, multipart).await?;
    Ok(Json(report))
}

/// POST /extract-to-ics - Screenshot straight to a calendar file
async fn extract_to_ics(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let (report, window) = run_extraction(&state, multipart).await?;

    let bytes = export_calendar(
        report.events,
        window.start_date,
        window.end_date,
        Some(report.timezone.as_str()),
        None,
        &state.settings,
    )?;

    Ok(ics_response(bytes))
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
    #[serde(flatten)]
    pub window: WindowFields,
}

/// POST /extract-text - OCR text to events, using the offline detector
async fn extract_text(
    State(state): State<AppState>,
    Json(req): Json<TextRequest>,
) -> Result<Json<ExtractionReport>, AppError> {
    let report = report_from_text(
        &req.text,
        req.window.start_date,
        req.window.end_date,
        req.window.timezone.as_deref(),
        &state.settings,
    )?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::json;

    use crate::extractor::Extraction;
    use crate::routes::test_support::{app, body_json, body_text, json_request, send};

    const BOUNDARY: &str = "schedulify-test-boundary";

    /// (name, content type for file parts, value)
    fn multipart(uri: &str, parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, content_type, value) in parts {
            body.push_str(&format!("--{}\r\n", BOUNDARY));
            match content_type {
                Some(ct) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"upload\"\r\nContent-Type: {}\r\n\r\n",
                    name, ct
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    name
                )),
            }
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));

        Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn canned_payload() -> Option<Extraction> {
        Some(Extraction::Payload(json!({"classes": [
            {"title": "CS 4661", "days": "MW", "start_time": "9:00AM", "end_time": "9:50AM", "location": "ASCB 132"},
            {"title": "Office hours", "days": "??", "start_time": "1PM", "end_time": "2PM"}
        ]})))
    }

    #[tokio::test]
    async fn extract_reports_missing_dates() {
        let request = multipart(
            "/extract",
            &[
                ("file", Some("image/png"), "PNG"),
                ("timezone", None, "America/Los_Angeles"),
                ("include_heuristic_hint", None, "true"),
            ],
        );
        let response = send(app(canned_payload()), request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["events"].as_array().unwrap().len(), 1, "{json}");
        assert_eq!(json["events"][0]["days"], json!(["MO", "WE"]));
        assert_eq!(json["timezone"], "America/Los_Angeles");
        assert_eq!(json["needs_dates"], true);
        assert_eq!(
            json["note"],
            "Add the term's start and end dates before exporting to calendar."
        );
    }

    #[tokio::test]
    async fn extract_with_window_is_complete() {
        let request = multipart(
            "/extract-gemini",
            &[
                ("file", Some("application/pdf"), "%PDF"),
                ("start_date", None, "2025-01-06"),
                ("end_date", None, "2025-03-14"),
            ],
        );
        let json = body_json(send(app(canned_payload()), request).await).await;
        assert_eq!(json["needs_dates"], false);
        assert_eq!(json["inferred_start"], "2025-01-06");
        assert_eq!(json["events"][0]["end_date"], "2025-03-14");
    }

    #[tokio::test]
    async fn rejects_non_image_upload() {
        let request = multipart("/extract", &[("file", Some("text/plain"), "hello")]);
        let response = send(app(canned_payload()), request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("Please upload an image file"));
    }

    #[tokio::test]
    async fn rejects_missing_file_and_bad_dates() {
        let request = multipart("/extract", &[("timezone", None, "UTC")]);
        let response = send(app(canned_payload()), request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let request = multipart(
            "/extract",
            &[("file", Some("image/png"), "PNG"), ("start_date", None, "01/06/2025")],
        );
        let response = send(app(canned_payload()), request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("start_date"));
    }

    #[tokio::test]
    async fn upstream_failure_is_bad_gateway() {
        let request = multipart("/extract", &[("file", Some("image/jpeg"), "JPG")]);
        let response = send(app(None), request).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(body_text(response).await.contains("upstream unavailable"));
    }

    #[tokio::test]
    async fn unknown_timezone_is_client_error() {
        let request = multipart(
            "/extract",
            &[("file", Some("image/png"), "PNG"), ("timezone", None, "Nowhere/Special")],
        );
        let response = send(app(canned_payload()), request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn extract_to_ics_streams_attachment() {
        let request = multipart(
            "/extract-to-ics",
            &[
                ("file", Some("image/png"), "PNG"),
                ("start_date", None, "2025-01-06"),
                ("end_date", None, "2025-03-02"),
                ("timezone", None, "America/Los_Angeles"),
            ],
        );
        let response = send(app(canned_payload()), request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"schedule.ics\""
        );
        assert!(
            response.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/calendar")
        );

        let ics = body_text(response).await;
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2, "ICS:\n{}", ics);
        assert!(ics.contains("UNTIL=20250303T075959Z"), "ICS:\n{}", ics);
    }

    #[tokio::test]
    async fn extract_to_ics_needs_a_window() {
        let request = multipart("/extract-to-ics", &[("file", Some("image/png"), "PNG")]);
        let response = send(app(canned_payload()), request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("Missing date range"));
    }

    #[tokio::test]
    async fn text_extraction_uses_term_dates() {
        let canned = Some(Extraction::Text(
            "Fall 2025\nAugust 25, 2025 - December 12, 2025\nCHEM 210\nMWF 8am - 8:50am\n".to_string(),
        ));
        let request = multipart("/extract-to-ics", &[("file", Some("image/png"), "PNG")]);
        let response = send(app(canned), request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let ics = body_text(response).await;
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 3, "ICS:\n{}", ics);
        assert!(ics.contains("Term: Fall 2025"), "ICS:\n{}", ics);
    }

    #[tokio::test]
    async fn extract_text_endpoint() {
        let request = json_request(
            "/extract-text",
            json!({
                "text": "Spring 2026\nBIO 101\nTuTh 10:30am - 11:45am\n",
                "timezone": "America/New_York",
                "start_date": "2026-01-12"
            }),
        );
        let response = send(app(None), request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["events"][0]["days"], json!(["TU", "TH"]));
        assert_eq!(json["events"][0]["termLabel"], "Spring 2026");
        assert_eq!(json["term"]["label"], "Spring 2026");
        assert_eq!(json["needs_dates"], true);
        assert_eq!(json["inferred_end"], "2026-02-15");
    }
}
