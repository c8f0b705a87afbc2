//! Gemini vision extraction over the REST `generateContent` API.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use schedulify_core::error::ScheduleResult;
use schedulify_core::model_output::parse_model_output;
use serde::{Deserialize, Serialize};

use super::{Extraction, ScheduleExtractor, TextRecognizer, Upload, upstream};

const PROMPT: &str = r#"You are an expert at extracting university class schedules from screenshots.

Return ONLY a JSON array (no extra text). Each item is:
{
  "title": "Course title or code",
  "days": "e.g., MWF or Mon/Wed/Fri or Tu/Th",
  "start_time": "e.g., 12:00PM",
  "end_time": "e.g., 2:45PM",
  "location": "optional room/building",
  "instructor": "optional",
  "notes": "optional",
  "termLabel": "optional short label for the term"
}

Rules:
- If multiple meeting days exist, keep them in a compact or slash form (e.g., "MWF" or "Mon/Wed/Fri"); do NOT expand them to dates.
- Times MUST include AM/PM if the source uses them.
- If a field is missing, omit it rather than inventing values.
- Respond with ONLY valid JSON. Do not wrap in backticks or add prose."#;

pub struct Gemini {
    pub client: reqwest::Client,
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    /// OCR transcription sent alongside the image when available.
    pub ocr_hint: Option<Arc<dyn TextRecognizer>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("")
    }
}

impl Gemini {
    fn request_body(upload: &Upload, hint: Option<String>) -> GenerateRequest {
        let mut parts = vec![
            Part {
                text: Some(PROMPT.to_string()),
                inline_data: None,
            },
            Part {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: upload.content_type.clone(),
                    data: STANDARD.encode(&upload.bytes),
                }),
            },
        ];

        if let Some(hint) = hint.filter(|h| !h.trim().is_empty()) {
            parts.push(Part {
                text: Some(format!("OCR transcription (may be noisy):\n{}", hint)),
                inline_data: None,
            });
        }

        GenerateRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                response_mime_type: "application/json",
            },
        }
    }

    async fn hint(&self, upload: &Upload) -> Option<String> {
        let recognizer = self.ocr_hint.as_ref()?;
        match recognizer.recognize(upload).await {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(error = %e, "OCR hint unavailable");
                None
            }
        }
    }
}

#[async_trait]
impl ScheduleExtractor for Gemini {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn extract(&self, upload: &Upload, _timezone: &str) -> ScheduleResult<Extraction> {
        let body = Self::request_body(upload, self.hint(upload).await);
        let url = format!("{}/{}:generateContent", self.endpoint.trim_end_matches('/'), self.model);

        tracing::info!(model = %self.model, bytes = upload.bytes.len(), "calling Gemini");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| upstream("Gemini request failed", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(upstream(format!("Gemini returned {}", status), raw));
        }

        let text = response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| upstream("Unexpected Gemini response", e.to_string()))?
            .text();

        Ok(Extraction::Payload(parse_model_output(&text)?))
    }
}
