//! Local Ollama model over OCR text.

use std::sync::Arc;

use async_trait::async_trait;
use schedulify_core::error::ScheduleResult;
use schedulify_core::model_output::parse_model_output;
use serde::{Deserialize, Serialize};

use super::{Extraction, ScheduleExtractor, TextRecognizer, Upload, upstream};

const SCHEMA_HINT: &str = r#"Return JSON object: {"events":[{ "title": str,
"days": ["MO","TU","WE","TH","FR","SA","SU"],
"start_time":"HH:MM","end_time":"HH:MM",
"start_date": "YYYY-MM-DD|null", "end_date":"YYYY-MM-DD|null",
"location": "str|null", "instructor":"str|null", "notes":"str|null", "termLabel":"str|null"}], "timezone": "<IANA name>"}
- Use only MO,TU,WE,TH,FR,SA,SU for days.
- Times must be 24h HH:MM.
- If a course has lecture and lab, output separate event entries.
- Do not invent data not present in the text."#;

pub struct Ollama {
    pub client: reqwest::Client,
    pub host: String,
    pub model: String,
    pub recognizer: Arc<dyn TextRecognizer>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

fn prompt(ocr_text: &str, timezone: &str) -> String {
    format!(
        "You are converting OCR text of a university class schedule into a strict JSON object for calendar import.\n\
         \n\
         Rules:\n\
         - Use ONLY the keys and structure described below.\n\
         - Times must be 24h (HH:MM). If AM/PM is missing and not inferrable, skip that event.\n\
         - Day codes must be MO,TU,WE,TH,FR,SA,SU.\n\
         - If a date range for the term is present, copy it into start_date and end_date for each event; else set them to null.\n\
         - Keep titles concise if possible (course code + name), but never hallucinate.\n\
         - The schedule's timezone is {timezone}.\n\
         \n\
         {SCHEMA_HINT}\n\
         \n\
         OCR TEXT:\n\
         {ocr_text}\n\
         \n\
         Reply with JSON only (no markdown, no commentary).\n"
    )
}

#[async_trait]
impl ScheduleExtractor for Ollama {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn extract(&self, upload: &Upload, timezone: &str) -> ScheduleResult<Extraction> {
        let text = self.recognizer.recognize(upload).await?;
        let url = format!("{}/api/generate", self.host.trim_end_matches('/'));

        tracing::info!(model = %self.model, chars = text.len(), "calling Ollama");

        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt: prompt(&text, timezone),
                stream: false,
            })
            .send()
            .await
            .map_err(|e| upstream("Ollama request failed", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(upstream(format!("Ollama returned {}", status), raw));
        }

        let reply = response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| upstream("Unexpected Ollama response", e.to_string()))?;

        Ok(Extraction::Payload(parse_model_output(&reply.response)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_text_and_timezone() {
        let prompt = prompt("CS 101 MWF 9:00-9:50", "America/Denver");
        assert!(prompt.contains("OCR TEXT:\nCS 101 MWF 9:00-9:50\n"), "Got:\n{}", prompt);
        assert!(prompt.contains("timezone is America/Denver"), "Got:\n{}", prompt);
        assert!(prompt.contains(r#""days": ["MO","TU","WE","TH","FR","SA","SU"]"#), "Got:\n{}", prompt);
    }
}
