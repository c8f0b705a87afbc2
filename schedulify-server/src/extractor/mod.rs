//! Collaborators that turn uploaded screenshots into schedule data.
//!
//! The core never talks to OCR engines or language models itself. Each
//! backend here produces either a JSON payload for the adapter or plain text
//! for the offline block detector.

pub mod gemini;
pub mod heuristic;
pub mod ocr;
pub mod ollama;

use std::sync::Arc;

use async_trait::async_trait;
use schedulify_core::error::{ScheduleError, ScheduleResult};
use serde_json::Value;

use crate::server_config::{ExtractorKind, ServerSettings};

/// An uploaded file.
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl Upload {
    pub fn is_pdf(&self) -> bool {
        self.content_type == "application/pdf"
    }
}

/// What an extractor hands back.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Model output, already recovered from any surrounding prose
    Payload(Value),
    /// Raw OCR text for the offline detector
    Text(String),
}

/// OCR capability: image bytes in, text out.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, upload: &Upload) -> ScheduleResult<String>;
}

#[async_trait]
pub trait ScheduleExtractor: Send + Sync {
    /// Backend name, for logs and the health endpoint.
    fn name(&self) -> &'static str;

    async fn extract(&self, upload: &Upload, timezone: &str) -> ScheduleResult<Extraction>;
}

/// Failure talking to an upstream service.
pub(crate) fn upstream(message: impl Into<String>, raw: impl Into<String>) -> ScheduleError {
    ScheduleError::ExternalExtraction {
        message: message.into(),
        raw: raw.into(),
    }
}

/// Build the configured extractor.
pub fn from_settings(settings: &ServerSettings) -> anyhow::Result<Arc<dyn ScheduleExtractor>> {
    let recognizer = ocr::Tesseract::from_settings(settings);
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()?;

    let extractor: Arc<dyn ScheduleExtractor> = match settings.extractor_kind() {
        ExtractorKind::Gemini => {
            let api_key = settings
                .gemini_api_key
                .clone()
                .ok_or_else(|| anyhow::anyhow!("GEMINI_API_KEY / GOOGLE_API_KEY not set"))?;
            let hint = match recognizer {
                Ok(tesseract) if settings.ocr_hint => {
                    Some(Arc::new(tesseract) as Arc<dyn TextRecognizer>)
                }
                _ => None,
            };
            Arc::new(gemini::Gemini {
                client,
                endpoint: settings.gemini_endpoint.clone(),
                model: settings.gemini_model.clone(),
                api_key,
                ocr_hint: hint,
            })
        }
        ExtractorKind::Ollama => Arc::new(ollama::Ollama {
            client,
            host: settings.ollama_host.clone(),
            model: settings.ollama_model.clone(),
            recognizer: Arc::new(recognizer?),
        }),
        ExtractorKind::Heuristic => Arc::new(heuristic::Heuristic {
            recognizer: Arc::new(recognizer?),
        }),
    };

    tracing::info!(extractor = extractor.name(), "extractor ready");
    Ok(extractor)
}
