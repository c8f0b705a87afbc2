//! Offline extraction: OCR only, block detection happens in the core.

use std::sync::Arc;

use async_trait::async_trait;
use schedulify_core::error::ScheduleResult;

use super::{Extraction, ScheduleExtractor, TextRecognizer, Upload};

pub struct Heuristic {
    pub recognizer: Arc<dyn TextRecognizer>,
}

#[async_trait]
impl ScheduleExtractor for Heuristic {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn extract(&self, upload: &Upload, _timezone: &str) -> ScheduleResult<Extraction> {
        Ok(Extraction::Text(self.recognizer.recognize(upload).await?))
    }
}
