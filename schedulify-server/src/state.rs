use std::sync::Arc;

use schedulify_core::Settings;

use crate::extractor::ScheduleExtractor;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub extractor: Arc<dyn ScheduleExtractor>,
}

impl AppState {
    pub fn new(settings: Settings, extractor: Arc<dyn ScheduleExtractor>) -> Self {
        AppState {
            settings: Arc::new(settings),
            extractor,
        }
    }
}
