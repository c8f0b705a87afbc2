//! Error types for the schedulify pipeline.

use thiserror::Error;

/// Errors that can occur while normalizing, validating or exporting a schedule.
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// A time or date token that could not be understood.
    #[error("Invalid {field}: {message}")]
    Format { field: &'static str, message: String },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The candidate had no recognizable meeting day. Callers treat this as noise.
    #[error("No recognizable meeting days for '{0}'")]
    NoMeetingDays(String),

    #[error("Unrecognized extraction payload: {0}")]
    Shape(String),

    #[error("start_date after end_date for {0}")]
    DateRange(String),

    #[error("start_date must be before end_date ({start} > {end})")]
    Order { start: String, end: String },

    #[error("Missing date range for {0}")]
    MissingRange(String),

    #[error("end_time {end} is before start_time {start} for '{title}'")]
    TimeOrder {
        title: String,
        start: String,
        end: String,
    },

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    /// OCR or language model output that could not be turned into candidates.
    #[error("Extraction failed: {message}\n{raw}")]
    ExternalExtraction { message: String, raw: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("ICS generation error: {0}")]
    IcsGenerate(String),
}

impl ScheduleError {
    pub fn format(field: &'static str, message: impl Into<String>) -> Self {
        ScheduleError::Format {
            field,
            message: message.into(),
        }
    }

    /// A date computation that falls outside the calendar's representable range.
    pub fn out_of_range(what: impl std::fmt::Display) -> Self {
        ScheduleError::format("date", format!("{what} is outside the supported date range"))
    }

    /// Whether the error was caused by the caller's input (as opposed to an
    /// upstream collaborator or the local environment).
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            ScheduleError::ExternalExtraction { .. }
                | ScheduleError::Config(_)
                | ScheduleError::IcsGenerate(_)
        )
    }
}

/// Result type alias for schedulify operations.
pub type ScheduleResult<T> = Result<T, ScheduleError>;
