//! Core pipeline for turning extracted class schedules into calendars.
//!
//! This crate is synchronous and does no I/O beyond reading its config file:
//! - `days` / `time` normalize free-form day and time tokens
//! - `event` and `adapter` validate extraction output into `CanonicalEvent`s
//! - `heuristic` segments raw OCR text when no model is available
//! - `date_range`, `recurrence` and `ics` produce the weekly calendar file
//! - `pipeline` ties these together for the CLI and the HTTP service

pub mod adapter;
pub mod config;
pub mod constants;
pub mod date_range;
pub mod days;
pub mod error;
pub mod event;
pub mod google;
pub mod heuristic;
pub mod ics;
pub mod model_output;
pub mod pipeline;
pub mod recurrence;
pub mod time;

pub use config::{Settings, TimeOrderRule};
pub use days::Day;
pub use error::{ScheduleError, ScheduleResult};
pub use event::{CanonicalEvent, EventCandidate};
pub use pipeline::{CalendarRequest, ExtractionReport};
