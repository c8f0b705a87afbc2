//! ICS file generation.
//!
//! Writes planned recurrence entries as an RFC 5545 calendar.

mod generate;

pub use generate::generate_calendar;
