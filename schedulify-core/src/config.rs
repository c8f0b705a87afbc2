//! Pipeline settings.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CALENDAR_NAME, DEFAULT_END_TIME, DEFAULT_START_TIME, DEFAULT_WEEKS, MAX_WEEKS};
use crate::error::{ScheduleError, ScheduleResult};

/// Legacy variable naming the process-wide default timezone.
const DEFAULT_TIMEZONE_VAR: &str = "DEFAULT_TIMEZONE";

/// What to do with an event whose end time is earlier than its start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOrderRule {
    /// Accept it (overnight blocks, or noisy extraction the user fixes later).
    #[default]
    Allow,
    Reject,
}

fn default_calendar_name() -> String {
    DEFAULT_CALENDAR_NAME.to_string()
}

fn default_weeks() -> i64 {
    DEFAULT_WEEKS
}

fn default_start_time() -> String {
    DEFAULT_START_TIME.to_string()
}

fn default_end_time() -> String {
    DEFAULT_END_TIME.to_string()
}

/// Settings at ~/.config/schedulify/config.toml, overridable with
/// `SCHEDULIFY_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// IANA name used when a request doesn't carry a timezone.
    #[serde(default)]
    pub default_timezone: Option<String>,

    #[serde(default = "default_calendar_name")]
    pub calendar_name: String,

    /// Length of the inferred term window.
    #[serde(default = "default_weeks")]
    pub default_weeks: i64,

    #[serde(default)]
    pub time_order: TimeOrderRule,

    /// Times given to extracted rows that have none.
    #[serde(default = "default_start_time")]
    pub default_start_time: String,
    #[serde(default = "default_end_time")]
    pub default_end_time: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            default_timezone: None,
            calendar_name: default_calendar_name(),
            default_weeks: default_weeks(),
            time_order: TimeOrderRule::default(),
            default_start_time: default_start_time(),
            default_end_time: default_end_time(),
        }
    }
}

impl Settings {
    pub fn config_path() -> ScheduleResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ScheduleError::Config("Could not determine config directory".into()))?
            .join("schedulify");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default config path (if it exists) and the environment.
    pub fn load() -> ScheduleResult<Self> {
        let path = Self::config_path().ok();
        Self::load_from(path.as_deref())
    }

    pub fn load_from(path: Option<&Path>) -> ScheduleResult<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        let mut settings: Settings = builder
            .add_source(Environment::with_prefix("SCHEDULIFY").try_parsing(true))
            .build()
            .map_err(|e| ScheduleError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ScheduleError::Config(e.to_string()))?;

        if settings.default_timezone.is_none() {
            settings.default_timezone = std::env::var(DEFAULT_TIMEZONE_VAR)
                .ok()
                .filter(|tz| !tz.trim().is_empty());
        }

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> ScheduleResult<()> {
        if !(1..=MAX_WEEKS).contains(&self.default_weeks) {
            return Err(ScheduleError::Config(format!(
                "default_weeks must be between 1 and {MAX_WEEKS}, got {}",
                self.default_weeks
            )));
        }
        crate::time::normalize_time(&self.default_start_time)
            .map_err(|e| ScheduleError::Config(format!("default_start_time: {e}")))?;
        crate::time::normalize_time(&self.default_end_time)
            .map_err(|e| ScheduleError::Config(format!("default_end_time: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.calendar_name, "Class Schedule");
        assert_eq!(settings.default_weeks, 5);
        assert_eq!(settings.time_order, TimeOrderRule::Allow);
        assert_eq!(settings.default_start_time, "09:00");
        assert!(settings.default_timezone.is_none());
    }

    #[test]
    fn toml_overrides_fields() {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(
                "default_timezone = \"America/Chicago\"\ntime_order = \"reject\"\ndefault_weeks = 10\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.default_timezone.as_deref(), Some("America/Chicago"));
        assert_eq!(settings.time_order, TimeOrderRule::Reject);
        assert_eq!(settings.default_weeks, 10);
        assert_eq!(settings.calendar_name, "Class Schedule");
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let settings = Settings::load_from(Some(Path::new("/nonexistent/schedulify.toml")));
        assert!(settings.is_ok(), "{:?}", settings.err());
    }

    #[test]
    fn rejects_out_of_range_week_window() {
        for weeks in [0, MAX_WEEKS + 1, i64::MAX] {
            let settings = Settings {
                default_weeks: weeks,
                ..Settings::default()
            };
            assert!(
                matches!(settings.validate(), Err(ScheduleError::Config(_))),
                "default_weeks = {weeks} should be rejected"
            );
        }

        let settings = Settings {
            default_weeks: MAX_WEEKS,
            ..Settings::default()
        };
        assert!(settings.validate().is_ok());
    }
}
