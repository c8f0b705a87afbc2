/// Length of the default term window, in weeks.
pub const DEFAULT_WEEKS: i64 = 5;

/// Upper bound for a configured default window.
pub const MAX_WEEKS: i64 = 104;

/// Timezone used when neither the request nor the settings name one.
pub const FALLBACK_TIMEZONE: &str = "UTC";

/// Title given to candidates that arrive without one.
pub const DEFAULT_TITLE: &str = "Class";

pub const DEFAULT_CALENDAR_NAME: &str = "Class Schedule";

pub const PRODUCT_ID: &str = "-//Schedulify Class Sync//";

pub const DEFAULT_START_TIME: &str = "09:00";
pub const DEFAULT_END_TIME: &str = "10:00";

pub const MISSING_DATES_NOTE: &str =
    "Add the term's start and end dates before exporting to calendar.";
