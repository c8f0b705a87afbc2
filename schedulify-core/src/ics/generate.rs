//! ICS file generation.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use icalendar::{Calendar, Component, EventLike, Property};

use crate::constants::PRODUCT_ID;
use crate::recurrence::RecurrenceEntry;

/// Generate a VCALENDAR holding one weekly VEVENT per entry.
pub fn generate_calendar(entries: &[RecurrenceEntry], tz: Tz, calendar_name: &str) -> String {
    let mut cal = Calendar::new();
    cal.name(calendar_name);
    cal.timezone(tz.name());

    let dtstamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();

    for entry in entries {
        let mut ics_event = icalendar::Event::new();
        ics_event.uid(&entry.uid);
        ics_event.summary(&entry.title);
        ics_event.add_property("DTSTAMP", &dtstamp);

        add_datetime_property(&mut ics_event, "DTSTART", &entry.start);
        add_datetime_property(&mut ics_event, "DTEND", &entry.end);

        if let Some(ref loc) = entry.location {
            ics_event.location(loc);
        }

        if let Some(ref desc) = entry.description {
            ics_event.description(desc);
        }

        ics_event.add_property("RRULE", entry.rrule());

        cal.push(ics_event.done());
    }

    strip_ics_bloat(&cal.done().to_string())
}

/// Clean up ICS output from the icalendar crate
/// - Replace PRODID with ours
/// - Remove CALSCALE:GREGORIAN (it's the default)
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:");
            result.push_str(PRODUCT_ID);
            result.push_str("\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

/// UTC gets the Z suffix, anything else a TZID parameter with local wall time.
fn add_datetime_property(ics_event: &mut icalendar::Event, name: &str, time: &DateTime<Tz>) {
    if time.timezone() == chrono_tz::UTC {
        ics_event.add_property(name, time.with_timezone(&Utc).format("%Y%m%dT%H%M%SZ").to_string());
    } else {
        let mut prop = Property::new(name, time.naive_local().format("%Y%m%dT%H%M%S").to_string());
        prop.add_parameter("TZID", time.timezone().name());
        ics_event.append_property(prop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::days::Day;
    use chrono::{NaiveDate, TimeZone};
    use chrono_tz::America::Los_Angeles;

    fn entry(tz: Tz) -> RecurrenceEntry {
        let day = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        RecurrenceEntry {
            uid: "cs-101-mo-20250106-0900@schedulify".to_string(),
            title: "CS 101".to_string(),
            day: Day::Monday,
            start: tz.from_local_datetime(&day.and_hms_opt(9, 0, 0).unwrap()).unwrap(),
            end: tz.from_local_datetime(&day.and_hms_opt(9, 50, 0).unwrap()).unwrap(),
            until: Utc.with_ymd_and_hms(2025, 3, 3, 7, 59, 59).unwrap(),
            location: Some("Room 204".to_string()),
            description: Some("Instructor: Dr. Ng".to_string()),
        }
    }

    #[test]
    fn calendar_headers() {
        let ics = generate_calendar(&[], Los_Angeles, "Winter Classes");

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"), "ICS:\n{}", ics);
        assert!(ics.contains("VERSION:2.0"), "ICS:\n{}", ics);
        assert!(
            ics.contains("PRODID:-//Schedulify Class Sync//\r\n"),
            "PRODID should be replaced. ICS:\n{}",
            ics
        );
        assert!(ics.contains("X-WR-CALNAME:Winter Classes"), "ICS:\n{}", ics);
        assert!(ics.contains("X-WR-TIMEZONE:America/Los_Angeles"), "ICS:\n{}", ics);
        assert!(!ics.contains("CALSCALE"), "CALSCALE should be stripped. ICS:\n{}", ics);
        assert!(!ics.contains("BEGIN:VEVENT"), "ICS:\n{}", ics);
    }

    #[test]
    fn zoned_event_has_tzid_and_rrule() {
        let ics = generate_calendar(&[entry(Los_Angeles)], Los_Angeles, "Class Schedule");

        assert!(
            ics.contains("DTSTART;TZID=America/Los_Angeles:20250106T090000"),
            "DTSTART should carry TZID. ICS:\n{}",
            ics
        );
        assert!(
            ics.contains("DTEND;TZID=America/Los_Angeles:20250106T095000"),
            "ICS:\n{}",
            ics
        );

        let rrule = ics
            .lines()
            .find(|l| l.starts_with("RRULE"))
            .expect("Should have RRULE line");
        assert!(rrule.contains("FREQ=WEEKLY"), "Got: {}", rrule);
        assert!(rrule.contains("UNTIL=20250303T075959Z"), "Got: {}", rrule);

        assert!(ics.contains("UID:cs-101-mo-20250106-0900@schedulify"), "ICS:\n{}", ics);
        assert!(ics.contains("SUMMARY:CS 101"), "ICS:\n{}", ics);
        assert!(ics.contains("LOCATION:Room 204"), "ICS:\n{}", ics);
        assert!(ics.contains("Instructor: Dr. Ng"), "ICS:\n{}", ics);
    }

    #[test]
    fn utc_event_uses_z_suffix() {
        let ics = generate_calendar(&[entry(chrono_tz::UTC)], chrono_tz::UTC, "Class Schedule");

        assert!(ics.contains("DTSTART:20250106T090000Z"), "ICS:\n{}", ics);
        assert!(ics.contains("DTEND:20250106T095000Z"), "ICS:\n{}", ics);
        assert!(!ics.contains("TZID="), "UTC should not use TZID. ICS:\n{}", ics);
    }
}
