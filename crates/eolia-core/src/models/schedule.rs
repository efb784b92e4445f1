//! Working hours models.
//!
//! Time-of-day values travel as `"HH:mm"` strings in the configuration store, and the
//! weekly schedule is keyed by lowercase English weekday names (`monday` .. `sunday`).

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors raised while reading a schedule.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("Invalid time of day (expected HH:mm): {0}")]
    InvalidTime(String),

    #[error("Invalid working hours JSON: {0}")]
    InvalidJson(String),
}

/// Fixed configuration keys, Monday first.
pub const WEEKDAY_KEYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Lowercase configuration key for a weekday.
pub fn weekday_key(weekday: Weekday) -> &'static str {
    WEEKDAY_KEYS[weekday.num_days_from_monday() as usize]
}

/// Wall-clock time of day with minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    /// Build from hour and minute. Returns `None` outside `00:00..=23:59`.
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    /// Combine with a calendar date.
    pub fn on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.0)
    }
}

impl FromStr for TimeOfDay {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScheduleError::InvalidTime(s.to_string());

        let bytes = s.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return Err(invalid());
        }
        let digits = |range: std::ops::Range<usize>| -> Option<u32> {
            let part = &s[range];
            if part.bytes().all(|b| b.is_ascii_digit()) {
                part.parse().ok()
            } else {
                None
            }
        };

        let hour = digits(0..2).ok_or_else(invalid)?;
        let minute = digits(3..5).ok_or_else(invalid)?;
        TimeOfDay::new(hour, minute).ok_or_else(invalid)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// An open interval within a single day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeInterval {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeInterval {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    /// Parse both ends from `"HH:mm"` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, ScheduleError> {
        Ok(Self {
            start: start.parse()?,
            end: end.parse()?,
        })
    }

    pub fn is_well_formed(&self) -> bool {
        self.start < self.end
    }
}

/// Availability for one weekday.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DaySchedule {
    #[serde(default)]
    pub enabled: bool,
    /// Declaration order is display order.
    #[serde(default)]
    pub slots: Vec<TimeInterval>,
}

impl DaySchedule {
    pub fn open(slots: Vec<TimeInterval>) -> Self {
        Self {
            enabled: true,
            slots,
        }
    }

    pub fn closed() -> Self {
        Self::default()
    }

    /// Enabled and has at least one interval.
    pub fn accepts_bookings(&self) -> bool {
        self.enabled && !self.slots.is_empty()
    }
}

/// Weekly recurring availability of a practitioner.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkingHours {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monday: Option<DaySchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuesday: Option<DaySchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wednesday: Option<DaySchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thursday: Option<DaySchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friday: Option<DaySchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saturday: Option<DaySchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunday: Option<DaySchedule>,
}

impl WorkingHours {
    /// Default week offered during onboarding: weekdays 09:00-12:00 and 14:00-18:00,
    /// weekend closed.
    pub fn default_week() -> Self {
        let weekday = || {
            DaySchedule::open(vec![
                interval(9, 0, 12, 0),
                interval(14, 0, 18, 0),
            ])
        };
        Self {
            monday: Some(weekday()),
            tuesday: Some(weekday()),
            wednesday: Some(weekday()),
            thursday: Some(weekday()),
            friday: Some(weekday()),
            saturday: Some(DaySchedule::closed()),
            sunday: Some(DaySchedule::closed()),
        }
    }

    /// Schedule for a weekday, if configured.
    pub fn day(&self, weekday: Weekday) -> Option<&DaySchedule> {
        match weekday {
            Weekday::Mon => self.monday.as_ref(),
            Weekday::Tue => self.tuesday.as_ref(),
            Weekday::Wed => self.wednesday.as_ref(),
            Weekday::Thu => self.thursday.as_ref(),
            Weekday::Fri => self.friday.as_ref(),
            Weekday::Sat => self.saturday.as_ref(),
            Weekday::Sun => self.sunday.as_ref(),
        }
    }

    /// Replace the schedule for a weekday.
    pub fn set_day(&mut self, weekday: Weekday, schedule: Option<DaySchedule>) {
        let slot = match weekday {
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
            Weekday::Sun => &mut self.sunday,
        };
        *slot = schedule;
    }

    /// Schedule for the weekday of a calendar date.
    pub fn for_date(&self, date: NaiveDate) -> Option<&DaySchedule> {
        self.day(date.weekday())
    }

    pub fn from_json(json: &str) -> Result<Self, ScheduleError> {
        serde_json::from_str(json).map_err(|e| ScheduleError::InvalidJson(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn interval(start_h: u32, start_m: u32, end_h: u32, end_m: u32) -> TimeInterval {
    let at = |h, m| TimeOfDay(NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN));
    TimeInterval {
        start: at(start_h, start_m),
        end: at(end_h, end_m),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_of_day() {
        let t: TimeOfDay = "09:30".parse().unwrap();
        assert_eq!(t.hour(), 9);
        assert_eq!(t.minute(), 30);
        assert_eq!(t.to_string(), "09:30");

        assert_eq!("23:59".parse::<TimeOfDay>().unwrap().to_string(), "23:59");
        assert_eq!("00:00".parse::<TimeOfDay>().unwrap().to_string(), "00:00");
    }

    #[test]
    fn test_reject_malformed_time() {
        for bad in ["9:30", "09:3", "24:00", "12:60", "0930", "ab:cd", "09-30", "+9:30", " 9:30"] {
            assert!(
                bad.parse::<TimeOfDay>().is_err(),
                "{:?} should not parse",
                bad
            );
        }
    }

    #[test]
    fn test_weekday_keys() {
        assert_eq!(weekday_key(Weekday::Mon), "monday");
        assert_eq!(weekday_key(Weekday::Sat), "saturday");
        assert_eq!(weekday_key(Weekday::Sun), "sunday");
    }

    #[test]
    fn test_working_hours_json_shape() {
        let json = r#"{
            "monday": {"enabled": true, "slots": [{"start": "09:00", "end": "12:00"}]},
            "saturday": {"enabled": false, "slots": []}
        }"#;
        let hours = WorkingHours::from_json(json).unwrap();

        let monday = hours.day(Weekday::Mon).unwrap();
        assert!(monday.accepts_bookings());
        assert_eq!(monday.slots[0], TimeInterval::parse("09:00", "12:00").unwrap());
        assert!(!hours.day(Weekday::Sat).unwrap().accepts_bookings());
        assert!(hours.day(Weekday::Tue).is_none());

        let out = hours.to_json().unwrap();
        assert!(out.contains(r#""start":"09:00""#));
        assert!(!out.contains("tuesday"));
    }

    #[test]
    fn test_bad_time_in_json() {
        let json = r#"{"monday": {"enabled": true, "slots": [{"start": "9h", "end": "12:00"}]}}"#;
        assert!(matches!(
            WorkingHours::from_json(json),
            Err(ScheduleError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_default_week() {
        let hours = WorkingHours::default_week();
        for day in [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri] {
            let schedule = hours.day(day).unwrap();
            assert!(schedule.enabled);
            assert_eq!(schedule.slots.len(), 2);
            assert_eq!(schedule.slots[1].end.to_string(), "18:00");
        }
        assert!(!hours.day(Weekday::Sat).unwrap().enabled);
        assert!(hours.day(Weekday::Sun).unwrap().slots.is_empty());
    }

    #[test]
    fn test_set_day_and_for_date() {
        let mut hours = WorkingHours::default();
        hours.set_day(
            Weekday::Wed,
            Some(DaySchedule::open(vec![TimeInterval::parse("10:00", "11:00").unwrap()])),
        );
        // 2024-01-03 is a Wednesday
        let date = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert!(hours.for_date(date).unwrap().accepts_bookings());
    }

    #[test]
    fn test_interval_well_formed() {
        assert!(TimeInterval::parse("09:00", "10:00").unwrap().is_well_formed());
        assert!(!TimeInterval::parse("10:00", "10:00").unwrap().is_well_formed());
        assert!(!TimeInterval::parse("11:00", "10:00").unwrap().is_well_formed());
    }
}
