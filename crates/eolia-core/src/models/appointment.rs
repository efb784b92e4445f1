//! Appointment models.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an appointment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Booked, not yet held
    Scheduled,
    /// Session took place
    Completed,
    /// Cancelled by practitioner or patient; frees the time range
    Cancelled,
    /// Patient did not show up
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(AppointmentStatus::Scheduled),
            "completed" => Some(AppointmentStatus::Completed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            "no_show" => Some(AppointmentStatus::NoShow),
            _ => None,
        }
    }

    /// Whether an appointment in this status still reserves its time range.
    pub fn blocks_time(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

/// Appointment type offered on the public booking page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Motif {
    pub label: String,
    pub duration_minutes: i64,
}

impl Motif {
    pub fn new(label: impl Into<String>, duration_minutes: i64) -> Self {
        Self {
            label: label.into(),
            duration_minutes,
        }
    }

    /// Catalogue shown to patients when the practitioner has not customised it.
    pub fn defaults() -> Vec<Motif> {
        vec![
            Motif::new("Première consultation", 60),
            Motif::new("Suivi", 45),
            Motif::new("Consultation courte", 30),
        ]
    }

    pub fn find_default(label: &str) -> Option<Motif> {
        Self::defaults().into_iter().find(|m| m.label == label)
    }
}

/// A reserved time range taken from an existing, non-cancelled appointment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExistingBooking {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ExistingBooking {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Half-open overlap test: touching ranges do not overlap.
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        start < self.end && end > self.start
    }
}

/// An appointment in the practitioner's calendar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    /// Unique appointment ID
    pub id: String,
    /// Owning practitioner
    pub practitioner_id: String,
    /// Patient, if known (blocked time has none)
    pub patient_id: Option<String>,
    /// Practitioner-local start
    pub start_time: NaiveDateTime,
    /// Practitioner-local end (exclusive)
    pub end_time: NaiveDateTime,
    /// Appointment reason, e.g. "Suivi"
    pub motif: Option<String>,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    /// Set once the reminder went out
    pub reminder_sent: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Appointment {
    /// Create a scheduled appointment of `duration_minutes` starting at `start_time`.
    pub fn new(
        practitioner_id: String,
        patient_id: Option<String>,
        start_time: NaiveDateTime,
        duration_minutes: i64,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            practitioner_id,
            patient_id,
            start_time,
            end_time: start_time + Duration::minutes(duration_minutes),
            motif: None,
            notes: None,
            status: AppointmentStatus::Scheduled,
            reminder_sent: false,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    /// The reservation this appointment holds, or `None` once cancelled.
    pub fn as_booking(&self) -> Option<ExistingBooking> {
        self.status
            .blocks_time()
            .then(|| ExistingBooking::new(self.start_time, self.end_time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_new_appointment() {
        let apt = Appointment::new("pract-1".into(), None, at(9, 0), 45);
        assert_eq!(apt.end_time, at(9, 45));
        assert_eq!(apt.duration_minutes(), 45);
        assert_eq!(apt.status, AppointmentStatus::Scheduled);
        assert_eq!(apt.id.len(), 36); // UUID format
    }

    #[test]
    fn test_cancelled_frees_time() {
        let mut apt = Appointment::new("pract-1".into(), None, at(9, 0), 60);
        assert!(apt.as_booking().is_some());

        apt.status = AppointmentStatus::Cancelled;
        assert!(apt.as_booking().is_none());

        apt.status = AppointmentStatus::NoShow;
        assert!(apt.as_booking().is_some());
    }

    #[test]
    fn test_overlap_is_half_open() {
        let booking = ExistingBooking::new(at(10, 0), at(11, 0));
        assert!(booking.overlaps(at(10, 30), at(11, 30)));
        assert!(booking.overlaps(at(9, 30), at(10, 30)));
        assert!(booking.overlaps(at(9, 0), at(12, 0)));
        // Back-to-back on either side
        assert!(!booking.overlaps(at(9, 0), at(10, 0)));
        assert!(!booking.overlaps(at(11, 0), at(12, 0)));
    }

    #[test]
    fn test_status_wire_format() {
        for status in [
            AppointmentStatus::Scheduled,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(AppointmentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(AppointmentStatus::parse("pending"), None);
    }

    #[test]
    fn test_default_motifs() {
        let motifs = Motif::defaults();
        assert_eq!(motifs.len(), 3);
        assert_eq!(motifs[0].duration_minutes, 60);
        assert_eq!(Motif::find_default("Suivi").unwrap().duration_minutes, 45);
        assert!(Motif::find_default("Massage").is_none());
    }
}
