//! Public booking flow.
//!
//! Patient picks a day and motif, sees the offered start times, submits contact details.
//! The store is the system of record: slots are recomputed from a fresh snapshot of the
//! day's bookings and the final insert re-checks overlap inside a transaction.

mod contact;

pub use contact::*;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::db::{Database, DbError};
use crate::models::{Appointment, Patient};
use crate::slots::{Clock, Slot, SlotError, SlotGenerator, SlotRequest};

/// Booking errors.
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Practitioner not found: {0}")]
    PractitionerNotFound(String),

    #[error("Invalid {field}: {reason}")]
    InvalidContact { field: &'static str, reason: String },

    #[error("Consent to personal data processing is required")]
    MissingConsent,

    #[error("Slot is no longer available: {0}")]
    SlotUnavailable(NaiveDateTime),

    #[error(transparent)]
    Slot(#[from] SlotError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

pub type BookingResult<T> = Result<T, BookingError>;

/// What a patient submits from the booking page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub practitioner_id: String,
    /// Chosen start, one of the offered slots
    pub start: NaiveDateTime,
    pub motif: String,
    pub duration_minutes: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub notes: Option<String>,
    pub gdpr_consent: bool,
}

impl BookingRequest {
    /// Reject incomplete or malformed contact details.
    pub fn validate(&self) -> BookingResult<()> {
        if self.first_name.trim().is_empty() {
            return Err(invalid("first_name", "required"));
        }
        if self.last_name.trim().is_empty() {
            return Err(invalid("last_name", "required"));
        }
        if !is_valid_email(&self.email) {
            return Err(invalid("email", &self.email));
        }
        if !is_valid_french_phone(&self.phone) {
            return Err(invalid("phone", &self.phone));
        }
        if !self.gdpr_consent {
            return Err(BookingError::MissingConsent);
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> BookingError {
    BookingError::InvalidContact {
        field,
        reason: reason.to_string(),
    }
}

/// Slot lookup and booking against the store.
pub struct BookingService<'a, C: Clock> {
    db: &'a mut Database,
    generator: SlotGenerator<C>,
}

impl<'a, C: Clock> BookingService<'a, C> {
    pub fn new(db: &'a mut Database, clock: C) -> Self {
        Self {
            db,
            generator: SlotGenerator::new(clock),
        }
    }

    /// Start times currently offered for `date` and an appointment of `duration_minutes`.
    pub fn available_slots(
        &self,
        practitioner_id: &str,
        date: NaiveDate,
        duration_minutes: i64,
    ) -> BookingResult<Vec<Slot>> {
        let profile = self
            .db
            .get_profile(practitioner_id)?
            .ok_or_else(|| BookingError::PractitionerNotFound(practitioner_id.to_string()))?;

        let request = SlotRequest {
            date,
            working_hours: profile.working_hours,
            existing_bookings: self.db.bookings_for_day(practitioner_id, date)?,
            duration_minutes,
        };
        Ok(self.generator.generate(&request)?)
    }

    /// Whether the calendar lets a patient pick `date` at all.
    pub fn is_day_bookable(&self, practitioner_id: &str, date: NaiveDate) -> BookingResult<bool> {
        let profile = self
            .db
            .get_profile(practitioner_id)?
            .ok_or_else(|| BookingError::PractitionerNotFound(practitioner_id.to_string()))?;
        Ok(self.generator.is_day_bookable(date, &profile.working_hours))
    }

    /// Book `request.start` for the patient, creating the patient record on first visit.
    pub fn book(&mut self, request: &BookingRequest) -> BookingResult<Appointment> {
        request.validate()?;

        let offered = self.available_slots(
            &request.practitioner_id,
            request.start.date(),
            request.duration_minutes,
        )?;
        if !offered.contains(&request.start) {
            debug!(
                practitioner_id = %request.practitioner_id,
                start = %request.start,
                "requested start is not offered"
            );
            return Err(BookingError::SlotUnavailable(request.start));
        }

        let patient_id = self.find_or_create_patient(request)?;

        let mut appointment = Appointment::new(
            request.practitioner_id.clone(),
            Some(patient_id),
            request.start,
            request.duration_minutes,
        );
        appointment.motif = Some(request.motif.clone());
        appointment.notes = request.notes.clone();

        match self.db.insert_appointment_if_free(&appointment) {
            Ok(()) => {}
            Err(DbError::Conflict(_)) => return Err(BookingError::SlotUnavailable(request.start)),
            Err(e) => return Err(e.into()),
        }

        info!(
            id = %appointment.id,
            practitioner_id = %appointment.practitioner_id,
            start = %appointment.start_time,
            "appointment booked"
        );
        Ok(appointment)
    }

    fn find_or_create_patient(&self, request: &BookingRequest) -> BookingResult<String> {
        if let Some(existing) = self
            .db
            .find_patient_by_email(&request.practitioner_id, &request.email)?
        {
            return Ok(existing.id);
        }

        let mut patient = Patient::new(
            request.practitioner_id.clone(),
            request.first_name.trim().to_string(),
            request.last_name.trim().to_string(),
            request.email.clone(),
            &request.phone,
        );
        patient.gdpr_consent = request.gdpr_consent;
        self.db.insert_patient(&patient)?;

        debug!(id = %patient.id, "created patient from booking page");
        Ok(patient.id)
    }
}
