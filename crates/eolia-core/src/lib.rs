//! Eolia Core Library
//!
//! Scheduling core for independent wellness practitioners: weekly working hours,
//! bookable slot generation, conflict-checked public booking, patients, invoices and
//! dashboard figures, stored locally in SQLite.
//!
//! # Booking flow
//!
//! ```text
//! Working hours (JSON) ──┐
//!                        ├──► SlotGenerator ──► offered start times
//! Bookings of the day ───┘          ▲                  │
//!        ▲                          │             patient picks one
//!        │                        Clock                │
//!        │                                             ▼
//!        └──────────── insert_appointment_if_free ◄── BookingService
//! ```
//!
//! # Modules
//!
//! - [`models`]: Domain types (WorkingHours, Appointment, Patient, Invoice, etc.)
//! - [`slots`]: Pure slot generation with an injected clock
//! - [`db`]: SQLite database layer
//! - [`booking`]: Public booking flow and contact validation
//! - [`config`]: Runtime settings from the environment

pub mod booking;
pub mod config;
pub mod db;
pub mod models;
pub mod slots;

// Re-export commonly used types
pub use booking::{BookingError, BookingRequest, BookingService};
pub use config::Settings;
pub use db::{Database, DbError};
pub use models::{
    Appointment, AppointmentStatus, DaySchedule, ExistingBooking, Invoice, Motif, Patient,
    PractitionerProfile, TimeInterval, TimeOfDay, WorkingHours,
};
pub use slots::{generate_slots, Clock, FixedClock, Slot, SlotError, SlotGenerator, SystemClock};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use chrono::{NaiveDate, NaiveDateTime};
use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum EoliaError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Slot unavailable: {0}")]
    SlotUnavailable(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<db::DbError> for EoliaError {
    fn from(e: db::DbError) -> Self {
        EoliaError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for EoliaError {
    fn from(e: serde_json::Error) -> Self {
        EoliaError::SerializationError(e.to_string())
    }
}

impl From<models::ScheduleError> for EoliaError {
    fn from(e: models::ScheduleError) -> Self {
        EoliaError::InvalidInput(e.to_string())
    }
}

impl From<slots::SlotError> for EoliaError {
    fn from(e: slots::SlotError) -> Self {
        EoliaError::InvalidInput(e.to_string())
    }
}

impl From<booking::BookingError> for EoliaError {
    fn from(e: booking::BookingError) -> Self {
        match e {
            BookingError::PractitionerNotFound(id) => EoliaError::NotFound(id),
            BookingError::SlotUnavailable(_) => EoliaError::SlotUnavailable(e.to_string()),
            BookingError::Slot(inner) => inner.into(),
            BookingError::Database(inner) => inner.into(),
            BookingError::InvalidContact { .. } | BookingError::MissingConsent => {
                EoliaError::InvalidInput(e.to_string())
            }
        }
    }
}

impl From<anyhow::Error> for EoliaError {
    fn from(e: anyhow::Error) -> Self {
        EoliaError::ConfigError(format!("{:#}", e))
    }
}

impl<T> From<std::sync::PoisonError<T>> for EoliaError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        EoliaError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<EoliaCore>, EoliaError> {
    let db = Database::open(&path)?;
    let settings = Settings {
        database_path: path,
        ..Settings::default()
    };
    Ok(Arc::new(EoliaCore::new(db, settings, Arc::new(SystemClock))))
}

/// Open the database named by `EOLIA_DATABASE_PATH`, with the other settings read
/// from the environment.
#[uniffi::export]
pub fn open_database_from_env() -> Result<Arc<EoliaCore>, EoliaError> {
    let settings = Settings::from_env()?;
    let db = Database::open(&settings.database_path)?;
    Ok(Arc::new(EoliaCore::new(db, settings, Arc::new(SystemClock))))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<EoliaCore>, EoliaError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(EoliaCore::new(
        db,
        Settings::default(),
        Arc::new(SystemClock),
    )))
}

/// Appointment types offered when the practitioner has not customised them.
#[uniffi::export]
pub fn default_motifs() -> Vec<FfiMotif> {
    Motif::defaults().into_iter().map(|m| m.into()).collect()
}

/// Specialties offered in the practitioner profile form.
#[uniffi::export]
pub fn specialties() -> Vec<String> {
    models::SPECIALTIES.iter().map(|s| s.to_string()).collect()
}

/// Display form of a French phone number.
#[uniffi::export]
pub fn format_phone_number(phone: String) -> String {
    booking::format_phone_number(&phone)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct EoliaCore {
    db: Arc<Mutex<Database>>,
    settings: Settings,
    clock: Arc<dyn Clock>,
}

impl EoliaCore {
    /// Wrap an open database. Not exported; bindings use the factory functions.
    pub fn new(db: Database, settings: Settings, clock: Arc<dyn Clock>) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            settings,
            clock,
        }
    }

    fn duration_or_default(&self, duration_minutes: Option<i64>, motif: Option<&str>) -> i64 {
        duration_minutes
            .or_else(|| motif.and_then(Motif::find_default).map(|m| m.duration_minutes))
            .unwrap_or(self.settings.default_duration_minutes)
    }
}

#[uniffi::export]
impl EoliaCore {
    // =========================================================================
    // Booking Operations
    // =========================================================================

    /// Offered start times (`YYYY-MM-DDTHH:MM:SS`) for a day (`YYYY-MM-DD`).
    pub fn available_slots(
        &self,
        practitioner_id: String,
        date: String,
        duration_minutes: Option<i64>,
    ) -> Result<Vec<String>, EoliaError> {
        let date = parse_date(&date)?;
        let duration = self.duration_or_default(duration_minutes, None);

        let mut db = self.db.lock()?;
        let service = BookingService::new(&mut db, FixedClock(self.clock.now()));
        let slots = service.available_slots(&practitioner_id, date, duration)?;
        Ok(slots.into_iter().map(format_datetime).collect())
    }

    /// Whether the booking calendar lets a patient pick this day.
    pub fn is_day_bookable(
        &self,
        practitioner_id: String,
        date: String,
    ) -> Result<bool, EoliaError> {
        let date = parse_date(&date)?;
        let mut db = self.db.lock()?;
        let service = BookingService::new(&mut db, FixedClock(self.clock.now()));
        Ok(service.is_day_bookable(&practitioner_id, date)?)
    }

    /// Book an offered slot from the public booking page.
    pub fn book_appointment(
        &self,
        request: FfiBookingRequest,
    ) -> Result<FfiAppointment, EoliaError> {
        let duration = self.duration_or_default(request.duration_minutes, Some(&request.motif));
        let request = BookingRequest {
            practitioner_id: request.practitioner_id,
            start: parse_datetime(&request.start_time)?,
            motif: request.motif,
            duration_minutes: duration,
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            phone: request.phone,
            notes: request.notes,
            gdpr_consent: request.gdpr_consent,
        };

        let mut db = self.db.lock()?;
        let mut service = BookingService::new(&mut db, FixedClock(self.clock.now()));
        let appointment = service.book(&request)?;
        Ok(appointment.into())
    }

    /// Change an appointment's status (`scheduled`, `completed`, `cancelled`, `no_show`).
    pub fn update_appointment_status(
        &self,
        appointment_id: String,
        status: String,
    ) -> Result<bool, EoliaError> {
        let status = AppointmentStatus::parse(&status)
            .ok_or_else(|| EoliaError::InvalidInput(format!("Unknown status: {}", status)))?;
        let db = self.db.lock()?;
        Ok(db.update_appointment_status(&appointment_id, status)?)
    }

    // =========================================================================
    // Profile Operations
    // =========================================================================

    /// Get a practitioner by public booking handle.
    pub fn get_profile_by_username(
        &self,
        username: String,
    ) -> Result<Option<FfiProfile>, EoliaError> {
        let db = self.db.lock()?;
        let profile = db.get_profile_by_username(&username)?;
        profile.map(FfiProfile::try_from).transpose()
    }

    /// Replace a practitioner's working hours from the settings page JSON.
    pub fn set_working_hours(
        &self,
        practitioner_id: String,
        working_hours_json: String,
    ) -> Result<(), EoliaError> {
        let hours = WorkingHours::from_json(&working_hours_json)?;
        let db = self.db.lock()?;
        if !db.update_working_hours(&practitioner_id, &hours)? {
            return Err(EoliaError::NotFound(practitioner_id));
        }
        Ok(())
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Search patients by first or last name.
    pub fn search_patients(
        &self,
        practitioner_id: String,
        query: String,
        limit: u32,
    ) -> Result<Vec<FfiPatient>, EoliaError> {
        let db = self.db.lock()?;
        let patients = db.search_patients(&practitioner_id, &query, limit as usize)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    /// Figures for the month containing the current instant.
    pub fn dashboard_stats(
        &self,
        practitioner_id: String,
    ) -> Result<FfiDashboardStats, EoliaError> {
        let db = self.db.lock()?;
        let stats = db.dashboard_stats(
            &practitioner_id,
            self.clock.now(),
            self.settings.session_price_cents,
            self.settings.upcoming_limit,
        )?;
        Ok(stats.into())
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, EoliaError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| EoliaError::InvalidInput(format!("Bad date {:?}: {}", raw, e)))
}

fn parse_datetime(raw: &str) -> Result<NaiveDateTime, EoliaError> {
    NaiveDateTime::parse_from_str(raw, db::TIMESTAMP_FORMAT)
        .map_err(|e| EoliaError::InvalidInput(format!("Bad date-time {:?}: {}", raw, e)))
}

fn format_datetime(ts: NaiveDateTime) -> String {
    ts.format(db::TIMESTAMP_FORMAT).to_string()
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe booking request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBookingRequest {
    pub practitioner_id: String,
    /// `YYYY-MM-DDTHH:MM:SS`, as returned by `available_slots`
    pub start_time: String,
    pub motif: String,
    /// Defaults to the motif's catalogue duration, then to the configured default
    pub duration_minutes: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub notes: Option<String>,
    pub gdpr_consent: bool,
}

/// FFI-safe appointment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub id: String,
    pub practitioner_id: String,
    pub patient_id: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub motif: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub reminder_sent: bool,
}

impl From<Appointment> for FfiAppointment {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            practitioner_id: appointment.practitioner_id,
            patient_id: appointment.patient_id,
            start_time: format_datetime(appointment.start_time),
            end_time: format_datetime(appointment.end_time),
            motif: appointment.motif,
            notes: appointment.notes,
            status: appointment.status.as_str().to_string(),
            reminder_sent: appointment.reminder_sent,
        }
    }
}

/// FFI-safe practitioner profile.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiProfile {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub username: Option<String>,
    pub specialty: Option<String>,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub working_hours_json: String,
}

impl TryFrom<PractitionerProfile> for FfiProfile {
    type Error = EoliaError;

    fn try_from(profile: PractitionerProfile) -> Result<Self, Self::Error> {
        Ok(Self {
            working_hours_json: profile.working_hours.to_json()?,
            id: profile.id,
            email: profile.email,
            name: profile.name,
            username: profile.username,
            specialty: profile.specialty,
            company_name: profile.company_name,
            phone: profile.phone,
        })
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub gdpr_consent: bool,
    pub notes: Option<String>,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            first_name: patient.first_name,
            last_name: patient.last_name,
            email: patient.email,
            phone: patient.phone,
            gdpr_consent: patient.gdpr_consent,
            notes: patient.notes,
        }
    }
}

/// FFI-safe motif.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMotif {
    pub label: String,
    pub duration_minutes: i64,
}

impl From<Motif> for FfiMotif {
    fn from(motif: Motif) -> Self {
        Self {
            label: motif.label,
            duration_minutes: motif.duration_minutes,
        }
    }
}

/// FFI-safe upcoming appointment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiUpcomingAppointment {
    pub appointment: FfiAppointment,
    pub patient_name: Option<String>,
}

/// FFI-safe dashboard figures.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDashboardStats {
    pub patient_count: u32,
    pub month_appointments: u32,
    pub completed_this_month: u32,
    pub estimated_revenue_cents: i64,
    pub upcoming: Vec<FfiUpcomingAppointment>,
}

impl From<db::DashboardStats> for FfiDashboardStats {
    fn from(stats: db::DashboardStats) -> Self {
        Self {
            patient_count: stats.patient_count,
            month_appointments: stats.month_appointments,
            completed_this_month: stats.completed_this_month,
            estimated_revenue_cents: stats.estimated_revenue_cents,
            upcoming: stats
                .upcoming
                .into_iter()
                .map(|u| FfiUpcomingAppointment {
                    appointment: u.appointment.into(),
                    patient_name: u.patient_name,
                })
                .collect(),
        }
    }
}
