//! Dashboard statistics.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{format_timestamp, Database, DbResult};
use crate::models::{Appointment, AppointmentStatus};

/// An upcoming appointment with its patient's display name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpcomingAppointment {
    pub appointment: Appointment,
    pub patient_name: Option<String>,
}

/// Figures shown on the practitioner dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardStats {
    pub patient_count: u32,
    /// Appointments starting this calendar month, any status
    pub month_appointments: u32,
    pub completed_this_month: u32,
    /// Completed sessions times the flat session price
    pub estimated_revenue_cents: i64,
    pub upcoming: Vec<UpcomingAppointment>,
}

/// First instant of the month containing `now` and of the following month.
fn month_bounds(now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let (year, month) = (now.year(), now.month());
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let first = |y, m| {
        NaiveDate::from_ymd_opt(y, m, 1)
            .unwrap_or(now.date())
            .and_time(chrono::NaiveTime::MIN)
    };
    (first(year, month), first(next_year, next_month))
}

impl Database {
    /// Compute dashboard figures for the month containing `now`.
    pub fn dashboard_stats(
        &self,
        practitioner_id: &str,
        now: NaiveDateTime,
        session_price_cents: i64,
        upcoming_limit: usize,
    ) -> DbResult<DashboardStats> {
        let patient_count = self.count_patients(practitioner_id)?;

        let (month_start, month_end) = month_bounds(now);
        let (month_appointments, completed_this_month): (i64, i64) = self.conn.query_row(
            r#"
            SELECT COUNT(*), COALESCE(SUM(status = ?4), 0)
            FROM appointments
            WHERE practitioner_id = ?1 AND start_time >= ?2 AND start_time < ?3
            "#,
            rusqlite::params![
                practitioner_id,
                format_timestamp(month_start),
                format_timestamp(month_end),
                AppointmentStatus::Completed.as_str(),
            ],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let mut upcoming = Vec::new();
        for appointment in self.upcoming_appointments(practitioner_id, now, upcoming_limit)? {
            let patient_name = match &appointment.patient_id {
                Some(id) => self.get_patient(id)?.map(|p| p.full_name()),
                None => None,
            };
            upcoming.push(UpcomingAppointment {
                appointment,
                patient_name,
            });
        }

        Ok(DashboardStats {
            patient_count,
            month_appointments: month_appointments as u32,
            completed_this_month: completed_this_month as u32,
            estimated_revenue_cents: completed_this_month * session_price_cents,
            upcoming,
        })
    }
}
