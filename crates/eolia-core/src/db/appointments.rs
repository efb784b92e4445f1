//! Appointment database operations.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::{format_timestamp, parse_timestamp, Database, DbError, DbResult};
use crate::models::{Appointment, AppointmentStatus, ExistingBooking};

const APPOINTMENT_COLUMNS: &str = "id, practitioner_id, patient_id, start_time, end_time, \
                                   motif, notes, status, reminder_sent, created_at, updated_at";

impl Database {
    /// Insert a new appointment without checking for overlaps.
    ///
    /// Practitioners may deliberately double-book from their own calendar; public
    /// bookings go through [`Database::insert_appointment_if_free`].
    pub fn insert_appointment(&self, appointment: &Appointment) -> DbResult<()> {
        insert_appointment_on(&self.conn, appointment)
    }

    /// Insert an appointment only if no non-cancelled appointment of the same
    /// practitioner overlaps its range. The check and the insert share one
    /// write transaction.
    pub fn insert_appointment_if_free(&mut self, appointment: &Appointment) -> DbResult<()> {
        let tx = self.transaction()?;

        let overlapping: i64 = tx.query_row(
            r#"
            SELECT COUNT(*) FROM appointments
            WHERE practitioner_id = ?1
              AND status != 'cancelled'
              AND start_time < ?3
              AND end_time > ?2
            "#,
            params![
                appointment.practitioner_id,
                format_timestamp(appointment.start_time),
                format_timestamp(appointment.end_time),
            ],
            |row| row.get(0),
        )?;

        if overlapping > 0 {
            info!(
                practitioner_id = %appointment.practitioner_id,
                start = %appointment.start_time,
                end = %appointment.end_time,
                "rejected overlapping appointment"
            );
            return Err(DbError::Conflict(format!(
                "{} - {}",
                appointment.start_time, appointment.end_time
            )));
        }

        insert_appointment_on(&tx, appointment)?;
        tx.commit()?;

        debug!(id = %appointment.id, start = %appointment.start_time, "appointment stored");
        Ok(())
    }

    /// Update an existing appointment.
    pub fn update_appointment(&self, appointment: &Appointment) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE appointments SET
                patient_id = ?2,
                start_time = ?3,
                end_time = ?4,
                motif = ?5,
                notes = ?6,
                status = ?7,
                reminder_sent = ?8,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                appointment.id,
                appointment.patient_id,
                format_timestamp(appointment.start_time),
                format_timestamp(appointment.end_time),
                appointment.motif,
                appointment.notes,
                appointment.status.as_str(),
                appointment.reminder_sent,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Change an appointment's status.
    pub fn update_appointment_status(&self, id: &str, status: AppointmentStatus) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE appointments SET status = ?2, updated_at = datetime('now') WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, id: &str) -> DbResult<Option<Appointment>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM appointments WHERE id = ?", APPOINTMENT_COLUMNS),
                [id],
                AppointmentRow::from_row,
            )
            .optional()?
            .map(TryInto::try_into)
            .transpose()
    }

    /// List a practitioner's appointments starting in `[from, to)`, any status.
    pub fn list_appointments(
        &self,
        practitioner_id: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {}
            FROM appointments
            WHERE practitioner_id = ?1 AND start_time >= ?2 AND start_time < ?3
            ORDER BY start_time
            "#,
            APPOINTMENT_COLUMNS
        ))?;

        let rows = stmt.query_map(
            params![practitioner_id, format_timestamp(from), format_timestamp(to)],
            AppointmentRow::from_row,
        )?;

        let mut appointments = Vec::new();
        for row in rows {
            appointments.push(row?.try_into()?);
        }
        Ok(appointments)
    }

    /// Snapshot of the reservations starting on `date`, cancelled appointments excluded.
    pub fn bookings_for_day(
        &self,
        practitioner_id: &str,
        date: NaiveDate,
    ) -> DbResult<Vec<ExistingBooking>> {
        let day_start = date.and_time(chrono::NaiveTime::MIN);
        let day_end = day_start + Duration::days(1);

        let mut stmt = self.conn.prepare(
            r#"
            SELECT start_time, end_time
            FROM appointments
            WHERE practitioner_id = ?1
              AND start_time >= ?2 AND start_time < ?3
              AND status != 'cancelled'
            ORDER BY start_time
            "#,
        )?;

        let rows = stmt.query_map(
            params![
                practitioner_id,
                format_timestamp(day_start),
                format_timestamp(day_end)
            ],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )?;

        let mut bookings = Vec::new();
        for row in rows {
            let (start, end) = row?;
            bookings.push(ExistingBooking::new(
                parse_timestamp(&start)?,
                parse_timestamp(&end)?,
            ));
        }
        Ok(bookings)
    }

    /// Next scheduled appointments starting at or after `now`.
    pub fn upcoming_appointments(
        &self,
        practitioner_id: &str,
        now: NaiveDateTime,
        limit: usize,
    ) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {}
            FROM appointments
            WHERE practitioner_id = ?1 AND status = 'scheduled' AND start_time >= ?2
            ORDER BY start_time
            LIMIT ?3
            "#,
            APPOINTMENT_COLUMNS
        ))?;

        let rows = stmt.query_map(
            params![practitioner_id, format_timestamp(now), limit as i64],
            AppointmentRow::from_row,
        )?;

        let mut appointments = Vec::new();
        for row in rows {
            appointments.push(row?.try_into()?);
        }
        Ok(appointments)
    }

    /// Delete an appointment.
    pub fn delete_appointment(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM appointments WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

fn insert_appointment_on(conn: &Connection, appointment: &Appointment) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO appointments (
            id, practitioner_id, patient_id, start_time, end_time, motif,
            notes, status, reminder_sent, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
        params![
            appointment.id,
            appointment.practitioner_id,
            appointment.patient_id,
            format_timestamp(appointment.start_time),
            format_timestamp(appointment.end_time),
            appointment.motif,
            appointment.notes,
            appointment.status.as_str(),
            appointment.reminder_sent,
            appointment.created_at,
            appointment.updated_at,
        ],
    )?;
    Ok(())
}

/// Intermediate row struct for database mapping.
struct AppointmentRow {
    id: String,
    practitioner_id: String,
    patient_id: Option<String>,
    start_time: String,
    end_time: String,
    motif: Option<String>,
    notes: Option<String>,
    status: String,
    reminder_sent: bool,
    created_at: String,
    updated_at: String,
}

impl AppointmentRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            practitioner_id: row.get(1)?,
            patient_id: row.get(2)?,
            start_time: row.get(3)?,
            end_time: row.get(4)?,
            motif: row.get(5)?,
            notes: row.get(6)?,
            status: row.get(7)?,
            reminder_sent: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = DbError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let status = AppointmentStatus::parse(&row.status).ok_or_else(|| {
            DbError::Constraint(format!("Unknown appointment status: {}", row.status))
        })?;

        Ok(Appointment {
            id: row.id,
            practitioner_id: row.practitioner_id,
            patient_id: row.patient_id,
            start_time: parse_timestamp(&row.start_time)?,
            end_time: parse_timestamp(&row.end_time)?,
            motif: row.motif,
            notes: row.notes,
            status,
            reminder_sent: row.reminder_sent,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PractitionerProfile;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, 0).unwrap()
    }

    fn setup_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        for id in ["p1", "p2"] {
            db.insert_profile(&PractitionerProfile::new(id.into(), format!("{}@example.fr", id)))
                .unwrap();
        }
        db
    }

    fn appointment(practitioner: &str, start: NaiveDateTime, minutes: i64) -> Appointment {
        Appointment::new(practitioner.into(), None, start, minutes)
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();

        let mut apt = appointment("p1", at(9, 0), 60);
        apt.motif = Some("Suivi".into());
        db.insert_appointment(&apt).unwrap();

        let retrieved = db.get_appointment(&apt.id).unwrap().unwrap();
        assert_eq!(retrieved.start_time, at(9, 0));
        assert_eq!(retrieved.end_time, at(10, 0));
        assert_eq!(retrieved.motif, Some("Suivi".into()));
        assert_eq!(retrieved.status, AppointmentStatus::Scheduled);
    }

    #[test]
    fn test_update_status() {
        let db = setup_db();
        let apt = appointment("p1", at(9, 0), 60);
        db.insert_appointment(&apt).unwrap();

        assert!(db
            .update_appointment_status(&apt.id, AppointmentStatus::Completed)
            .unwrap());
        let retrieved = db.get_appointment(&apt.id).unwrap().unwrap();
        assert_eq!(retrieved.status, AppointmentStatus::Completed);
    }

    #[test]
    fn test_update_appointment() {
        let db = setup_db();
        let mut apt = appointment("p1", at(9, 0), 60);
        db.insert_appointment(&apt).unwrap();

        apt.start_time = at(14, 0);
        apt.end_time = at(14, 45);
        apt.notes = Some("Déplacé".into());
        apt.reminder_sent = true;
        assert!(db.update_appointment(&apt).unwrap());

        let retrieved = db.get_appointment(&apt.id).unwrap().unwrap();
        assert_eq!(retrieved.start_time, at(14, 0));
        assert_eq!(retrieved.duration_minutes(), 45);
        assert!(retrieved.reminder_sent);
    }

    #[test]
    fn test_bookings_for_day_skips_cancelled_and_other_days() {
        let db = setup_db();

        let kept = appointment("p1", at(9, 0), 60);
        db.insert_appointment(&kept).unwrap();

        let mut cancelled = appointment("p1", at(10, 0), 60);
        cancelled.status = AppointmentStatus::Cancelled;
        db.insert_appointment(&cancelled).unwrap();

        let mut no_show = appointment("p1", at(11, 0), 30);
        no_show.status = AppointmentStatus::NoShow;
        db.insert_appointment(&no_show).unwrap();

        let next_day = (day() + Duration::days(1)).and_hms_opt(9, 0, 0).unwrap();
        db.insert_appointment(&appointment("p1", next_day, 60)).unwrap();
        db.insert_appointment(&appointment("p2", at(14, 0), 60)).unwrap();

        let bookings = db.bookings_for_day("p1", day()).unwrap();
        assert_eq!(
            bookings,
            vec![
                ExistingBooking::new(at(9, 0), at(10, 0)),
                ExistingBooking::new(at(11, 0), at(11, 30)),
            ]
        );
    }

    #[test]
    fn test_insert_if_free_rejects_overlap() {
        let mut db = setup_db();

        db.insert_appointment_if_free(&appointment("p1", at(10, 0), 60))
            .unwrap();

        let result = db.insert_appointment_if_free(&appointment("p1", at(10, 30), 60));
        assert!(matches!(result, Err(DbError::Conflict(_))));

        // Back-to-back is fine on both sides
        db.insert_appointment_if_free(&appointment("p1", at(9, 0), 60))
            .unwrap();
        db.insert_appointment_if_free(&appointment("p1", at(11, 0), 60))
            .unwrap();

        // Another practitioner's calendar is independent
        db.insert_appointment_if_free(&appointment("p2", at(10, 0), 60))
            .unwrap();

        assert_eq!(db.bookings_for_day("p1", day()).unwrap().len(), 3);
    }

    #[test]
    fn test_insert_if_free_ignores_cancelled() {
        let mut db = setup_db();

        let mut cancelled = appointment("p1", at(10, 0), 60);
        cancelled.status = AppointmentStatus::Cancelled;
        db.insert_appointment(&cancelled).unwrap();

        assert!(db
            .insert_appointment_if_free(&appointment("p1", at(10, 0), 60))
            .is_ok());
    }

    #[test]
    fn test_list_and_upcoming() {
        let db = setup_db();

        let early = appointment("p1", at(8, 0), 60);
        let mid = appointment("p1", at(11, 0), 60);
        let mut done = appointment("p1", at(14, 0), 60);
        done.status = AppointmentStatus::Completed;
        let late = appointment("p1", at(16, 0), 60);
        for apt in [&late, &done, &early, &mid] {
            db.insert_appointment(apt).unwrap();
        }

        let all = db
            .list_appointments("p1", at(0, 0), at(0, 0) + Duration::days(1))
            .unwrap();
        let starts: Vec<_> = all.iter().map(|a| a.start_time).collect();
        assert_eq!(starts, vec![at(8, 0), at(11, 0), at(14, 0), at(16, 0)]);

        let upcoming = db.upcoming_appointments("p1", at(10, 0), 5).unwrap();
        let ids: Vec<_> = upcoming.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec![mid.id.as_str(), late.id.as_str()]);

        let upcoming = db.upcoming_appointments("p1", at(10, 0), 1).unwrap();
        assert_eq!(upcoming.len(), 1);
    }

    #[test]
    fn test_delete_appointment() {
        let db = setup_db();
        let apt = appointment("p1", at(9, 0), 60);
        db.insert_appointment(&apt).unwrap();
        assert!(db.delete_appointment(&apt.id).unwrap());
        assert!(db.get_appointment(&apt.id).unwrap().is_none());
    }
}
