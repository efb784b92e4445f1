//! Patient database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Patient;

const PATIENT_COLUMNS: &str = "id, practitioner_id, first_name, last_name, email, phone, \
                               gdpr_consent, notes, created_at, updated_at";

/// `LIKE` pattern matching names that start with `query` literally.
fn prefix_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 1);
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        practitioner_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        gdpr_consent: row.get(6)?,
        notes: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

impl Database {
    /// Insert a new patient.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO patients (
                id, practitioner_id, first_name, last_name, email, phone,
                gdpr_consent, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                patient.id,
                patient.practitioner_id,
                patient.first_name,
                patient.last_name,
                patient.email,
                patient.phone,
                patient.gdpr_consent,
                patient.notes,
                patient.created_at,
                patient.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing patient.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                first_name = ?2,
                last_name = ?3,
                email = ?4,
                phone = ?5,
                gdpr_consent = ?6,
                notes = ?7,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                patient.id,
                patient.first_name,
                patient.last_name,
                patient.email,
                patient.phone,
                patient.gdpr_consent,
                patient.notes,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM patients WHERE id = ?", PATIENT_COLUMNS),
                [id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Find a practitioner's patient by email (returning patients on the booking page).
    pub fn find_patient_by_email(
        &self,
        practitioner_id: &str,
        email: &str,
    ) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM patients WHERE practitioner_id = ? AND email = ? \
                     ORDER BY created_at LIMIT 1",
                    PATIENT_COLUMNS
                ),
                [practitioner_id, email],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Search a practitioner's patients by first or last name (prefix match).
    pub fn search_patients(
        &self,
        practitioner_id: &str,
        query: &str,
        limit: usize,
    ) -> DbResult<Vec<Patient>> {
        let pattern = prefix_pattern(query);
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {}
            FROM patients
            WHERE practitioner_id = ?1
              AND (first_name LIKE ?2 ESCAPE '\' OR last_name LIKE ?2 ESCAPE '\')
            ORDER BY last_name, first_name
            LIMIT ?3
            "#,
            PATIENT_COLUMNS
        ))?;

        let rows = stmt.query_map(
            params![practitioner_id, pattern, limit as i64],
            patient_from_row,
        )?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List all patients of a practitioner.
    pub fn list_patients(&self, practitioner_id: &str) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM patients WHERE practitioner_id = ? ORDER BY last_name, first_name",
            PATIENT_COLUMNS
        ))?;

        let rows = stmt.query_map([practitioner_id], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Count a practitioner's patients.
    pub fn count_patients(&self, practitioner_id: &str) -> DbResult<u32> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM patients WHERE practitioner_id = ?",
            [practitioner_id],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }

    /// Delete a patient.
    pub fn delete_patient(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM patients WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PractitionerProfile;

    fn setup_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        for id in ["p1", "p2"] {
            db.insert_profile(&PractitionerProfile::new(id.into(), format!("{}@example.fr", id)))
                .unwrap();
        }
        db
    }

    fn patient(practitioner: &str, first: &str, last: &str, email: &str) -> Patient {
        Patient::new(
            practitioner.into(),
            first.into(),
            last.into(),
            email.into(),
            "06 12 34 56 78",
        )
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();

        let mut p = patient("p1", "Marie", "Dupont", "marie@email.com");
        p.gdpr_consent = true;
        db.insert_patient(&p).unwrap();

        let retrieved = db.get_patient(&p.id).unwrap().unwrap();
        assert_eq!(retrieved.first_name, "Marie");
        assert_eq!(retrieved.phone, "0612345678");
        assert!(retrieved.gdpr_consent);
    }

    #[test]
    fn test_update_patient() {
        let db = setup_db();

        let mut p = patient("p1", "Marie", "Dupont", "marie@email.com");
        db.insert_patient(&p).unwrap();

        p.notes = Some("Troubles du sommeil".into());
        assert!(db.update_patient(&p).unwrap());

        let retrieved = db.get_patient(&p.id).unwrap().unwrap();
        assert_eq!(retrieved.notes, Some("Troubles du sommeil".into()));
    }

    #[test]
    fn test_find_by_email_is_scoped_to_practitioner() {
        let db = setup_db();

        let p = patient("p1", "Marie", "Dupont", "marie@email.com");
        db.insert_patient(&p).unwrap();

        let found = db.find_patient_by_email("p1", "marie@email.com").unwrap().unwrap();
        assert_eq!(found.id, p.id);
        assert!(db.find_patient_by_email("p2", "marie@email.com").unwrap().is_none());
    }

    #[test]
    fn test_search_patients() {
        let db = setup_db();

        db.insert_patient(&patient("p1", "Marie", "Dupont", "a@x.fr")).unwrap();
        db.insert_patient(&patient("p1", "Jean", "Martin", "b@x.fr")).unwrap();
        db.insert_patient(&patient("p1", "Martine", "Leroy", "c@x.fr")).unwrap();
        db.insert_patient(&patient("p2", "Marc", "Durand", "d@x.fr")).unwrap();

        let results = db.search_patients("p1", "Mar", 10).unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|p| p.practitioner_id == "p1"));

        let results = db.search_patients("p1", "Mar", 1).unwrap();
        assert_eq!(results.len(), 1);

        assert_eq!(db.count_patients("p1").unwrap(), 3);
        assert_eq!(db.list_patients("p2").unwrap().len(), 1);
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let db = setup_db();

        db.insert_patient(&patient("p1", "Marie", "Dupont", "a@x.fr")).unwrap();
        db.insert_patient(&patient("p1", "Jean", "Le_Gall", "b@x.fr")).unwrap();
        db.insert_patient(&patient("p1", "Anne", "Lemaire", "c@x.fr")).unwrap();
        db.insert_patient(&patient("p1", "Paul", "100%Bio", "d@x.fr")).unwrap();

        assert!(db.search_patients("p1", "%", 10).unwrap().is_empty());

        let results = db.search_patients("p1", "Le_", 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].last_name, "Le_Gall");

        let results = db.search_patients("p1", "100%", 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].first_name, "Paul");

        assert_eq!(prefix_pattern(r"a\b_c%"), r"a\\b\_c\%%");
    }

    #[test]
    fn test_delete_patient() {
        let db = setup_db();
        let p = patient("p1", "Marie", "Dupont", "marie@email.com");
        db.insert_patient(&p).unwrap();

        assert!(db.delete_patient(&p.id).unwrap());
        assert!(!db.delete_patient(&p.id).unwrap());
        assert!(db.get_patient(&p.id).unwrap().is_none());
    }
}
