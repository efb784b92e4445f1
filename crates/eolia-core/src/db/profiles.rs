//! Practitioner profile database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{normalize_username, PractitionerProfile, WorkingHours};

const PROFILE_COLUMNS: &str = "id, email, name, username, specialty, company_name, phone, \
                               working_hours, created_at, updated_at";

/// Stored form of a profile's handle; a handle with nothing left after cleaning is unset.
fn stored_username(profile: &PractitionerProfile) -> Option<String> {
    profile
        .username
        .as_deref()
        .map(normalize_username)
        .filter(|u| !u.is_empty())
}

impl Database {
    /// Insert a new profile. The username is stored normalized.
    pub fn insert_profile(&self, profile: &PractitionerProfile) -> DbResult<()> {
        let working_hours_json = serde_json::to_string(&profile.working_hours)?;
        let username = stored_username(profile);

        self.conn.execute(
            r#"
            INSERT INTO profiles (
                id, email, name, username, specialty, company_name, phone,
                working_hours, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                profile.id,
                profile.email,
                profile.name,
                username,
                profile.specialty,
                profile.company_name,
                profile.phone,
                working_hours_json,
                profile.created_at,
                profile.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing profile. The username is stored normalized.
    pub fn update_profile(&self, profile: &PractitionerProfile) -> DbResult<bool> {
        let working_hours_json = serde_json::to_string(&profile.working_hours)?;
        let username = stored_username(profile);

        let rows_affected = self.conn.execute(
            r#"
            UPDATE profiles SET
                email = ?2,
                name = ?3,
                username = ?4,
                specialty = ?5,
                company_name = ?6,
                phone = ?7,
                working_hours = ?8,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                profile.id,
                profile.email,
                profile.name,
                username,
                profile.specialty,
                profile.company_name,
                profile.phone,
                working_hours_json,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Replace a practitioner's weekly working hours.
    pub fn update_working_hours(&self, id: &str, hours: &WorkingHours) -> DbResult<bool> {
        let json = serde_json::to_string(hours)?;
        let rows_affected = self.conn.execute(
            "UPDATE profiles SET working_hours = ?2, updated_at = datetime('now') WHERE id = ?1",
            params![id, json],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a profile by ID.
    pub fn get_profile(&self, id: &str) -> DbResult<Option<PractitionerProfile>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM profiles WHERE id = ?", PROFILE_COLUMNS),
                [id],
                ProfileRow::from_row,
            )
            .optional()?
            .map(TryInto::try_into)
            .transpose()
    }

    /// Get a profile by its public booking handle, as typed or as found in the URL.
    pub fn get_profile_by_username(&self, username: &str) -> DbResult<Option<PractitionerProfile>> {
        let username = normalize_username(username);
        self.conn
            .query_row(
                &format!("SELECT {} FROM profiles WHERE username = ?", PROFILE_COLUMNS),
                [&username],
                ProfileRow::from_row,
            )
            .optional()?
            .map(TryInto::try_into)
            .transpose()
    }

    /// Whether the normalized form of a username is already taken.
    pub fn username_exists(&self, username: &str) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM profiles WHERE username = ?",
            [normalize_username(username)],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

/// Intermediate row struct for database mapping.
struct ProfileRow {
    id: String,
    email: String,
    name: Option<String>,
    username: Option<String>,
    specialty: Option<String>,
    company_name: Option<String>,
    phone: Option<String>,
    working_hours: String,
    created_at: String,
    updated_at: String,
}

impl ProfileRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            username: row.get(3)?,
            specialty: row.get(4)?,
            company_name: row.get(5)?,
            phone: row.get(6)?,
            working_hours: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }
}

impl TryFrom<ProfileRow> for PractitionerProfile {
    type Error = DbError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let working_hours: WorkingHours = serde_json::from_str(&row.working_hours)?;

        Ok(PractitionerProfile {
            id: row.id,
            email: row.email,
            name: row.name,
            username: row.username,
            specialty: row.specialty,
            company_name: row.company_name,
            phone: row.phone,
            working_hours,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
