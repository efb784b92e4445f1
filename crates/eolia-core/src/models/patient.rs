//! Patient models.

use serde::{Deserialize, Serialize};

/// A patient of a practitioner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Unique patient ID
    pub id: String,
    /// Practitioner this patient belongs to
    pub practitioner_id: String,
    pub first_name: String,
    pub last_name: String,
    /// Contact email, also used to recognise returning patients
    pub email: String,
    /// Phone number, digits only (spaces stripped)
    pub phone: String,
    /// Consent to personal data processing
    pub gdpr_consent: bool,
    /// Practitioner's private notes
    pub notes: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Patient {
    /// Create a new patient with required fields.
    pub fn new(
        practitioner_id: String,
        first_name: String,
        last_name: String,
        email: String,
        phone: &str,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            practitioner_id,
            first_name,
            last_name,
            email,
            phone: phone.chars().filter(|c| !c.is_whitespace()).collect(),
            gdpr_consent: false,
            notes: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// "First Last" display name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_patient() {
        let patient = Patient::new(
            "pract-1".into(),
            "Marie".into(),
            "Dupont".into(),
            "marie.dupont@email.com".into(),
            "06 12 34 56 78",
        );
        assert_eq!(patient.full_name(), "Marie Dupont");
        assert_eq!(patient.phone, "0612345678");
        assert!(!patient.gdpr_consent);
        assert_eq!(patient.id.len(), 36); // UUID format
    }
}
