//! Practitioner profile.

use serde::{Deserialize, Serialize};

use super::schedule::WorkingHours;

/// Specialties offered at sign-up.
pub const SPECIALTIES: [&str; 10] = [
    "Sophrologie",
    "Naturopathie",
    "Hypnothérapie",
    "Réflexologie",
    "Ostéopathie",
    "Kinésithérapie",
    "Psychologie",
    "Coaching",
    "Massage bien-être",
    "Autre",
];

/// Public booking handle as it appears in the booking URL: lowercased, keeping only
/// `a-z`, `0-9` and `-`.
pub fn normalize_username(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

/// The account owner offering appointments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PractitionerProfile {
    /// Account ID from the identity provider
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    /// Public booking handle
    pub username: Option<String>,
    pub specialty: Option<String>,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    /// Weekly availability; empty until onboarding is done
    pub working_hours: WorkingHours,
    pub created_at: String,
    pub updated_at: String,
}

impl PractitionerProfile {
    pub fn new(id: String, email: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id,
            email,
            name: None,
            username: None,
            specialty: None,
            company_name: None,
            phone: None,
            working_hours: WorkingHours::default(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// A profile can receive public bookings once it has a username.
    pub fn has_booking_page(&self) -> bool {
        self.username.as_deref().is_some_and(|u| !u.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_page_requires_username() {
        let mut profile = PractitionerProfile::new("p1".into(), "a@b.fr".into());
        assert!(!profile.has_booking_page());
        profile.username = Some(String::new());
        assert!(!profile.has_booking_page());
        profile.username = Some("claire-martin".into());
        assert!(profile.has_booking_page());
    }

    #[test]
    fn test_normalize_username() {
        let cases = [
            ("claire-martin", "claire-martin"),
            ("Claire-Martin", "claire-martin"),
            ("Claire.Martin", "clairemartin"),
            ("claire martin 2", "clairemartin2"),
            ("Élodie_Roux", "lodieroux"),
            ("!!!", ""),
        ];
        for (raw, expected) in cases {
            assert_eq!(normalize_username(raw), expected, "input {:?}", raw);
        }
    }

    #[test]
    fn test_specialties() {
        assert!(SPECIALTIES.contains(&"Sophrologie"));
        assert_eq!(SPECIALTIES.last(), Some(&"Autre"));
    }
}
