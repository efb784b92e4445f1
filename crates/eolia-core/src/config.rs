//! Runtime settings read from the environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Flat price of one session, used for the dashboard revenue estimate (60 €).
pub const DEFAULT_SESSION_PRICE_CENTS: i64 = 6000;
pub const DEFAULT_DURATION_MINUTES: i64 = 60;
/// Appointments listed under "next appointments" on the dashboard.
pub const DEFAULT_UPCOMING_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub database_path: String,
    pub session_price_cents: i64,
    pub default_duration_minutes: i64,
    pub upcoming_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: "eolia.db".to_string(),
            session_price_cents: DEFAULT_SESSION_PRICE_CENTS,
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
            upcoming_limit: DEFAULT_UPCOMING_LIMIT,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_path = lookup("EOLIA_DATABASE_PATH").unwrap_or(defaults.database_path);
        let session_price_cents = parse_or(
            &lookup,
            "EOLIA_SESSION_PRICE_CENTS",
            defaults.session_price_cents,
        )?;
        let default_duration_minutes = parse_or(
            &lookup,
            "EOLIA_DEFAULT_DURATION",
            defaults.default_duration_minutes,
        )?;
        let upcoming_limit = parse_or(&lookup, "EOLIA_UPCOMING_LIMIT", defaults.upcoming_limit)?;

        if default_duration_minutes <= 0 {
            anyhow::bail!(
                "EOLIA_DEFAULT_DURATION must be positive, got {}",
                default_duration_minutes
            );
        }

        Ok(Self {
            database_path,
            session_price_cents,
            default_duration_minutes,
            upcoming_limit,
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Failed to parse {}={:?}", key, raw)),
        None => Ok(default),
    }
}
