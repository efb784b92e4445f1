//! SQLite schema definition.

/// Complete database schema for eolia.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Practitioner Profiles
-- ============================================================================

CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,                         -- identity provider account ID
    email TEXT NOT NULL,
    name TEXT,
    username TEXT UNIQUE,                        -- public booking handle
    specialty TEXT,
    company_name TEXT,
    phone TEXT,
    working_hours TEXT NOT NULL DEFAULT '{}',    -- JSON object keyed by weekday
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    practitioner_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL,
    phone TEXT NOT NULL,
    gdpr_consent INTEGER NOT NULL DEFAULT 0,
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_practitioner ON patients(practitioner_id);
CREATE INDEX IF NOT EXISTS idx_patients_email ON patients(practitioner_id, email);
CREATE INDEX IF NOT EXISTS idx_patients_last_name ON patients(last_name);

-- ============================================================================
-- Appointments
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    id TEXT PRIMARY KEY,
    practitioner_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    patient_id TEXT REFERENCES patients(id) ON DELETE SET NULL,
    start_time TEXT NOT NULL,                    -- practitioner-local YYYY-MM-DDTHH:MM:SS
    end_time TEXT NOT NULL,
    motif TEXT,
    notes TEXT,
    status TEXT NOT NULL DEFAULT 'scheduled'
        CHECK (status IN ('scheduled', 'completed', 'cancelled', 'no_show')),
    reminder_sent INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK (start_time < end_time)
);

CREATE INDEX IF NOT EXISTS idx_appointments_start ON appointments(practitioner_id, start_time);
CREATE INDEX IF NOT EXISTS idx_appointments_status ON appointments(status);

-- ============================================================================
-- Invoices
-- ============================================================================

CREATE TABLE IF NOT EXISTS invoices (
    id TEXT PRIMARY KEY,
    practitioner_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    number TEXT NOT NULL,                        -- FAC-YYYY-MM-NNN
    amount_cents INTEGER NOT NULL,
    appointment_id TEXT REFERENCES appointments(id) ON DELETE SET NULL,
    patient_id TEXT REFERENCES patients(id) ON DELETE SET NULL,
    patient_name TEXT,
    patient_email TEXT,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'unpaid'
        CHECK (status IN ('unpaid', 'paid', 'cancelled')),
    paid_at TEXT,
    sent_at TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (practitioner_id, number)
);

CREATE INDEX IF NOT EXISTS idx_invoices_practitioner ON invoices(practitioner_id);
"#;
