//! Invoice database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{invoice_number, Invoice, InvoiceStatus};

const INVOICE_COLUMNS: &str = "id, practitioner_id, number, amount_cents, appointment_id, \
                               patient_id, patient_name, patient_email, description, status, \
                               paid_at, sent_at, created_at, updated_at";

impl Database {
    /// Insert a new invoice.
    pub fn insert_invoice(&self, invoice: &Invoice) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO invoices (
                id, practitioner_id, number, amount_cents, appointment_id,
                patient_id, patient_name, patient_email, description, status,
                paid_at, sent_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                invoice.id,
                invoice.practitioner_id,
                invoice.number,
                invoice.amount_cents,
                invoice.appointment_id,
                invoice.patient_id,
                invoice.patient_name,
                invoice.patient_email,
                invoice.description,
                invoice.status.as_str(),
                invoice.paid_at,
                invoice.sent_at,
                invoice.created_at,
                invoice.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get an invoice by ID.
    pub fn get_invoice(&self, id: &str) -> DbResult<Option<Invoice>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM invoices WHERE id = ?", INVOICE_COLUMNS),
                [id],
                InvoiceRow::from_row,
            )
            .optional()?
            .map(TryInto::try_into)
            .transpose()
    }

    /// List a practitioner's invoices, most recent number first.
    pub fn list_invoices(&self, practitioner_id: &str) -> DbResult<Vec<Invoice>> {
        // Month prefix `FAC-YYYY-MM` first, then the sequence compared numerically
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {}
            FROM invoices
            WHERE practitioner_id = ?
            ORDER BY substr(number, 1, 11) DESC, length(number) DESC, number DESC
            "#,
            INVOICE_COLUMNS
        ))?;

        let rows = stmt.query_map([practitioner_id], InvoiceRow::from_row)?;

        let mut invoices = Vec::new();
        for row in rows {
            invoices.push(row?.try_into()?);
        }
        Ok(invoices)
    }

    /// Number for the next invoice a practitioner issues in `year`/`month`.
    pub fn next_invoice_number(
        &self,
        practitioner_id: &str,
        year: i32,
        month: u32,
    ) -> DbResult<String> {
        let prefix = format!("FAC-{}-{:02}-%", year, month);
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM invoices WHERE practitioner_id = ? AND number LIKE ?",
            params![practitioner_id, prefix],
            |row| row.get(0),
        )?;
        Ok(invoice_number(year, month, count as u32))
    }

    /// Mark an invoice as paid at `paid_at` (RFC 3339).
    pub fn mark_invoice_paid(&self, id: &str, paid_at: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE invoices SET status = 'paid', paid_at = ?2, updated_at = datetime('now') \
             WHERE id = ?1 AND status = 'unpaid'",
            params![id, paid_at],
        )?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct InvoiceRow {
    id: String,
    practitioner_id: String,
    number: String,
    amount_cents: i64,
    appointment_id: Option<String>,
    patient_id: Option<String>,
    patient_name: Option<String>,
    patient_email: Option<String>,
    description: Option<String>,
    status: String,
    paid_at: Option<String>,
    sent_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl InvoiceRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            practitioner_id: row.get(1)?,
            number: row.get(2)?,
            amount_cents: row.get(3)?,
            appointment_id: row.get(4)?,
            patient_id: row.get(5)?,
            patient_name: row.get(6)?,
            patient_email: row.get(7)?,
            description: row.get(8)?,
            status: row.get(9)?,
            paid_at: row.get(10)?,
            sent_at: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = DbError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        let status = InvoiceStatus::parse(&row.status).ok_or_else(|| {
            DbError::Constraint(format!("Unknown invoice status: {}", row.status))
        })?;

        Ok(Invoice {
            id: row.id,
            practitioner_id: row.practitioner_id,
            number: row.number,
            amount_cents: row.amount_cents,
            appointment_id: row.appointment_id,
            patient_id: row.patient_id,
            patient_name: row.patient_name,
            patient_email: row.patient_email,
            description: row.description,
            status,
            paid_at: row.paid_at,
            sent_at: row.sent_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
