//! Invoice models.

use serde::{Deserialize, Serialize};

/// Payment status of an invoice.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Unpaid,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "unpaid",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(InvoiceStatus::Unpaid),
            "paid" => Some(InvoiceStatus::Paid),
            "cancelled" => Some(InvoiceStatus::Cancelled),
            _ => None,
        }
    }
}

/// An invoice issued by a practitioner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    pub id: String,
    pub practitioner_id: String,
    /// Sequential number, `FAC-YYYY-MM-NNN`
    pub number: String,
    /// Amount in euro cents
    pub amount_cents: i64,
    pub appointment_id: Option<String>,
    pub patient_id: Option<String>,
    /// Snapshot of the patient's name at issue time
    pub patient_name: Option<String>,
    pub patient_email: Option<String>,
    pub description: Option<String>,
    pub status: InvoiceStatus,
    pub paid_at: Option<String>,
    pub sent_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Invoice {
    pub fn new(practitioner_id: String, number: String, amount_cents: i64) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            practitioner_id,
            number,
            amount_cents,
            appointment_id: None,
            patient_id: None,
            patient_name: None,
            patient_email: None,
            description: None,
            status: InvoiceStatus::Unpaid,
            paid_at: None,
            sent_at: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Render the invoice number following `existing_count` invoices of the month.
pub fn invoice_number(year: i32, month: u32, existing_count: u32) -> String {
    format!("FAC-{}-{:02}-{:03}", year, month, existing_count + 1)
}
