use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{TaxCategory, TaxCategoryResult};

/// Invoice submission payload, as posted to the invoicing API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoicePayload {
    #[serde(rename = "type")]
    pub invoice_type: InvoiceType,
    pub date: NaiveDate,
    pub due_date: NaiveDate,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Two-letter language code.
    pub language: String,
    pub contact: InvoiceContact,
    /// Address the remote side delivers the invoice to.
    pub contact_email_override: String,
    #[serde(rename = "invoice_lines_attributes")]
    pub lines: Vec<InvoiceLine>,
    /// Free text referencing the source order.
    pub extra_info: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_code: Option<String>,
    /// Absent when the remote side assigns the number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amended_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amended_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amended_reason: Option<String>,
    /// Only ever `Some(true)`; omitted for invoices and rectificatives.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_credit_note: Option<bool>,
}

impl InvoicePayload {
    /// Whether this payload amends an earlier invoice.
    pub fn is_amendment(&self) -> bool {
        self.amended_number.is_some()
    }

    pub fn is_credit_note(&self) -> bool {
        self.is_credit_note == Some(true)
    }
}

/// Invoice type as understood by the invoicing API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceType {
    /// Full invoice addressed to an identified (tax-registered) customer.
    StandardInvoice,
    /// Simplified invoice (ticket) for consumers without a tax identifier.
    SimplifiedInvoice,
}

/// Customer block of the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceContact {
    pub name: String,
    pub email: String,
    pub country: String,
    pub address: String,
    pub city: String,
    pub postalcode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tin_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tin_scheme: Option<String>,
}

/// One invoice line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(rename = "taxes_attributes")]
    pub taxes: Vec<LineTax>,
}

impl InvoiceLine {
    /// `quantity * price`.
    pub fn amount(&self) -> Decimal {
        self.quantity * self.price
    }
}

/// Tax sub-structure of an invoice line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTax {
    pub name: String,
    pub category: TaxCategory,
    #[serde(with = "rust_decimal::serde::float")]
    pub percent: Decimal,
}

impl From<TaxCategoryResult> for LineTax {
    fn from(result: TaxCategoryResult) -> Self {
        Self {
            name: result.name,
            category: result.category,
            percent: result.percent,
        }
    }
}

/// Result of a generate operation, as shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateOutcome {
    pub success: bool,
    pub invoice_id: Option<String>,
    pub invoice_number: Option<String>,
    pub message: String,
}

impl GenerateOutcome {
    pub fn created(invoice_id: String, invoice_number: Option<String>) -> Self {
        let message = match &invoice_number {
            Some(number) => format!("Invoice {number} created"),
            None => format!("Invoice {invoice_id} created"),
        };
        Self {
            success: true,
            invoice_id: Some(invoice_id),
            invoice_number,
            message,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            invoice_id: None,
            invoice_number: None,
            message: message.into(),
        }
    }
}
