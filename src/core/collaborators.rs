//! Contracts of the systems around the core: the remote invoicing API
//! and the host's order store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::BridgeError;
use super::payload::InvoicePayload;
use super::types::{StoredInvoice, SyncStatus};

/// Response to an invoice creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedInvoice {
    pub id: String,
    pub number: Option<String>,
    pub state: String,
}

/// Current remote state of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteInvoice {
    pub id: String,
    pub state: String,
    pub error_message: Option<String>,
}

/// The remote invoicing API.
///
/// Errors are [`BridgeError::Remote`] tagged with a
/// [`RemoteErrorKind`](super::RemoteErrorKind).
pub trait InvoiceApi {
    fn create(
        &self,
        account_id: &str,
        payload: &InvoicePayload,
    ) -> Result<CreatedInvoice, BridgeError>;

    fn retrieve(&self, invoice_id: &str) -> Result<RemoteInvoice, BridgeError>;

    fn download_pdf(&self, invoice_id: &str) -> Result<Vec<u8>, BridgeError>;
}

impl<T: InvoiceApi + ?Sized> InvoiceApi for &T {
    fn create(
        &self,
        account_id: &str,
        payload: &InvoicePayload,
    ) -> Result<CreatedInvoice, BridgeError> {
        (**self).create(account_id, payload)
    }

    fn retrieve(&self, invoice_id: &str) -> Result<RemoteInvoice, BridgeError> {
        (**self).retrieve(invoice_id)
    }

    fn download_pdf(&self, invoice_id: &str) -> Result<Vec<u8>, BridgeError> {
        (**self).download_pdf(invoice_id)
    }
}

/// An order or refund that has a remote invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoicedRecord {
    pub record_id: u64,
    pub invoice_id: String,
    /// `None` when the status was never fetched.
    pub status: Option<SyncStatus>,
}

/// The host's persistence for invoice metadata.
pub trait OrderStore {
    /// Invoice already created for a record.
    fn stored_invoice(&self, record_id: u64) -> Result<Option<StoredInvoice>, BridgeError>;

    fn save_invoice(&mut self, record_id: u64, invoice: &StoredInvoice) -> Result<(), BridgeError>;

    fn save_status(&mut self, record_id: u64, status: &SyncStatus) -> Result<(), BridgeError>;

    /// All records with a remote invoice id, in the store's natural order.
    fn invoiced_records(&self) -> Result<Vec<InvoicedRecord>, BridgeError>;

    /// Append an audit note to the record.
    fn add_note(&mut self, record_id: u64, note: &str) -> Result<(), BridgeError>;
}

/// Wall-clock source, so time-dependent logic can be tested.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// [`Clock`] reading the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// [`Clock`] frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
