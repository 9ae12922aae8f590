use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::core::{
    BridgeConfig, BridgeError, Clock, CreatedInvoice, GenerateOutcome, InvoiceApi, OrderRecord,
    OrderStore, SequenceStore, Sleeper, StoredInvoice, SyncStatus, SystemClock, ThreadSleeper,
};

use super::assembler::InvoiceAssembler;

/// What started an invoice generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Order status change or scheduled job; failures must not disturb
    /// the triggering workflow.
    Automatic,
    /// An operator action; the outcome message is shown to them.
    Manual,
}

/// Generates invoices for orders and refunds and fetches their PDFs.
///
/// Never lets an error escape [`generate`](Self::generate): failures are
/// logged, noted on the record and returned as an unsuccessful
/// [`GenerateOutcome`].
///
/// The duplicate check reads the store before creating the remote invoice.
/// It is not atomic; two concurrent triggers for the same order can both
/// pass it.
pub struct InvoiceService<'a, A, S> {
    config: &'a BridgeConfig,
    api: A,
    store: S,
    sequences: &'a dyn SequenceStore,
    clock: Box<dyn Clock + 'a>,
    sleeper: Box<dyn Sleeper + 'a>,
}

impl<'a, A: InvoiceApi, S: OrderStore> InvoiceService<'a, A, S> {
    pub fn new(config: &'a BridgeConfig, api: A, store: S, sequences: &'a dyn SequenceStore) -> Self {
        Self {
            config,
            api,
            store,
            sequences,
            clock: Box::new(SystemClock),
            sleeper: Box::new(ThreadSleeper),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'a) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replace the sleeper used between PDF download attempts.
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'a) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Create the remote invoice for `record` and record it in the store.
    pub fn generate(&mut self, record: &OrderRecord, trigger: Trigger) -> GenerateOutcome {
        match self.try_generate(record) {
            Ok((created, number)) => {
                info!(
                    record = record.id(),
                    invoice_id = %created.id,
                    number = number.as_deref().unwrap_or("-"),
                    "invoice created"
                );
                GenerateOutcome::created(created.id, number)
            }
            Err(err) => {
                let message = err.to_string();
                match trigger {
                    Trigger::Automatic => {
                        warn!(record = record.id(), error = %err, "automatic invoice generation failed")
                    }
                    Trigger::Manual => {
                        error!(record = record.id(), error = %err, "invoice generation failed")
                    }
                }
                let note = format!("Invoice generation failed: {message}");
                if let Err(note_err) = self.store.add_note(record.id(), &note) {
                    warn!(record = record.id(), error = %note_err, "could not record audit note");
                }
                GenerateOutcome::failed(message)
            }
        }
    }

    fn try_generate(
        &mut self,
        record: &OrderRecord,
    ) -> Result<(CreatedInvoice, Option<String>), BridgeError> {
        self.config.validate()?;

        if let Some(existing) = self.store.stored_invoice(record.id())? {
            return Err(BridgeError::Precondition(format!(
                "record #{} already has invoice {}",
                record.id(),
                existing.number.as_deref().unwrap_or(&existing.invoice_id)
            )));
        }

        let now = self.clock.now();
        let payload = InvoiceAssembler::new(self.config, self.sequences)
            .issued_on(issue_date(now))
            .prepare_invoice_data(record)?;

        let created = self.api.create(&self.config.account_id, &payload)?;
        let number = created.number.clone().or_else(|| payload.number.clone());

        let stored = StoredInvoice {
            invoice_id: created.id.clone(),
            number: number.clone(),
            issued_at: now,
        };
        self.store.save_invoice(record.id(), &stored)?;

        // The invoice exists remotely and is linked; the rest is bookkeeping.
        let status = SyncStatus::fetched(&created.state, None, now);
        if let Err(err) = self.store.save_status(record.id(), &status) {
            warn!(record = record.id(), error = %err, "could not store initial invoice status");
        }

        let kind = if payload.is_credit_note() {
            "Credit note"
        } else if payload.is_amendment() {
            "Rectificative invoice"
        } else {
            "Invoice"
        };
        let note = format!(
            "{kind} {} created (id {})",
            number.as_deref().unwrap_or("pending number"),
            created.id
        );
        if let Err(err) = self.store.add_note(record.id(), &note) {
            warn!(record = record.id(), error = %err, "could not record audit note");
        }

        Ok((created, number))
    }

    /// Download the PDF of a remote invoice, retrying while the platform
    /// is still rendering it.
    pub fn download_pdf(&self, invoice_id: &str) -> Result<Vec<u8>, BridgeError> {
        self.config
            .retry
            .execute_with(self.sleeper.as_ref(), || self.api.download_pdf(invoice_id))
    }

    /// [`download_pdf`](Self::download_pdf) for the invoice stored on a record.
    pub fn download_pdf_for(&self, record_id: u64) -> Result<Vec<u8>, BridgeError> {
        let invoice = self.store.stored_invoice(record_id)?.ok_or_else(|| {
            BridgeError::Precondition(format!("record #{record_id} has no invoice"))
        })?;
        self.download_pdf(&invoice.invoice_id)
    }
}

fn issue_date(now: chrono::DateTime<chrono::Utc>) -> NaiveDate {
    now.date_naive()
}
