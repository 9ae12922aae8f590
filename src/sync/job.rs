use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::{
    BridgeError, Clock, InvoiceApi, InvoicedRecord, OrderStore, SyncSettings, SyncStatus,
    SystemClock,
};

/// Counts of one synchronization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub synced: usize,
    pub errors: usize,
}

/// Whether a record's cached status should be refreshed at `now`.
///
/// True when the status is missing, empty or not final, or when it was
/// last fetched longer ago than `recheck_after`.
pub fn needs_sync(status: Option<&SyncStatus>, now: DateTime<Utc>, settings: &SyncSettings) -> bool {
    let Some(status) = status else {
        return true;
    };
    if status.status.trim().is_empty() || !settings.is_final(&status.status) {
        return true;
    }
    match status.status_updated {
        None => true,
        // A timestamp in the future counts as fresh.
        Some(updated) => (now - updated)
            .to_std()
            .is_ok_and(|age| age > settings.recheck_after),
    }
}

/// Pulls remote invoice states into the order store.
pub struct StatusSync<'a, A> {
    api: A,
    settings: &'a SyncSettings,
    clock: Box<dyn Clock + 'a>,
}

impl<'a, A: InvoiceApi> StatusSync<'a, A> {
    pub fn new(api: A, settings: &'a SyncSettings) -> Self {
        Self {
            api,
            settings,
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'a) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Records the next run would refresh, in store order, up to the batch size.
    pub fn candidates<S: OrderStore>(&self, store: &S) -> Result<Vec<InvoicedRecord>, BridgeError> {
        let now = self.clock.now();
        Ok(store
            .invoiced_records()?
            .into_iter()
            .filter(|r| needs_sync(r.status.as_ref(), now, self.settings))
            .take(self.settings.batch_size)
            .collect())
    }

    /// Refresh one batch of candidates.
    ///
    /// Stops before the next record once the time budget is spent. A
    /// failure on one record is counted and the batch continues.
    pub fn sync_batch<S: OrderStore>(&self, store: &mut S) -> Result<SyncReport, BridgeError> {
        let started = Instant::now();
        let candidates = self.candidates(store)?;
        let total = candidates.len();
        let mut report = SyncReport::default();

        for record in candidates {
            if started.elapsed() >= self.settings.time_budget {
                info!(
                    processed = report.synced + report.errors,
                    total, "status sync time budget exhausted"
                );
                break;
            }
            match self.sync_one(store, record.record_id, &record.invoice_id) {
                Ok(status) => {
                    debug!(record = record.record_id, status = %status.status, "status synced");
                    report.synced += 1;
                }
                Err(err) => {
                    warn!(
                        record = record.record_id,
                        invoice_id = %record.invoice_id,
                        error = %err,
                        "status sync failed"
                    );
                    report.errors += 1;
                }
            }
        }

        info!(synced = report.synced, errors = report.errors, "status sync finished");
        Ok(report)
    }

    /// Fetch and store the status of a single invoice.
    pub fn sync_one<S: OrderStore>(
        &self,
        store: &mut S,
        record_id: u64,
        invoice_id: &str,
    ) -> Result<SyncStatus, BridgeError> {
        let remote = self.api.retrieve(invoice_id)?;
        let status = SyncStatus::fetched(
            &remote.state,
            remote.error_message.as_deref(),
            self.clock.now(),
        );
        store.save_status(record_id, &status)?;
        Ok(status)
    }

    /// Operator-initiated "recheck now" for one record.
    pub fn recheck<S: OrderStore>(&self, store: &mut S, record_id: u64) -> Result<SyncStatus, BridgeError> {
        let invoice = store.stored_invoice(record_id)?.ok_or_else(|| {
            BridgeError::Precondition(format!("record #{record_id} has no invoice"))
        })?;
        self.sync_one(store, record_id, &invoice.invoice_id)
    }
}
