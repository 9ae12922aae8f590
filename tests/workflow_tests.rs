//! Generate and status-sync workflows against in-memory collaborators.

#![cfg(feature = "core")]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use invoicebridge::core::*;
use invoicebridge::invoice::{InvoiceService, Trigger};
use invoicebridge::sync::{StatusSync, SyncReport};
use rust_decimal_macros::dec;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

#[derive(Default)]
struct MemoryStore {
    invoices: BTreeMap<u64, StoredInvoice>,
    statuses: HashMap<u64, SyncStatus>,
    notes: Vec<(u64, String)>,
    notes_locked: bool,
    statuses_locked: bool,
}

impl MemoryStore {
    fn with_invoice(mut self, record_id: u64, invoice_id: &str, status: Option<SyncStatus>) -> Self {
        self.invoices.insert(
            record_id,
            StoredInvoice {
                invoice_id: invoice_id.into(),
                number: Some(format!("N-{record_id}")),
                issued_at: now(),
            },
        );
        if let Some(status) = status {
            self.statuses.insert(record_id, status);
        }
        self
    }

    fn notes_for(&self, record_id: u64) -> Vec<&str> {
        self.notes
            .iter()
            .filter(|(id, _)| *id == record_id)
            .map(|(_, n)| n.as_str())
            .collect()
    }
}

impl OrderStore for MemoryStore {
    fn stored_invoice(&self, record_id: u64) -> Result<Option<StoredInvoice>, BridgeError> {
        Ok(self.invoices.get(&record_id).cloned())
    }

    fn save_invoice(&mut self, record_id: u64, invoice: &StoredInvoice) -> Result<(), BridgeError> {
        self.invoices.insert(record_id, invoice.clone());
        Ok(())
    }

    fn save_status(&mut self, record_id: u64, status: &SyncStatus) -> Result<(), BridgeError> {
        if self.statuses_locked {
            return Err(BridgeError::Config("status table locked".into()));
        }
        self.statuses.insert(record_id, status.clone());
        Ok(())
    }

    fn invoiced_records(&self) -> Result<Vec<InvoicedRecord>, BridgeError> {
        Ok(self
            .invoices
            .iter()
            .map(|(id, inv)| InvoicedRecord {
                record_id: *id,
                invoice_id: inv.invoice_id.clone(),
                status: self.statuses.get(id).cloned(),
            })
            .collect())
    }

    fn add_note(&mut self, record_id: u64, note: &str) -> Result<(), BridgeError> {
        if self.notes_locked {
            return Err(BridgeError::Config("notes table locked".into()));
        }
        self.notes.push((record_id, note.to_string()));
        Ok(())
    }
}

/// Scripted remote API.
#[derive(Default)]
struct MockApi {
    created: RefCell<Vec<InvoicePayload>>,
    create_error: Option<RemoteErrorKind>,
    states: HashMap<String, Result<(String, Option<String>), RemoteErrorKind>>,
    pdf_responses: RefCell<VecDeque<Result<Vec<u8>, RemoteErrorKind>>>,
    retrieve_delay: Duration,
    retrieve_calls: Cell<usize>,
    pdf_calls: Cell<usize>,
}

impl MockApi {
    fn with_state(mut self, invoice_id: &str, state: &str, error: Option<&str>) -> Self {
        self.states.insert(
            invoice_id.into(),
            Ok((state.into(), error.map(str::to_string))),
        );
        self
    }

    fn with_failure(mut self, invoice_id: &str, kind: RemoteErrorKind) -> Self {
        self.states.insert(invoice_id.into(), Err(kind));
        self
    }
}

impl InvoiceApi for MockApi {
    fn create(
        &self,
        _account_id: &str,
        payload: &InvoicePayload,
    ) -> Result<CreatedInvoice, BridgeError> {
        if let Some(kind) = self.create_error {
            return Err(BridgeError::remote(kind, "rejected"));
        }
        let mut created = self.created.borrow_mut();
        created.push(payload.clone());
        Ok(CreatedInvoice {
            id: format!("inv_{}", created.len()),
            number: Some(format!("2024-{:04}", created.len())),
            state: "New".into(),
        })
    }

    fn retrieve(&self, invoice_id: &str) -> Result<RemoteInvoice, BridgeError> {
        self.retrieve_calls.set(self.retrieve_calls.get() + 1);
        std::thread::sleep(self.retrieve_delay);
        match self.states.get(invoice_id) {
            Some(Ok((state, error))) => Ok(RemoteInvoice {
                id: invoice_id.into(),
                state: state.clone(),
                error_message: error.clone(),
            }),
            Some(Err(kind)) => Err(BridgeError::remote(*kind, "scripted failure")),
            None => Err(BridgeError::remote(RemoteErrorKind::NotFound, "unknown invoice")),
        }
    }

    fn download_pdf(&self, _invoice_id: &str) -> Result<Vec<u8>, BridgeError> {
        self.pdf_calls.set(self.pdf_calls.get() + 1);
        match self.pdf_responses.borrow_mut().pop_front() {
            Some(Ok(bytes)) => Ok(bytes),
            Some(Err(kind)) => Err(BridgeError::remote(kind, "scripted failure")),
            None => Err(BridgeError::remote(RemoteErrorKind::NotFound, "not rendered")),
        }
    }
}

fn config() -> BridgeConfig {
    BridgeConfig::default()
        .with_credentials("key_test", "4711")
        .with_default_country("ES")
}

fn order(id: u64) -> Order {
    OrderBuilder::new(id, id.to_string())
        .billing(
            BillingBuilder::new("Ana", "García", "ES")
                .email("ana@example.com")
                .build(),
        )
        .add_item(OrderItemBuilder::new("Chair", dec!(1), dec!(100)).taxes(&[dec!(21)]).build())
        .build()
}

fn status(s: &str, minutes_ago: i64) -> SyncStatus {
    SyncStatus {
        status: s.into(),
        status_updated: Some(now() - chrono::Duration::minutes(minutes_ago)),
        status_error: None,
    }
}

// ---------------------------------------------------------------------------
// Generate
// ---------------------------------------------------------------------------

#[test]
fn generate_stores_invoice_and_status() {
    let cfg = config();
    let sequences = InMemorySequenceStore::new();
    let api = MockApi::default();
    let mut service = InvoiceService::new(&cfg, &api, MemoryStore::default(), &sequences)
        .with_clock(FixedClock(now()));

    let outcome = service.generate(&OrderRecord::Standard(order(10)), Trigger::Manual);
    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(outcome.invoice_id.as_deref(), Some("inv_1"));
    assert_eq!(outcome.invoice_number.as_deref(), Some("2024-0001"));

    let store = service.into_store();
    let stored = store.invoices.get(&10).unwrap();
    assert_eq!(stored.invoice_id, "inv_1");
    assert_eq!(stored.issued_at, now());
    let status = store.statuses.get(&10).unwrap();
    assert_eq!(status.status, "new");
    assert_eq!(status.status_updated, Some(now()));
    assert_eq!(store.notes_for(10), vec!["Invoice 2024-0001 created (id inv_1)"]);
    assert_eq!(api.created.borrow()[0].date, now().date_naive());
}

#[test]
fn bookkeeping_failures_after_create_still_report_success() {
    let cfg = config();
    let sequences = InMemorySequenceStore::new();
    let api = MockApi::default();
    let store = MemoryStore {
        notes_locked: true,
        statuses_locked: true,
        ..MemoryStore::default()
    };
    let mut service = InvoiceService::new(&cfg, &api, store, &sequences)
        .with_clock(FixedClock(now()));

    let outcome = service.generate(&OrderRecord::Standard(order(12)), Trigger::Manual);
    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(outcome.invoice_id.as_deref(), Some("inv_1"));
    assert_eq!(outcome.invoice_number.as_deref(), Some("2024-0001"));

    let store = service.into_store();
    assert_eq!(store.invoices[&12].invoice_id, "inv_1");
    assert!(store.statuses.is_empty());
    assert!(store.notes.is_empty());
}

#[test]
fn generate_refuses_duplicates_before_remote_call() {
    let cfg = config();
    let sequences = InMemorySequenceStore::new();
    let api = MockApi::default();
    let store = MemoryStore::default().with_invoice(10, "inv_old", None);
    let mut service = InvoiceService::new(&cfg, &api, store, &sequences);

    let outcome = service.generate(&OrderRecord::Standard(order(10)), Trigger::Manual);
    assert!(!outcome.success);
    assert!(outcome.message.contains("already has invoice N-10"), "{}", outcome.message);
    assert!(api.created.borrow().is_empty());
    assert_eq!(service.store().notes_for(10).len(), 1);
}

#[test]
fn generate_without_credentials_is_a_config_failure() {
    let cfg = BridgeConfig::default();
    let sequences = InMemorySequenceStore::new();
    let api = MockApi::default();
    let mut service = InvoiceService::new(&cfg, &api, MemoryStore::default(), &sequences);

    let outcome = service.generate(&OrderRecord::Standard(order(10)), Trigger::Automatic);
    assert!(!outcome.success);
    assert!(outcome.message.starts_with("configuration error"));
    assert!(api.created.borrow().is_empty());
    assert!(service.store().invoices.is_empty());
}

#[test]
fn remote_rejection_is_noted_not_raised() {
    let cfg = config();
    let sequences = InMemorySequenceStore::new();
    let api = MockApi {
        create_error: Some(RemoteErrorKind::PermissionDenied),
        ..MockApi::default()
    };
    let mut service = InvoiceService::new(&cfg, &api, MemoryStore::default(), &sequences);

    let outcome = service.generate(&OrderRecord::Standard(order(11)), Trigger::Automatic);
    assert!(!outcome.success);
    assert!(outcome.invoice_id.is_none());
    let notes = service.store().notes_for(11);
    assert_eq!(notes.len(), 1);
    assert!(notes[0].starts_with("Invoice generation failed: remote error (permission-denied)"));
    assert!(service.store().invoices.is_empty());
}

#[test]
fn refund_after_invoice_creates_rectificative() {
    let cfg = config();
    let sequences = InMemorySequenceStore::new();
    let api = MockApi::default();
    let mut service = InvoiceService::new(&cfg, &api, MemoryStore::default(), &sequences)
        .with_clock(FixedClock(now()));

    let mut parent = order(20);
    assert!(service
        .generate(&OrderRecord::Standard(parent.clone()), Trigger::Automatic)
        .success);
    parent.invoice = service.store().stored_invoice(20).unwrap();

    let refund = OrderRecord::Refund(
        RefundBuilder::new(21, parent)
            .add_item(OrderItemBuilder::new("Chair", dec!(-1), dec!(-100)).taxes(&[dec!(-21)]).build())
            .build(),
    );
    let outcome = service.generate(&refund, Trigger::Manual);
    assert!(outcome.success, "{}", outcome.message);

    let created = api.created.borrow();
    assert_eq!(created[1].amended_number.as_deref(), Some("2024-0001"));
    assert_eq!(created[1].lines[0].amount(), dec!(-100));
    assert_eq!(
        service.store().notes_for(21),
        vec!["Rectificative invoice 2024-0002 created (id inv_2)"]
    );
}

#[test]
fn refund_without_parent_invoice_never_reaches_remote() {
    let cfg = config();
    let sequences = InMemorySequenceStore::new();
    let api = MockApi::default();
    let mut service = InvoiceService::new(&cfg, &api, MemoryStore::default(), &sequences);

    let refund = OrderRecord::Refund(RefundBuilder::new(31, order(30)).build());
    let outcome = service.generate(&refund, Trigger::Manual);
    assert!(!outcome.success);
    assert!(outcome.message.starts_with("precondition failed"));
    assert!(api.created.borrow().is_empty());
}

// ---------------------------------------------------------------------------
// PDF download
// ---------------------------------------------------------------------------

#[test]
fn pdf_download_waits_for_rendering() {
    let cfg = config();
    let sequences = InMemorySequenceStore::new();
    let api = MockApi::default();
    api.pdf_responses.borrow_mut().extend([
        Err(RemoteErrorKind::NotFound),
        Err(RemoteErrorKind::TransientConnectionError),
        Ok(b"%PDF-1.7".to_vec()),
    ]);
    let slept = RefCell::new(Vec::new());
    let service = InvoiceService::new(&cfg, &api, MemoryStore::default(), &sequences)
        .with_sleeper(|d: Duration| slept.borrow_mut().push(d));

    let pdf = service.download_pdf("inv_1").unwrap();
    assert_eq!(pdf, b"%PDF-1.7");
    assert_eq!(api.pdf_calls.get(), 3);
    assert_eq!(*slept.borrow(), vec![Duration::from_secs(1), Duration::from_secs(2)]);
}

#[test]
fn pdf_download_stops_on_auth_failure() {
    let cfg = config();
    let sequences = InMemorySequenceStore::new();
    let api = MockApi::default();
    api.pdf_responses
        .borrow_mut()
        .push_back(Err(RemoteErrorKind::AuthFailure));
    let service = InvoiceService::new(&cfg, &api, MemoryStore::default(), &sequences)
        .with_sleeper(|_: Duration| {});

    let err = service.download_pdf("inv_1").unwrap_err();
    assert_eq!(err.remote_kind(), Some(RemoteErrorKind::AuthFailure));
    assert_eq!(api.pdf_calls.get(), 1);
}

#[test]
fn pdf_download_gives_up_after_max_attempts() {
    let mut cfg = config();
    cfg.retry = RetryPolicy::new(3, Duration::from_secs(1), Duration::from_secs(10));
    let sequences = InMemorySequenceStore::new();
    let api = MockApi::default();
    let service = InvoiceService::new(&cfg, &api, MemoryStore::default(), &sequences)
        .with_sleeper(|_: Duration| {});

    let err = service.download_pdf("inv_1").unwrap_err();
    assert_eq!(err.remote_kind(), Some(RemoteErrorKind::NotFound));
    assert_eq!(api.pdf_calls.get(), 3);
}

#[test]
fn pdf_for_record_without_invoice() {
    let cfg = config();
    let sequences = InMemorySequenceStore::new();
    let api = MockApi::default();
    let service = InvoiceService::new(&cfg, &api, MemoryStore::default(), &sequences);
    assert!(matches!(
        service.download_pdf_for(99),
        Err(BridgeError::Precondition(_))
    ));
    assert_eq!(api.pdf_calls.get(), 0);
}

// ---------------------------------------------------------------------------
// Status sync
// ---------------------------------------------------------------------------

#[test]
fn final_state_gating() {
    let settings = SyncSettings::default();
    let api = MockApi::default()
        .with_state("inv_fresh", "paid", None)
        .with_state("inv_stale", "paid", None);
    let mut store = MemoryStore::default()
        .with_invoice(1, "inv_fresh", Some(status("paid", 10)))
        .with_invoice(2, "inv_stale", Some(status("paid", 90)));
    let sync = StatusSync::new(&api, &settings).with_clock(FixedClock(now()));

    let candidates = sync.candidates(&store).unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].record_id, 2);

    let report = sync.sync_batch(&mut store).unwrap();
    assert_eq!(report, SyncReport { synced: 1, errors: 0 });
    assert_eq!(api.retrieve_calls.get(), 1);
    assert_eq!(store.statuses[&2].status_updated, Some(now()));
    assert_eq!(
        store.statuses[&1].status_updated,
        Some(now() - chrono::Duration::minutes(10))
    );
}

#[test]
fn sync_maps_state_and_error_message() {
    let settings = SyncSettings::default();
    let api = MockApi::default()
        .with_state("inv_a", "Error", Some("Invalid TIN for contact"))
        .with_state("inv_b", "ACCEPTED", Some("ignored"));
    let mut store = MemoryStore::default()
        .with_invoice(1, "inv_a", None)
        .with_invoice(
            2,
            "inv_b",
            Some(SyncStatus {
                status: "error".into(),
                status_updated: Some(now()),
                status_error: Some("old failure".into()),
            }),
        );
    let sync = StatusSync::new(&api, &settings).with_clock(FixedClock(now()));

    let report = sync.sync_batch(&mut store).unwrap();
    assert_eq!(report.synced, 2);
    assert_eq!(store.statuses[&1].status, "error");
    assert_eq!(
        store.statuses[&1].status_error.as_deref(),
        Some("Invalid TIN for contact")
    );
    assert_eq!(store.statuses[&2].status, "accepted");
    assert_eq!(store.statuses[&2].status_error, None);
}

#[test]
fn failures_are_counted_and_batch_continues() {
    let settings = SyncSettings::default();
    let api = MockApi::default()
        .with_failure("inv_1", RemoteErrorKind::NotFound)
        .with_failure("inv_2", RemoteErrorKind::AuthFailure)
        .with_state("inv_3", "sent", None)
        .with_failure("inv_4", RemoteErrorKind::GenericApiError);
    let mut store = MemoryStore::default()
        .with_invoice(1, "inv_1", None)
        .with_invoice(2, "inv_2", None)
        .with_invoice(3, "inv_3", None)
        .with_invoice(4, "inv_4", None);
    let sync = StatusSync::new(&api, &settings).with_clock(FixedClock(now()));

    let report = sync.sync_batch(&mut store).unwrap();
    assert_eq!(report, SyncReport { synced: 1, errors: 3 });
    assert_eq!(api.retrieve_calls.get(), 4);
    assert_eq!(store.statuses[&3].status, "sent");
    assert!(!store.statuses.contains_key(&1));
}

#[test]
fn batch_size_limits_a_run() {
    let settings = SyncSettings {
        batch_size: 3,
        ..SyncSettings::default()
    };
    let mut api = MockApi::default();
    let mut store = MemoryStore::default();
    for id in 1..=5 {
        let invoice_id = format!("inv_{id}");
        api = api.with_state(&invoice_id, "new", None);
        store = store.with_invoice(id, &invoice_id, None);
    }
    let sync = StatusSync::new(&api, &settings).with_clock(FixedClock(now()));

    let report = sync.sync_batch(&mut store).unwrap();
    assert_eq!(report.synced, 3);
    assert_eq!(store.statuses.len(), 3);
}

#[test]
fn spent_time_budget_processes_nothing() {
    let settings = SyncSettings {
        time_budget: Duration::ZERO,
        ..SyncSettings::default()
    };
    let api = MockApi::default().with_state("inv_1", "new", None);
    let mut store = MemoryStore::default().with_invoice(1, "inv_1", None);
    let sync = StatusSync::new(&api, &settings).with_clock(FixedClock(now()));

    let report = sync.sync_batch(&mut store).unwrap();
    assert_eq!(report, SyncReport::default());
    assert_eq!(api.retrieve_calls.get(), 0);
}

#[test]
fn time_budget_cuts_a_batch_short() {
    let settings = SyncSettings {
        time_budget: Duration::from_millis(150),
        ..SyncSettings::default()
    };
    let mut api = MockApi {
        retrieve_delay: Duration::from_millis(100),
        ..MockApi::default()
    };
    let mut store = MemoryStore::default();
    for id in 1..=5 {
        let invoice_id = format!("inv_{id}");
        api = api.with_state(&invoice_id, "paid", None);
        store = store.with_invoice(id, &invoice_id, None);
    }
    let sync = StatusSync::new(&api, &settings).with_clock(FixedClock(now()));

    let report = sync.sync_batch(&mut store).unwrap();
    assert!(report.synced >= 1 && report.synced < 5, "{report:?}");
    assert_eq!(report.errors, 0);
    assert_eq!(api.retrieve_calls.get(), report.synced);
    assert_eq!(store.statuses.len(), report.synced);
    // Skipped records are still due on the next run.
    assert_eq!(sync.candidates(&store).unwrap().len(), 5 - report.synced);
}

#[test]
fn manual_recheck_ignores_final_state_gate() {
    let settings = SyncSettings::default();
    let api = MockApi::default().with_state("inv_1", "cancelled", None);
    let mut store = MemoryStore::default().with_invoice(1, "inv_1", Some(status("paid", 1)));
    let sync = StatusSync::new(&api, &settings).with_clock(FixedClock(now()));

    let status = sync.recheck(&mut store, 1).unwrap();
    assert_eq!(status.status, "cancelled");
    assert_eq!(store.statuses[&1].status, "cancelled");

    assert!(matches!(
        sync.recheck(&mut store, 2),
        Err(BridgeError::Precondition(_))
    ));
}
