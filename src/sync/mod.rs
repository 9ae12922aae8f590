//! Remote status synchronization.
//!
//! Invoices move through states on the platform (`new`, `sent`,
//! `accepted`, `paid`, `error`, ...) after creation. A recurring job pulls
//! those states into the order store, skipping records that reached a
//! final state recently.

mod job;

pub use job::{StatusSync, SyncReport, needs_sync};
