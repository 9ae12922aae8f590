#![no_main]

use chrono::{TimeZone, Utc};
use invoicebridge::core::{SyncSettings, SyncStatus};
use invoicebridge::sync::needs_sync;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let (state, message) = s.split_once('\n').unwrap_or((s, ""));
        let Some(now) = Utc.timestamp_opt(1_718_452_800, 0).single() else {
            return;
        };
        let status = SyncStatus::fetched(state, Some(message), now);
        if status.status != "error" {
            assert!(status.status_error.is_none());
        }
        let _ = needs_sync(Some(&status), now, &SyncSettings::default());
    }
});
