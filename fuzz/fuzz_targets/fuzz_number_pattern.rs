#![no_main]

use chrono::NaiveDate;
use invoicebridge::core::{NumberContext, render_number_pattern};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let Some(date) = NaiveDate::from_ymd_opt(2024, 6, 15) else {
            return;
        };
        let ctx = NumberContext {
            order_id: u64::MAX,
            order_number: s,
            date,
        };
        // Operator-supplied templates must never panic.
        let _ = render_number_pattern(s, &ctx);
    }
});
