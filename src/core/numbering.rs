use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::BridgeError;

/// How invoice numbers are chosen.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "mode", content = "pattern")]
pub enum NumberingMode {
    /// Leave the number out; the remote side assigns one.
    #[default]
    Automatic,
    /// Reuse the originating order's number (the parent's for refunds).
    SourceOrderNumber,
    /// Monotonic counter per series code, starting at 1.
    Sequential,
    /// Template with `{order_id}`, `{order_number}`, `{year}`, `{month}`, `{day}`.
    Custom(String),
}

impl NumberingMode {
    /// Parse a mode name; `custom` takes the pattern separately.
    pub fn from_name(name: &str, pattern: Option<&str>) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "automatic" | "auto" => Some(Self::Automatic),
            "source-order-number" | "woocommerce" | "order" => Some(Self::SourceOrderNumber),
            "sequential" => Some(Self::Sequential),
            "custom" => Some(Self::Custom(pattern.unwrap_or_default().to_string())),
            _ => None,
        }
    }
}

/// Counter storage for sequential numbering, keyed by series code.
///
/// Implementations must hand out each value once per series; the first
/// call for an unseen series returns 1.
pub trait SequenceStore {
    fn increment_and_get(&self, series_code: &str) -> Result<u64, BridgeError>;
}

/// Process-local [`SequenceStore`].
#[derive(Debug, Default)]
pub struct InMemorySequenceStore {
    counters: Mutex<HashMap<String, u64>>,
}

impl InMemorySequenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue existing series, e.g. after importing numbers issued elsewhere.
    pub fn with_counters<I, K>(counters: I) -> Self
    where
        I: IntoIterator<Item = (K, u64)>,
        K: Into<String>,
    {
        Self {
            counters: Mutex::new(counters.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    /// Last value handed out for `series_code` (0 if none).
    ///
    /// Reads through a poisoned lock; a counter is never left half-updated.
    pub fn current(&self, series_code: &str) -> u64 {
        let counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        counters.get(series_code).copied().unwrap_or(0)
    }
}

impl SequenceStore for InMemorySequenceStore {
    fn increment_and_get(&self, series_code: &str) -> Result<u64, BridgeError> {
        let mut counters = self
            .counters
            .lock()
            .map_err(|_| BridgeError::Config("sequence store lock poisoned".into()))?;
        let next = counters.entry(series_code.to_string()).or_insert(0);
        *next += 1;
        Ok(*next)
    }
}

/// Values substituted into a custom numbering template.
#[derive(Debug, Clone)]
pub struct NumberContext<'a> {
    pub order_id: u64,
    pub order_number: &'a str,
    pub date: NaiveDate,
}

/// Expand a custom numbering template. Unknown placeholders are kept verbatim.
pub fn render_number_pattern(pattern: &str, ctx: &NumberContext<'_>) -> String {
    pattern
        .replace("{order_id}", &ctx.order_id.to_string())
        .replace("{order_number}", ctx.order_number)
        .replace("{year}", &format!("{:04}", ctx.date.year()))
        .replace("{month}", &format!("{:02}", ctx.date.month()))
        .replace("{day}", &format!("{:02}", ctx.date.day()))
}
