//! Bridge configuration.
//!
//! Everything the core reads from the host's settings store, passed in
//! explicitly. Supports loading from environment variables with the
//! `INVOICEBRIDGE_` prefix.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::countries::{base_country, same_country};
use super::error::BridgeError;
use super::numbering::NumberingMode;
use super::retry::RetryPolicy;

/// Scheme code attached to the customer's tax identifier.
pub const DEFAULT_TIN_SCHEME: &str = "9920";

/// Statuses after which the remote invoice is not expected to change.
pub const FINAL_STATES: &[&str] = &["sent", "accepted", "registered", "paid", "cancelled", "closed"];

/// Invoicing API environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiEnvironment {
    #[default]
    Staging,
    Production,
}

impl FromStr for ApiEnvironment {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "staging" | "test" | "sandbox" => Ok(Self::Staging),
            "production" | "prod" | "live" => Ok(Self::Production),
            other => Err(BridgeError::Config(format!("unknown API environment: {other}"))),
        }
    }
}

impl ApiEnvironment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Staging => "https://api-staging.b2brouter.net",
            Self::Production => "https://api.b2brouter.net",
        }
    }
}

/// Limits of one status synchronization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Maximum records processed per run.
    pub batch_size: usize,
    /// Wall-clock budget; checked before each record.
    pub time_budget: Duration,
    /// Age after which a record in a final state is checked again.
    pub recheck_after: Duration,
    /// Lower-case statuses considered final.
    pub final_states: Vec<String>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            batch_size: 50,
            time_budget: Duration::from_secs(50),
            recheck_after: Duration::from_secs(3600),
            final_states: FINAL_STATES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SyncSettings {
    pub fn is_final(&self, status: &str) -> bool {
        let status = status.trim().to_lowercase();
        self.final_states.iter().any(|s| *s == status)
    }
}

/// Merchant-level settings consumed by the assembler, classifier,
/// client and sync job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Invoicing API key.
    pub api_key: String,
    /// Issuing account identifier on the invoicing platform.
    pub account_id: String,
    pub environment: ApiEnvironment,
    /// Store default country, `"CC"` or `"CC:region"`.
    pub default_country: String,
    /// Store locale, e.g. `"es_ES"`.
    pub locale: String,
    pub invoice_series: Option<String>,
    /// Falls back to `invoice_series` when unset.
    pub credit_note_series: Option<String>,
    pub numbering: NumberingMode,
    /// Countries whose refunds are negative-amount rectificative invoices.
    pub rectificative_countries: Vec<String>,
    pub tin_scheme: String,
    /// Days between invoice date and due date.
    pub due_days: u32,
    /// Ask the platform to deliver the invoice right after import.
    pub send_after_import: bool,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Policy for PDF downloads.
    pub retry: RetryPolicy,
    pub sync: SyncSettings,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            account_id: String::new(),
            environment: ApiEnvironment::default(),
            default_country: "ES".to_string(),
            locale: "es_ES".to_string(),
            invoice_series: None,
            credit_note_series: None,
            numbering: NumberingMode::default(),
            rectificative_countries: vec!["ES".to_string()],
            tin_scheme: DEFAULT_TIN_SCHEME.to_string(),
            due_days: 30,
            send_after_import: false,
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            sync: SyncSettings::default(),
        }
    }
}

impl BridgeConfig {
    /// Load from `INVOICEBRIDGE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup; unset or unparsable keys keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("INVOICEBRIDGE_{name}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let parse_u64 = |name: &str| get(name).and_then(|v| v.parse::<u64>().ok());
        let defaults = Self::default();

        let numbering = get("NUMBERING")
            .and_then(|mode| NumberingMode::from_name(&mode, get("NUMBERING_PATTERN").as_deref()))
            .unwrap_or(defaults.numbering);

        let rectificative_countries = get("RECTIFICATIVE_COUNTRIES")
            .map(|list| {
                list.split(',')
                    .map(|c| c.trim().to_uppercase())
                    .filter(|c| !c.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.rectificative_countries);

        let retry = RetryPolicy {
            max_attempts: get("RETRY_MAX_ATTEMPTS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.retry.max_attempts),
            initial_delay: parse_u64("RETRY_INITIAL_DELAY_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.retry.initial_delay),
            max_delay: parse_u64("RETRY_MAX_DELAY_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.retry.max_delay),
            retryable: defaults.retry.retryable,
        };

        Self {
            api_key: get("API_KEY").unwrap_or_default(),
            account_id: get("ACCOUNT_ID").unwrap_or_default(),
            environment: get("ENVIRONMENT")
                .and_then(|e| e.parse::<ApiEnvironment>().ok())
                .unwrap_or(defaults.environment),
            default_country: get("DEFAULT_COUNTRY").unwrap_or(defaults.default_country),
            locale: get("LOCALE").unwrap_or(defaults.locale),
            invoice_series: get("INVOICE_SERIES"),
            credit_note_series: get("CREDIT_NOTE_SERIES"),
            numbering,
            rectificative_countries,
            tin_scheme: get("TIN_SCHEME").unwrap_or(defaults.tin_scheme),
            due_days: get("DUE_DAYS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.due_days),
            send_after_import: get("SEND_AFTER_IMPORT")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(defaults.send_after_import),
            request_timeout: parse_u64("TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            retry,
            sync: defaults.sync,
        }
    }

    /// Set the credentials used by the client.
    pub fn with_credentials(
        mut self,
        api_key: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        self.api_key = api_key.into();
        self.account_id = account_id.into();
        self
    }

    pub fn with_default_country(mut self, country: impl Into<String>) -> Self {
        self.default_country = country.into();
        self
    }

    pub fn with_numbering(mut self, mode: NumberingMode) -> Self {
        self.numbering = mode;
        self
    }

    pub fn with_series(
        mut self,
        invoice_series: Option<&str>,
        credit_note_series: Option<&str>,
    ) -> Self {
        self.invoice_series = invoice_series.map(str::to_string);
        self.credit_note_series = credit_note_series.map(str::to_string);
        self
    }

    pub fn with_rectificative_countries(mut self, countries: &[&str]) -> Self {
        self.rectificative_countries = countries.iter().map(|c| c.to_uppercase()).collect();
        self
    }

    /// Merchant country without any region suffix, upper-cased.
    pub fn merchant_country(&self) -> String {
        base_country(&self.default_country)
    }

    /// First two characters of the locale, lower-cased.
    pub fn language(&self) -> String {
        self.locale.chars().take(2).collect::<String>().to_lowercase()
    }

    /// Whether refunds billed to `country` are rectificative invoices.
    pub fn uses_rectificative_invoices(&self, country: &str) -> bool {
        self.rectificative_countries
            .iter()
            .any(|c| same_country(c, country))
    }

    /// Series for regular invoices or credit notes.
    pub fn series_code(&self, credit_note: bool) -> Option<String> {
        let series = if credit_note {
            self.credit_note_series
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .or(self.invoice_series.as_deref())
        } else {
            self.invoice_series.as_deref()
        };
        series
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Check the credentials needed for remote calls and the retry policy.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.api_key.trim().is_empty() {
            return Err(BridgeError::Config("API key is not configured".into()));
        }
        if self.account_id.trim().is_empty() {
            return Err(BridgeError::Config("account id is not configured".into()));
        }
        self.retry.validate()
    }
}
