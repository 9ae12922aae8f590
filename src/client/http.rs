use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::core::{
    BridgeConfig, BridgeError, CreatedInvoice, InvoiceApi, InvoicePayload, RemoteErrorKind,
    RemoteInvoice,
};

pub const API_KEY_HEADER: &str = "X-B2B-API-Key";
pub const API_VERSION_HEADER: &str = "X-B2B-API-Version";
pub const API_VERSION: &str = "2025-10-13";

/// Longest error body excerpt kept in error messages.
const MAX_ERROR_BODY: usize = 300;

/// Invoicing API client. Every call blocks for at most the configured
/// request timeout.
#[derive(Debug, Clone)]
pub struct B2BrouterClient {
    http: Client,
    base_url: String,
    api_key: String,
    send_after_import: bool,
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    invoice: &'a InvoicePayload,
    send_after_import: bool,
}

#[derive(Debug, Deserialize)]
struct InvoiceEnvelope {
    invoice: ApiInvoice,
}

#[derive(Debug, Deserialize)]
struct ApiInvoice {
    id: Value,
    number: Option<String>,
    state: Option<String>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
    errors: Option<Value>,
}

impl B2BrouterClient {
    /// Client for the configured environment.
    ///
    /// # Errors
    ///
    /// `Config` when the API key or account is missing.
    pub fn new(config: &BridgeConfig) -> Result<Self, BridgeError> {
        config.validate()?;
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BridgeError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.environment.base_url().to_string(),
            api_key: config.api_key.clone(),
            send_after_import: config.send_after_import,
        })
    }

    /// Point the client at another host, e.g. a local mock.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, builder: RequestBuilder) -> Result<Response, BridgeError> {
        let resp = builder
            .header(API_KEY_HEADER, &self.api_key)
            .header(API_VERSION_HEADER, API_VERSION)
            .send()
            .map_err(transport_error)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().unwrap_or_default();
        Err(error_for_status(status.as_u16(), &body))
    }

    fn invoice(&self, resp: Response) -> Result<ApiInvoice, BridgeError> {
        let body = resp.text().map_err(transport_error)?;
        let envelope: InvoiceEnvelope =
            serde_json::from_str(&body).map_err(|e| BridgeError::Serialization(e.to_string()))?;
        Ok(envelope.invoice)
    }
}

impl InvoiceApi for B2BrouterClient {
    fn create(
        &self,
        account_id: &str,
        payload: &InvoicePayload,
    ) -> Result<CreatedInvoice, BridgeError> {
        let url = format!("{}/accounts/{account_id}/invoices.json", self.base_url);
        let body = CreateRequest {
            invoice: payload,
            send_after_import: self.send_after_import,
        };
        debug!(%url, lines = payload.lines.len(), "creating invoice");
        let resp = self.request(self.http.post(&url).json(&body))?;
        let invoice = self.invoice(resp)?;
        Ok(CreatedInvoice {
            id: id_to_string(&invoice.id)?,
            number: invoice.number.filter(|n| !n.is_empty()),
            state: invoice.state.unwrap_or_default(),
        })
    }

    fn retrieve(&self, invoice_id: &str) -> Result<RemoteInvoice, BridgeError> {
        let url = format!("{}/invoices/{invoice_id}.json", self.base_url);
        let resp = self.request(self.http.get(&url))?;
        let invoice = self.invoice(resp)?;
        Ok(RemoteInvoice {
            id: id_to_string(&invoice.id)?,
            state: invoice.state.unwrap_or_default(),
            error_message: invoice.error_message,
        })
    }

    fn download_pdf(&self, invoice_id: &str) -> Result<Vec<u8>, BridgeError> {
        let url = format!("{}/invoices/{invoice_id}/as/pdf.invoice", self.base_url);
        let resp = self.request(self.http.get(&url))?;
        let bytes = resp.bytes().map_err(transport_error)?;
        if bytes.is_empty() {
            // The platform answers 200 with no body while rendering.
            return Err(BridgeError::remote(
                RemoteErrorKind::NotFound,
                format!("PDF of invoice {invoice_id} is not ready"),
            ));
        }
        Ok(bytes.to_vec())
    }
}

/// Map an unsuccessful HTTP status to a kind-tagged error.
pub fn error_for_status(status: u16, body: &str) -> BridgeError {
    let kind = match status {
        404 => RemoteErrorKind::NotFound,
        401 => RemoteErrorKind::AuthFailure,
        403 => RemoteErrorKind::PermissionDenied,
        _ => RemoteErrorKind::GenericApiError,
    };
    BridgeError::remote(kind, format!("HTTP {status}: {}", error_message(body)))
}

fn error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(msg) = parsed.message.or(parsed.error) {
            return msg;
        }
        if let Some(errors) = parsed.errors {
            return errors.to_string();
        }
    }
    body.chars().take(MAX_ERROR_BODY).collect()
}

fn transport_error(err: reqwest::Error) -> BridgeError {
    let kind = if err.is_timeout() || err.is_connect() {
        RemoteErrorKind::TransientConnectionError
    } else {
        RemoteErrorKind::GenericApiError
    };
    BridgeError::remote(kind, err.to_string())
}

fn id_to_string(id: &Value) -> Result<String, BridgeError> {
    match id {
        Value::String(s) if !s.is_empty() => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(BridgeError::Serialization(format!(
            "unexpected invoice id {other}"
        ))),
    }
}
