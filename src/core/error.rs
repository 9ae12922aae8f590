use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while preparing, submitting or synchronizing invoices.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BridgeError {
    /// Missing or invalid configuration (credentials, account, identifiers).
    #[error("configuration error: {0}")]
    Config(String),

    /// The record is not in a state that allows the operation
    /// (duplicate invoice, refund without a parent invoice, ...).
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The remote invoicing API returned an error.
    #[error("remote error ({kind}): {message}")]
    Remote {
        kind: RemoteErrorKind,
        message: String,
    },

    /// The payload or a response could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl BridgeError {
    /// Shorthand for a remote error of the given kind.
    pub fn remote(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self::Remote {
            kind,
            message: message.into(),
        }
    }

    /// The remote kind tag, if this is a remote error.
    pub fn remote_kind(&self) -> Option<RemoteErrorKind> {
        match self {
            Self::Remote { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Kind tag carried by every remote API error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemoteErrorKind {
    /// The resource does not exist (yet).
    NotFound,
    /// The API key was rejected.
    AuthFailure,
    /// The key is valid but lacks access to the resource.
    PermissionDenied,
    /// Any other error response (validation, server error, ...).
    GenericApiError,
    /// Connection refused, reset or timed out.
    TransientConnectionError,
}

impl RemoteErrorKind {
    /// Stable kebab-case code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "not-found",
            Self::AuthFailure => "auth-failure",
            Self::PermissionDenied => "permission-denied",
            Self::GenericApiError => "generic-api-error",
            Self::TransientConnectionError => "transient-connection-error",
        }
    }

    /// Parse from the kebab-case code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "not-found" => Some(Self::NotFound),
            "auth-failure" => Some(Self::AuthFailure),
            "permission-denied" => Some(Self::PermissionDenied),
            "generic-api-error" => Some(Self::GenericApiError),
            "transient-connection-error" => Some(Self::TransientConnectionError),
            _ => None,
        }
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
