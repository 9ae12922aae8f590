//! Blocking HTTP client for the B2Brouter invoicing API.
//!
//! # Example
//!
//! ```ignore
//! use invoicebridge::client::B2BrouterClient;
//! use invoicebridge::core::*;
//!
//! let config = BridgeConfig::from_env();
//! let client = B2BrouterClient::new(&config)?;
//! let remote = client.retrieve("123456")?;
//! println!("{}", remote.state);
//! ```

mod http;

pub use http::{API_KEY_HEADER, API_VERSION, API_VERSION_HEADER, B2BrouterClient, error_for_status};
