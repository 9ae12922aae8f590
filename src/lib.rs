//! # invoicebridge
//!
//! Turns e-commerce orders and refunds into electronic invoices for the
//! B2Brouter platform: PEPPOL tax categories, standard vs. simplified
//! invoices, rectificative invoices vs. credit notes, invoice numbering,
//! PDF download with backoff, and remote status synchronization.
//!
//! All monetary values use [`rust_decimal::Decimal`]. Floats appear only at the JSON boundary.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use invoicebridge::core::*;
//! use invoicebridge::invoice::InvoiceAssembler;
//! use rust_decimal_macros::dec;
//!
//! let config = BridgeConfig::default().with_default_country("ES");
//! let sequences = InMemorySequenceStore::new();
//!
//! let order = OrderBuilder::new(1042, "1042")
//!     .billing(BillingBuilder::new("Jean", "Dupont", "FR").email("jean@example.fr").build())
//!     .tax_id("FR123456789")
//!     .add_item(OrderItemBuilder::new("Lamp", dec!(2), dec!(100)).build())
//!     .shipping(dec!(10), dec!(0))
//!     .build();
//!
//! let payload = InvoiceAssembler::new(&config, &sequences)
//!     .issued_on(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
//!     .prepare_invoice_data(&OrderRecord::Standard(order))
//!     .unwrap();
//!
//! assert_eq!(payload.invoice_type, InvoiceType::StandardInvoice);
//! assert!(payload.lines.iter().all(|l| l.taxes[0].category == TaxCategory::ReverseCharge));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Order model, tax classification, payload assembly, retry, status sync |
//! | `client` | Blocking HTTP client for the B2Brouter API |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "core")]
pub mod tax;

#[cfg(feature = "core")]
pub mod invoice;

#[cfg(feature = "core")]
pub mod sync;

#[cfg(feature = "client")]
pub mod client;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
