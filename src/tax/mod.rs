//! Tax classification and amendment policy.
//!
//! Decides the PEPPOL tax category of every invoice line, whether the
//! customer gets a standard or simplified invoice, and how refunds are
//! signed (rectificative invoice vs. credit note).
//!
//! # Example
//!
//! ```
//! use invoicebridge::core::*;
//! use invoicebridge::tax::*;
//! use rust_decimal_macros::dec;
//!
//! let config = BridgeConfig::default().with_default_country("ES:M");
//! let order = OrderRecord::Standard(
//!     OrderBuilder::new(1, "1")
//!         .billing(BillingBuilder::new("Jean", "Dupont", "FR").build())
//!         .tax_id("FR123456789")
//!         .build(),
//! );
//! let item = OrderItemBuilder::new("Lamp", dec!(1), dec!(40)).build();
//!
//! let result = TaxClassifier::new(&config).classify(&item, &order, item_tax_rate(&item));
//! assert_eq!(result.category, TaxCategory::ReverseCharge);
//! assert_eq!(invoice_type(&order), InvoiceType::StandardInvoice);
//! ```

mod classify;
mod policy;
mod rates;

pub use classify::TaxClassifier;
pub use policy::{AmountPolicy, LineSource, invoice_type};
pub use rates::{item_tax_rate, shipping_tax_rate};
