//! Invoice type and sign policy for amendments.

use rust_decimal::Decimal;

use crate::core::{BridgeConfig, InvoiceType, OrderItem, OrderRecord};

/// `StandardInvoice` for customers with a tax identifier (own, or the
/// parent's for refunds), `SimplifiedInvoice` otherwise.
pub fn invoice_type(record: &OrderRecord) -> InvoiceType {
    if record.tax_id().is_some() {
        InvoiceType::StandardInvoice
    } else {
        InvoiceType::SimplifiedInvoice
    }
}

/// How the amounts of a document are signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountPolicy {
    /// A regular invoice; amounts as recorded.
    Invoice,
    /// Correction with negative amounts referencing the original invoice.
    Rectificative,
    /// Correction with positive amounts and an explicit credit-note flag.
    CreditNote,
}

impl AmountPolicy {
    /// Policy for `record`, based on the billing country.
    pub fn for_record(record: &OrderRecord, config: &BridgeConfig) -> Self {
        if !record.is_refund() {
            Self::Invoice
        } else if config.uses_rectificative_invoices(&record.billing().country) {
            Self::Rectificative
        } else {
            Self::CreditNote
        }
    }

    pub fn is_credit_note(&self) -> bool {
        matches!(self, Self::CreditNote)
    }

    /// Apply the policy to a quantity/price pair.
    pub fn apply(&self, quantity: Decimal, price: Decimal) -> (Decimal, Decimal) {
        match self {
            Self::Invoice | Self::Rectificative => (quantity, price),
            Self::CreditNote => (quantity.abs(), price.abs()),
        }
    }
}

/// Lines and shipping an invoice is built from.
#[derive(Debug, Clone)]
pub struct LineSource {
    pub items: Vec<OrderItem>,
    pub shipping_total: Decimal,
    pub shipping_tax: Decimal,
    /// Whether the lines were taken from the parent order.
    pub from_parent: bool,
}

impl LineSource {
    /// The record's own lines. A refund without lines falls back to the
    /// parent's, negated for rectificatives so they read as refunded.
    pub fn for_record(record: &OrderRecord, policy: AmountPolicy) -> Self {
        match (record, record.parent()) {
            (OrderRecord::Refund(refund), Some(parent)) if refund.items.is_empty() => {
                let negate = policy == AmountPolicy::Rectificative;
                let items = parent
                    .items
                    .iter()
                    .map(|item| if negate { item.negated() } else { item.clone() })
                    .collect();
                let sign = if negate { -Decimal::ONE } else { Decimal::ONE };
                Self {
                    items,
                    shipping_total: parent.shipping_total * sign,
                    shipping_tax: parent.shipping_tax * sign,
                    from_parent: true,
                }
            }
            _ => {
                let (shipping_total, shipping_tax) = record.shipping();
                Self {
                    items: record.items().to_vec(),
                    shipping_total,
                    shipping_tax,
                    from_parent: false,
                }
            }
        }
    }
}
