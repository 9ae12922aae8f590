use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An order or a refund of one. This is the input to invoice generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OrderRecord {
    /// A completed purchase.
    Standard(Order),
    /// A refund against a previously invoiced order.
    Refund(Refund),
}

/// A completed purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Store-internal identifier.
    pub id: u64,
    /// Customer-facing order number (may differ from the id).
    pub number: String,
    /// Billing identity and address.
    pub billing: Billing,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Purchased lines, in display order.
    pub items: Vec<OrderItem>,
    /// Shipping amount without tax.
    pub shipping_total: Decimal,
    /// Tax charged on shipping.
    pub shipping_tax: Decimal,
    /// Customer TIN / VAT identifier.
    pub tax_id: Option<String>,
    /// Invoice already created for this order, if any.
    pub invoice: Option<StoredInvoice>,
}

/// A refund of an [`Order`]. Amounts are negative as recorded by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    /// Store-internal identifier of the refund.
    pub id: u64,
    /// The refunded order.
    pub parent: Order,
    /// Free-text reason entered by the merchant.
    pub reason: Option<String>,
    /// Refunded lines. Empty for amount-only refunds.
    pub items: Vec<OrderItem>,
    /// Refunded shipping amount (negative).
    pub shipping_total: Decimal,
    /// Refunded shipping tax (negative).
    pub shipping_tax: Decimal,
    /// TIN / VAT identifier recorded on the refund itself.
    pub tax_id: Option<String>,
    /// ISO 4217 currency code.
    pub currency: String,
}

/// Billing identity of an order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Billing {
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub email: String,
    pub address_1: String,
    pub address_2: String,
    pub city: String,
    pub postcode: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
}

impl Billing {
    /// `first last`, or the company name when both are empty.
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.company.trim().to_string()
        } else {
            name.to_string()
        }
    }

    /// Address line 1 with line 2 appended when present.
    pub fn street(&self) -> String {
        let line_2 = self.address_2.trim();
        if line_2.is_empty() {
            self.address_1.clone()
        } else {
            format!("{} {}", self.address_1, line_2)
        }
    }
}

/// A line of an order or refund.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Line description shown on the invoice.
    pub name: String,
    /// Quantity; negative on refunds.
    pub quantity: Decimal,
    /// Line amount before discounts, without tax.
    pub subtotal: Decimal,
    /// Line amount after discounts, without tax.
    pub total: Decimal,
    /// Individual tax amounts applied to the line.
    pub taxes: Vec<Decimal>,
    /// The product behind the line, when it still exists.
    pub product: Option<Product>,
}

impl OrderItem {
    /// Sum of all tax amounts on the line.
    pub fn tax_total(&self) -> Decimal {
        self.taxes.iter().copied().sum()
    }

    /// The same line with quantity and amounts negated.
    pub fn negated(&self) -> Self {
        Self {
            quantity: -self.quantity,
            subtotal: -self.subtotal,
            total: -self.total,
            taxes: self.taxes.iter().map(|t| -*t).collect(),
            ..self.clone()
        }
    }

    /// The same line with every amount made non-negative.
    pub fn magnitude(&self) -> Self {
        Self {
            quantity: self.quantity.abs(),
            subtotal: self.subtotal.abs(),
            total: self.total.abs(),
            taxes: self.taxes.iter().map(|t| t.abs()).collect(),
            ..self.clone()
        }
    }
}

/// Tax-relevant attributes of a catalogue product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub tax_status: TaxStatus,
    /// Tax class slug; empty for the standard class.
    pub tax_class: String,
}

impl Product {
    /// Tax class slug of products taxed at a zero rate.
    pub const ZERO_RATE_CLASS: &'static str = "zero-rate";

    pub fn is_zero_rate(&self) -> bool {
        self.tax_class == Self::ZERO_RATE_CLASS
    }
}

/// Product tax status as configured in the store catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxStatus {
    /// Product and shipping are taxable.
    Taxable,
    /// Only the shipping cost is taxable.
    Shipping,
    /// Not subject to tax.
    None,
}

/// Remote invoice recorded against an order after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredInvoice {
    /// Remote invoice identifier.
    pub invoice_id: String,
    /// Invoice number as assigned by (or sent to) the remote side.
    pub number: Option<String>,
    /// When the invoice was created.
    pub issued_at: DateTime<Utc>,
}

/// Locally cached remote status of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    /// Lower-cased remote state (`"new"`, `"sent"`, `"error"`, ...).
    pub status: String,
    /// When `status` was last fetched.
    pub status_updated: Option<DateTime<Utc>>,
    /// Remote error message, only kept while `status == "error"`.
    pub status_error: Option<String>,
}

impl SyncStatus {
    /// A status fetched at `now`. The error message is kept only for `error`.
    pub fn fetched(state: &str, error_message: Option<&str>, now: DateTime<Utc>) -> Self {
        let status = state.trim().to_lowercase();
        let status_error = match error_message {
            Some(msg) if status == "error" && !msg.trim().is_empty() => Some(msg.to_string()),
            _ => None,
        };
        Self {
            status,
            status_updated: Some(now),
            status_error,
        }
    }
}

/// PEPPOL / UNTDID 5305 tax category codes used on invoice lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxCategory {
    /// S: Standard rate.
    #[serde(rename = "S")]
    StandardRate,
    /// E: Exempt from tax.
    #[serde(rename = "E")]
    Exempt,
    /// Z: Zero rated.
    #[serde(rename = "Z")]
    ZeroRated,
    /// NS: Not subject to tax.
    #[serde(rename = "NS")]
    NotSubject,
    /// AE: Reverse charge, the buyer remits the tax.
    #[serde(rename = "AE")]
    ReverseCharge,
}

impl TaxCategory {
    pub fn code(&self) -> &'static str {
        match self {
            Self::StandardRate => "S",
            Self::Exempt => "E",
            Self::ZeroRated => "Z",
            Self::NotSubject => "NS",
            Self::ReverseCharge => "AE",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "S" => Some(Self::StandardRate),
            "E" => Some(Self::Exempt),
            "Z" => Some(Self::ZeroRated),
            "NS" => Some(Self::NotSubject),
            "AE" => Some(Self::ReverseCharge),
            _ => None,
        }
    }
}

/// Outcome of classifying one line: category, localized name and rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxCategoryResult {
    pub category: TaxCategory,
    pub name: String,
    /// Always non-negative.
    pub percent: Decimal,
}

impl OrderRecord {
    /// Store identifier of the order or refund.
    pub fn id(&self) -> u64 {
        match self {
            Self::Standard(order) => order.id,
            Self::Refund(refund) => refund.id,
        }
    }

    /// Customer-facing number. Refunds have none and use their id.
    pub fn number(&self) -> String {
        match self {
            Self::Standard(order) => order.number.clone(),
            Self::Refund(refund) => refund.id.to_string(),
        }
    }

    pub fn is_refund(&self) -> bool {
        matches!(self, Self::Refund(_))
    }

    /// The refunded order, for refunds.
    pub fn parent(&self) -> Option<&Order> {
        match self {
            Self::Standard(_) => None,
            Self::Refund(refund) => Some(&refund.parent),
        }
    }

    /// The order that carries billing data: the parent for refunds.
    pub fn billing_order(&self) -> &Order {
        match self {
            Self::Standard(order) => order,
            Self::Refund(refund) => &refund.parent,
        }
    }

    pub fn billing(&self) -> &Billing {
        &self.billing_order().billing
    }

    /// Non-empty tax identifier of the record, inherited from the parent
    /// when a refund carries none.
    pub fn tax_id(&self) -> Option<&str> {
        let own = match self {
            Self::Standard(order) => order.tax_id.as_deref(),
            Self::Refund(refund) => refund.tax_id.as_deref(),
        };
        non_empty(own).or_else(|| self.parent().and_then(|p| non_empty(p.tax_id.as_deref())))
    }

    pub fn currency(&self) -> &str {
        match self {
            Self::Standard(order) => &order.currency,
            Self::Refund(refund) => &refund.currency,
        }
    }

    /// Own line items.
    pub fn items(&self) -> &[OrderItem] {
        match self {
            Self::Standard(order) => &order.items,
            Self::Refund(refund) => &refund.items,
        }
    }

    /// Shipping total and shipping tax of the record itself.
    pub fn shipping(&self) -> (Decimal, Decimal) {
        match self {
            Self::Standard(order) => (order.shipping_total, order.shipping_tax),
            Self::Refund(refund) => (refund.shipping_total, refund.shipping_tax),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
