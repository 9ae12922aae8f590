use chrono::{Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::core::{
    BridgeConfig, BridgeError, InvoiceContact, InvoiceLine, InvoicePayload, NumberContext,
    NumberingMode, OrderItem, OrderRecord, SequenceStore, StoredInvoice, render_number_pattern,
};
use crate::tax::{
    AmountPolicy, LineSource, TaxClassifier, invoice_type, item_tax_rate, shipping_tax_rate,
};

/// Description of the shipping line.
pub const SHIPPING_DESCRIPTION: &str = "Shipping";

/// Turns an order or refund into an invoice submission payload.
///
/// Pure data transform: the only side effect is drawing a number from the
/// [`SequenceStore`] under sequential numbering.
///
/// ```
/// use invoicebridge::core::*;
/// use invoicebridge::invoice::InvoiceAssembler;
/// use rust_decimal_macros::dec;
///
/// let config = BridgeConfig::default();
/// let sequences = InMemorySequenceStore::new();
/// let order = OrderBuilder::new(1042, "1042")
///     .billing(BillingBuilder::new("Ana", "García", "ES").build())
///     .add_item(OrderItemBuilder::new("Mug", dec!(2), dec!(20)).taxes(&[dec!(4.20)]).build())
///     .build();
///
/// let payload = InvoiceAssembler::new(&config, &sequences)
///     .prepare_invoice_data(&OrderRecord::Standard(order))
///     .unwrap();
/// assert_eq!(payload.invoice_type, InvoiceType::SimplifiedInvoice);
/// assert_eq!(payload.lines[0].price, dec!(10));
/// ```
pub struct InvoiceAssembler<'a> {
    config: &'a BridgeConfig,
    classifier: TaxClassifier,
    sequences: &'a dyn SequenceStore,
    issue_date: NaiveDate,
}

impl<'a> InvoiceAssembler<'a> {
    /// Assembler issuing invoices dated today (UTC).
    pub fn new(config: &'a BridgeConfig, sequences: &'a dyn SequenceStore) -> Self {
        Self {
            config,
            classifier: TaxClassifier::new(config),
            sequences,
            issue_date: Utc::now().date_naive(),
        }
    }

    /// Override the issue date.
    pub fn issued_on(mut self, date: NaiveDate) -> Self {
        self.issue_date = date;
        self
    }

    pub fn classifier(&self) -> &TaxClassifier {
        &self.classifier
    }

    /// Build the payload for `record`.
    ///
    /// # Errors
    ///
    /// `Precondition` when a refund's parent has no stored invoice (or no
    /// invoice number) to amend, `Config` for an empty custom numbering
    /// pattern, and any error of the sequence store.
    pub fn prepare_invoice_data(&self, record: &OrderRecord) -> Result<InvoicePayload, BridgeError> {
        let amended = amendment_target(record)?;
        let policy = AmountPolicy::for_record(record, self.config);
        let source = LineSource::for_record(record, policy);

        let mut lines: Vec<InvoiceLine> = source
            .items
            .iter()
            .map(|item| self.item_line(item, record, policy))
            .collect();
        if !source.shipping_total.is_zero() {
            lines.push(self.shipping_line(&source, record, policy));
        }

        let credit_note = policy.is_credit_note();
        let series_code = self.config.series_code(credit_note);
        let number = self.invoice_number(record, series_code.as_deref())?;
        let billing = record.billing();

        let (amended_number, amended_date, amended_reason) = match (record, amended) {
            (OrderRecord::Refund(refund), Some((number, invoice))) => (
                Some(number),
                Some(invoice.issued_at.date_naive()),
                refund
                    .reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(str::to_string),
            ),
            _ => (None, None, None),
        };

        debug!(
            record = record.id(),
            refund = record.is_refund(),
            lines = lines.len(),
            policy = ?policy,
            from_parent = source.from_parent,
            "prepared invoice payload"
        );

        Ok(InvoicePayload {
            invoice_type: invoice_type(record),
            date: self.issue_date,
            due_date: self
                .issue_date
                .checked_add_days(Days::new(u64::from(self.config.due_days)))
                .unwrap_or(self.issue_date),
            currency: record.currency().to_string(),
            language: self.config.language(),
            contact: self.contact(record),
            contact_email_override: billing.email.clone(),
            lines,
            extra_info: extra_info(record),
            series_code,
            number,
            amended_number,
            amended_date,
            amended_reason,
            is_credit_note: credit_note.then_some(true),
        })
    }

    fn contact(&self, record: &OrderRecord) -> InvoiceContact {
        let billing = record.billing();
        let tin_value = record.tax_id().map(str::to_string);
        let tin_scheme = tin_value.as_ref().map(|_| self.config.tin_scheme.clone());
        InvoiceContact {
            name: billing.display_name(),
            email: billing.email.clone(),
            country: billing.country.trim().to_uppercase(),
            address: billing.street(),
            city: billing.city.clone(),
            postalcode: billing.postcode.clone(),
            tin_value,
            tin_scheme,
        }
    }

    fn item_line(&self, item: &OrderItem, record: &OrderRecord, policy: AmountPolicy) -> InvoiceLine {
        let (quantity, price) = unit_amounts(item.quantity, item.subtotal, policy);
        let (quantity, price) = policy.apply(quantity, price);
        // Refund lines carry negative totals; the rate is taken on magnitudes.
        let rate = item_tax_rate(&item.magnitude());
        let tax = self.classifier.classify(item, record, rate);
        InvoiceLine {
            description: item.name.clone(),
            quantity,
            price,
            taxes: vec![tax.into()],
        }
    }

    fn shipping_line(
        &self,
        source: &LineSource,
        record: &OrderRecord,
        policy: AmountPolicy,
    ) -> InvoiceLine {
        let (quantity, price) = unit_amounts(Decimal::ZERO, source.shipping_total, policy);
        let (quantity, price) = policy.apply(quantity, price);
        let rate = shipping_tax_rate(source.shipping_total.abs(), source.shipping_tax.abs());
        let tax = self.classifier.classify_shipping(record, rate);
        InvoiceLine {
            description: SHIPPING_DESCRIPTION.to_string(),
            quantity,
            price,
            taxes: vec![tax.into()],
        }
    }

    fn invoice_number(
        &self,
        record: &OrderRecord,
        series_code: Option<&str>,
    ) -> Result<Option<String>, BridgeError> {
        match &self.config.numbering {
            NumberingMode::Automatic => Ok(None),
            NumberingMode::SourceOrderNumber => Ok(Some(record.billing_order().number.clone())),
            NumberingMode::Sequential => {
                let next = self
                    .sequences
                    .increment_and_get(series_code.unwrap_or_default())?;
                Ok(Some(next.to_string()))
            }
            NumberingMode::Custom(pattern) => {
                if pattern.trim().is_empty() {
                    return Err(BridgeError::Config(
                        "custom numbering selected but the pattern is empty".into(),
                    ));
                }
                let order_number = record.number();
                let ctx = NumberContext {
                    order_id: record.id(),
                    order_number: &order_number,
                    date: self.issue_date,
                };
                Ok(Some(render_number_pattern(pattern, &ctx)))
            }
        }
    }
}

/// The parent invoice a refund amends, with its number.
fn amendment_target(record: &OrderRecord) -> Result<Option<(String, &StoredInvoice)>, BridgeError> {
    let Some(parent) = record.parent() else {
        return Ok(None);
    };
    let invoice = parent.invoice.as_ref().ok_or_else(|| {
        BridgeError::Precondition(format!(
            "order #{} has no invoice to amend; generate it before invoicing the refund",
            parent.number
        ))
    })?;
    let number = invoice
        .number
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            BridgeError::Precondition(format!(
                "invoice {} of order #{} has no number yet",
                invoice.invoice_id, parent.number
            ))
        })?;
    Ok(Some((number.to_string(), invoice)))
}

/// Signed quantity and unsigned unit price of a line. Amount-only lines
/// (quantity 0) become one unit, negative when the amount is.
fn unit_amounts(quantity: Decimal, subtotal: Decimal, policy: AmountPolicy) -> (Decimal, Decimal) {
    if quantity.is_zero() {
        // Refunds count one returned unit even when the amount is zero.
        let negative = if subtotal.is_zero() {
            policy != AmountPolicy::Invoice
        } else {
            subtotal.is_sign_negative()
        };
        let unit = if negative { -Decimal::ONE } else { Decimal::ONE };
        (unit, subtotal.abs())
    } else {
        (quantity, (subtotal / quantity).abs().normalize())
    }
}

fn extra_info(record: &OrderRecord) -> String {
    match record {
        OrderRecord::Standard(order) => format!("Order #{}", order.number),
        OrderRecord::Refund(refund) => {
            format!("Refund #{} of order #{}", refund.id, refund.parent.number)
        }
    }
}
