use rust_decimal::Decimal;

use super::types::*;

/// Builder for orders.
///
/// ```
/// use invoicebridge::core::*;
/// use rust_decimal_macros::dec;
///
/// let order = OrderBuilder::new(1042, "1042")
///     .billing(BillingBuilder::new("Ana", "García", "ES").email("ana@example.com").build())
///     .add_item(OrderItemBuilder::new("Mug", dec!(2), dec!(20)).taxes(&[dec!(4.20)]).build())
///     .shipping(dec!(5), dec!(1.05))
///     .build();
///
/// assert_eq!(order.items.len(), 1);
/// ```
pub struct OrderBuilder {
    id: u64,
    number: String,
    billing: Billing,
    currency: String,
    items: Vec<OrderItem>,
    shipping_total: Decimal,
    shipping_tax: Decimal,
    tax_id: Option<String>,
    invoice: Option<StoredInvoice>,
}

impl OrderBuilder {
    pub fn new(id: u64, number: impl Into<String>) -> Self {
        Self {
            id,
            number: number.into(),
            billing: Billing::default(),
            currency: "EUR".to_string(),
            items: Vec::new(),
            shipping_total: Decimal::ZERO,
            shipping_tax: Decimal::ZERO,
            tax_id: None,
            invoice: None,
        }
    }

    pub fn billing(mut self, billing: Billing) -> Self {
        self.billing = billing;
        self
    }

    pub fn currency(mut self, code: impl Into<String>) -> Self {
        self.currency = code.into();
        self
    }

    pub fn add_item(mut self, item: OrderItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn shipping(mut self, total: Decimal, tax: Decimal) -> Self {
        self.shipping_total = total;
        self.shipping_tax = tax;
        self
    }

    pub fn tax_id(mut self, id: impl Into<String>) -> Self {
        self.tax_id = Some(id.into());
        self
    }

    pub fn invoice(mut self, invoice: StoredInvoice) -> Self {
        self.invoice = Some(invoice);
        self
    }

    pub fn build(self) -> Order {
        Order {
            id: self.id,
            number: self.number,
            billing: self.billing,
            currency: self.currency,
            items: self.items,
            shipping_total: self.shipping_total,
            shipping_tax: self.shipping_tax,
            tax_id: self.tax_id,
            invoice: self.invoice,
        }
    }
}

/// Builder for refunds. Currency defaults to the parent's.
pub struct RefundBuilder {
    id: u64,
    parent: Order,
    reason: Option<String>,
    items: Vec<OrderItem>,
    shipping_total: Decimal,
    shipping_tax: Decimal,
    tax_id: Option<String>,
}

impl RefundBuilder {
    pub fn new(id: u64, parent: Order) -> Self {
        Self {
            id,
            parent,
            reason: None,
            items: Vec::new(),
            shipping_total: Decimal::ZERO,
            shipping_tax: Decimal::ZERO,
            tax_id: None,
        }
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn add_item(mut self, item: OrderItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn shipping(mut self, total: Decimal, tax: Decimal) -> Self {
        self.shipping_total = total;
        self.shipping_tax = tax;
        self
    }

    pub fn tax_id(mut self, id: impl Into<String>) -> Self {
        self.tax_id = Some(id.into());
        self
    }

    pub fn build(self) -> Refund {
        let currency = self.parent.currency.clone();
        Refund {
            id: self.id,
            parent: self.parent,
            reason: self.reason,
            items: self.items,
            shipping_total: self.shipping_total,
            shipping_tax: self.shipping_tax,
            tax_id: self.tax_id,
            currency,
        }
    }
}

/// Builder for billing data.
pub struct BillingBuilder {
    billing: Billing,
}

impl BillingBuilder {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            billing: Billing {
                first_name: first_name.into(),
                last_name: last_name.into(),
                country: country.into(),
                ..Billing::default()
            },
        }
    }

    pub fn company(mut self, company: impl Into<String>) -> Self {
        self.billing.company = company.into();
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.billing.email = email.into();
        self
    }

    pub fn address(
        mut self,
        line_1: impl Into<String>,
        city: impl Into<String>,
        postcode: impl Into<String>,
    ) -> Self {
        self.billing.address_1 = line_1.into();
        self.billing.city = city.into();
        self.billing.postcode = postcode.into();
        self
    }

    pub fn address_2(mut self, line_2: impl Into<String>) -> Self {
        self.billing.address_2 = line_2.into();
        self
    }

    pub fn build(self) -> Billing {
        self.billing
    }
}

/// Builder for order lines. Subtotal defaults to the total.
pub struct OrderItemBuilder {
    name: String,
    quantity: Decimal,
    subtotal: Option<Decimal>,
    total: Decimal,
    taxes: Vec<Decimal>,
    product: Option<Product>,
}

impl OrderItemBuilder {
    pub fn new(name: impl Into<String>, quantity: Decimal, total: Decimal) -> Self {
        Self {
            name: name.into(),
            quantity,
            subtotal: None,
            total,
            taxes: Vec::new(),
            product: Some(Product {
                tax_status: TaxStatus::Taxable,
                tax_class: String::new(),
            }),
        }
    }

    pub fn subtotal(mut self, subtotal: Decimal) -> Self {
        self.subtotal = Some(subtotal);
        self
    }

    pub fn taxes(mut self, taxes: &[Decimal]) -> Self {
        self.taxes = taxes.to_vec();
        self
    }

    pub fn product(mut self, tax_status: TaxStatus, tax_class: impl Into<String>) -> Self {
        self.product = Some(Product {
            tax_status,
            tax_class: tax_class.into(),
        });
        self
    }

    /// Line whose product has been deleted from the catalogue.
    pub fn without_product(mut self) -> Self {
        self.product = None;
        self
    }

    pub fn build(self) -> OrderItem {
        OrderItem {
            name: self.name,
            quantity: self.quantity,
            subtotal: self.subtotal.unwrap_or(self.total),
            total: self.total,
            taxes: self.taxes,
            product: self.product,
        }
    }
}
