//! Tax category decision for invoice lines.

use rust_decimal::Decimal;

use crate::core::countries::{is_eu_country, same_country, tax_name_for_country};
use crate::core::{
    BridgeConfig, OrderItem, OrderRecord, TaxCategory, TaxCategoryResult, TaxStatus,
};

/// Decides the PEPPOL tax category of each line of an order.
///
/// Rules, first match wins:
///
/// 1. Intra-EU B2B supply → `AE` (reverse charge), 0 %
/// 2. Product not subject to tax → `NS`, 0 %
/// 3. Zero rate and `zero-rate` tax class → `Z`, 0 %
/// 4. Zero rate → `E` (exempt), 0 %
/// 5. Otherwise → `S` at the effective rate
#[derive(Debug, Clone)]
pub struct TaxClassifier {
    merchant_country: String,
}

impl TaxClassifier {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            merchant_country: config.merchant_country(),
        }
    }

    /// Merchant country the classifier was configured with.
    pub fn merchant_country(&self) -> &str {
        &self.merchant_country
    }

    /// Localized tax name of the merchant country.
    pub fn tax_name(&self) -> &'static str {
        tax_name_for_country(&self.merchant_country)
    }

    /// Whether the customer self-assesses the tax: identified business,
    /// merchant and customer in different EU member states.
    pub fn is_reverse_charge(&self, record: &OrderRecord) -> bool {
        if record.tax_id().is_none() {
            return false;
        }
        let customer_country = &record.billing().country;
        is_eu_country(&self.merchant_country)
            && is_eu_country(customer_country)
            && !same_country(&self.merchant_country, customer_country)
    }

    /// Category of a product line given its effective rate.
    pub fn classify(
        &self,
        item: &OrderItem,
        record: &OrderRecord,
        computed_rate: Decimal,
    ) -> TaxCategoryResult {
        let category = if self.is_reverse_charge(record) {
            TaxCategory::ReverseCharge
        } else if item
            .product
            .as_ref()
            .is_some_and(|p| p.tax_status == TaxStatus::None)
        {
            TaxCategory::NotSubject
        } else if computed_rate.is_zero() && item.product.as_ref().is_some_and(|p| p.is_zero_rate())
        {
            TaxCategory::ZeroRated
        } else if computed_rate.is_zero() {
            TaxCategory::Exempt
        } else {
            TaxCategory::StandardRate
        };
        self.result(category, computed_rate)
    }

    /// Category of the shipping line: `AE`, `E` or `S`, never `NS`/`Z`.
    pub fn classify_shipping(&self, record: &OrderRecord, computed_rate: Decimal) -> TaxCategoryResult {
        let category = if self.is_reverse_charge(record) {
            TaxCategory::ReverseCharge
        } else if computed_rate.is_zero() {
            TaxCategory::Exempt
        } else {
            TaxCategory::StandardRate
        };
        self.result(category, computed_rate)
    }

    fn result(&self, category: TaxCategory, computed_rate: Decimal) -> TaxCategoryResult {
        let percent = match category {
            TaxCategory::StandardRate => computed_rate.abs(),
            _ => Decimal::ZERO,
        };
        TaxCategoryResult {
            category,
            name: self.tax_name().to_string(),
            percent,
        }
    }
}
