//! Country tables used for tax classification.
//!
//! EU-27 membership for reverse-charge detection and the localized
//! name of each country's consumption tax.

/// EU member state country codes (ISO 3166-1 alpha-2), sorted for binary search.
static EU_COUNTRIES: &[&str] = &[
    "AT", "BE", "BG", "CY", "CZ", "DE", "DK", "EE", "ES", "FI", "FR", "GR", "HR", "HU", "IE", "IT",
    "LT", "LU", "LV", "MT", "NL", "PL", "PT", "RO", "SE", "SI", "SK",
];

/// Localized tax names keyed by country code.
static TAX_NAMES: &[(&str, &str)] = &[
    ("ES", "IVA"),
    ("FR", "TVA"),
    ("DE", "MwSt"),
    ("IT", "IVA"),
    ("PT", "IVA"),
    ("NL", "BTW"),
    ("BE", "TVA"),
    ("AT", "USt"),
    ("GB", "VAT"),
    ("IE", "VAT"),
    ("US", "Sales Tax"),
    ("CA", "GST"),
    ("AU", "GST"),
    ("NZ", "GST"),
];

const DEFAULT_TAX_NAME: &str = "VAT";

/// Whether `country` is an EU member state. Case-insensitive.
pub fn is_eu_country(country: &str) -> bool {
    EU_COUNTRIES
        .binary_search(&country.trim().to_uppercase().as_str())
        .is_ok()
}

/// Localized name of the consumption tax in `country`, `"VAT"` if unknown.
pub fn tax_name_for_country(country: &str) -> &'static str {
    let code = country.trim().to_uppercase();
    TAX_NAMES
        .iter()
        .find(|(cc, _)| *cc == code)
        .map(|(_, name)| *name)
        .unwrap_or(DEFAULT_TAX_NAME)
}

/// Country part of a store default-country setting (`"ES"` or `"ES:M"`),
/// upper-cased.
pub fn base_country(setting: &str) -> String {
    setting
        .split(':')
        .next()
        .unwrap_or_default()
        .trim()
        .to_uppercase()
}

/// Case-insensitive country code comparison.
pub fn same_country(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
