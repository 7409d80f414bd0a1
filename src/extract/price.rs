//! Price and availability normalization.
//!
//! Free-form page text goes in, a numeric price, a currency code and a
//! coarse stock status come out. Patterns cover English and Arabic
//! storefronts (Egyptian pound markers in both scripts).

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Availability;

/// Canonical currency assigned when a price matched but no token did.
pub const FALLBACK_CURRENCY: &str = "EGP";

/// Currency token adjacent to a number, token before or after.
/// The number is captured separately so separators in the token itself
/// never leak into the numeric conversion.
static PRICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:EGP|ج\.م|LE|جنيه)\s*([\d,.]+)|([\d,.]+)\s*(?:EGP|ج\.م|LE|جنيه)")
        .unwrap()
});

/// Token -> ISO-ish code table, matched case-insensitively on the raw text.
const CURRENCY_TOKENS: &[(&str, &str)] = &[
    ("egp", "EGP"),
    ("le", "EGP"),
    ("ج.م", "EGP"),
    ("جنيه", "EGP"),
];

static UNAVAILABLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)out of stock|sold out|غير متاح|نفدت الكمية|غير متوفر").unwrap()
});

static AVAILABLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)in stock|available|متاح|متوفّر|مُتاح").unwrap());

/// Result of scanning text for a price.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPrice {
    /// Numeric value, `None` when the digit string did not convert.
    pub value: Option<f64>,
    /// Resolved currency code.
    pub currency: Option<String>,
    /// The matched substring, empty when nothing matched.
    pub raw: String,
}

/// Scan `text` for the first currency-adjacent price.
///
/// Thousands separators are stripped before conversion. A match whose
/// digit string fails to convert still returns the raw text for auditing.
pub fn parse_price(text: &str) -> ParsedPrice {
    let Some(caps) = PRICE_PATTERN.captures(text) else {
        return ParsedPrice::default();
    };

    let raw = caps.get(0).map(|m| m.as_str()).unwrap_or("").to_string();
    let number = caps
        .get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str())
        .unwrap_or("");

    let digits = number.replace(',', "");
    let value = if digits.is_empty() {
        None
    } else {
        digits.parse::<f64>().ok()
    };

    let lowered = raw.to_lowercase();
    let mut currency = CURRENCY_TOKENS
        .iter()
        .find(|(token, _)| lowered.contains(token))
        .map(|(_, code)| (*code).to_string());
    if currency.is_none() && value.is_some() {
        currency = Some(FALLBACK_CURRENCY.to_string());
    }

    ParsedPrice {
        value,
        currency,
        raw,
    }
}

/// True when `text` contains any price-like pattern.
pub fn has_price(text: &str) -> bool {
    PRICE_PATTERN.is_match(text)
}

/// Classify stock status from page text.
///
/// Unavailability keywords are checked first, so text carrying
/// conflicting signals resolves to out-of-stock.
pub fn guess_availability(text: &str) -> Availability {
    if UNAVAILABLE_PATTERN.is_match(text) {
        Availability::OutOfStock
    } else if AVAILABLE_PATTERN.is_match(text) {
        Availability::Available
    } else {
        Availability::Unknown
    }
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn normalize_space(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sanitize a currency value carried by structured data.
///
/// Recognizes the codes storefronts in scope actually emit, plus a few
/// symbol heuristics. Unknown tokens return `None` so the downstream
/// fallback applies.
pub fn normalize_currency(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let upper = trimmed.to_uppercase();
    if matches!(upper.as_str(), "EGP" | "USD" | "EUR" | "GBP" | "SAR" | "AED") {
        return Some(upper);
    }
    if trimmed.contains("ج.م")
        || trimmed.contains("جم")
        || trimmed.contains("جنيه")
        || trimmed.contains("E£")
    {
        return Some("EGP".to_string());
    }
    if trimmed.contains('£') || trimmed.contains('₤') {
        return Some("GBP".to_string());
    }
    if trimmed.contains('$') {
        return Some("USD".to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_token_before_number() {
        let p = parse_price("Special offer: EGP 1,299 today only");
        assert_eq!(p.value, Some(1299.0));
        assert_eq!(p.currency.as_deref(), Some("EGP"));
        assert_eq!(p.raw, "EGP 1,299");
    }

    #[test]
    fn test_price_token_after_number() {
        let p = parse_price("Widget — 150 EGP — In stock");
        assert_eq!(p.value, Some(150.0));
        assert_eq!(p.currency.as_deref(), Some("EGP"));
        assert_eq!(p.raw, "150 EGP");
    }

    #[test]
    fn test_price_arabic_token() {
        let p = parse_price("السعر ج.م 50 فقط");
        assert_eq!(p.value, Some(50.0));
        assert_eq!(p.currency.as_deref(), Some("EGP"));
    }

    #[test]
    fn test_price_le_maps_to_egp() {
        let p = parse_price("LE 75.50");
        assert_eq!(p.value, Some(75.5));
        assert_eq!(p.currency.as_deref(), Some("EGP"));
    }

    #[test]
    fn test_no_price_anywhere() {
        let p = parse_price("no price here");
        assert_eq!(p, ParsedPrice::default());
        assert_eq!(p.raw, "");
    }

    #[test]
    fn test_mid_sentence_price_keeps_value() {
        let p = parse_price("only 450 EGP while supplies last");
        assert_eq!(p.value, Some(450.0));
        assert!(p.currency.is_some());
    }

    #[test]
    fn test_availability_unavailable_wins() {
        // Both signals present: out-of-stock check precedes availability.
        let status = guess_availability("was in stock, now sold out");
        assert_eq!(status, Availability::OutOfStock);
    }

    #[test]
    fn test_availability_arabic() {
        assert_eq!(guess_availability("متاح للشراء"), Availability::Available);
        assert_eq!(guess_availability("غير متاح"), Availability::OutOfStock);
    }

    #[test]
    fn test_availability_unknown() {
        assert_eq!(guess_availability("lorem ipsum"), Availability::Unknown);
    }

    #[test]
    fn test_normalize_space() {
        assert_eq!(normalize_space("  a \t b\n c  "), "a b c");
        assert_eq!(normalize_space(""), "");
    }

    #[test]
    fn test_normalize_currency_codes() {
        assert_eq!(normalize_currency("usd").as_deref(), Some("USD"));
        assert_eq!(normalize_currency(" EGP ").as_deref(), Some("EGP"));
        assert_eq!(normalize_currency("sar").as_deref(), Some("SAR"));
    }

    #[test]
    fn test_normalize_currency_symbols() {
        assert_eq!(normalize_currency("£").as_deref(), Some("GBP"));
        assert_eq!(normalize_currency("$").as_deref(), Some("USD"));
        assert_eq!(normalize_currency("E£").as_deref(), Some("EGP"));
    }

    #[test]
    fn test_normalize_currency_unknown() {
        assert_eq!(normalize_currency("JPY-ish"), None);
        assert_eq!(normalize_currency(""), None);
    }

    #[test]
    fn test_has_price() {
        assert!(has_price("99 EGP"));
        assert!(!has_price("free shipping"));
    }
}
