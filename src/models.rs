//! Core data types for scraped products.

/// Coarse stock status for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Availability {
    Available,
    OutOfStock,
    #[default]
    Unknown,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Available => "Available",
            Availability::OutOfStock => "Out of stock",
            Availability::Unknown => "Unknown",
        }
    }
}

/// A single product record extracted from a page.
///
/// Records are immutable once constructed; they are written to the report
/// as soon as the page that produced them has been processed.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Display name, whitespace-normalized.
    pub name: String,
    /// Absolute URL of the detail page. Empty when extraction fell back
    /// to the listing-page context.
    pub url: String,
    /// Parsed numeric price, if any pattern matched.
    pub price_value: Option<f64>,
    /// Resolved currency code, if any.
    pub currency: Option<String>,
    /// The matched price substring, kept for auditing.
    pub raw_price_text: String,
    /// Stock status classification.
    pub status: Availability,
}

impl Product {
    /// A record with no URL, no name and no price text carries nothing
    /// worth reporting and is dropped at extraction time.
    pub fn is_discardable(&self) -> bool {
        self.url.is_empty() && self.name.is_empty() && self.raw_price_text.is_empty()
    }

    /// Deduplication key: URL when present, name otherwise.
    pub fn key(&self) -> &str {
        if !self.url.is_empty() {
            &self.url
        } else {
            &self.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, url: &str, raw: &str) -> Product {
        Product {
            name: name.to_string(),
            url: url.to_string(),
            price_value: None,
            currency: None,
            raw_price_text: raw.to_string(),
            status: Availability::Unknown,
        }
    }

    #[test]
    fn test_discardable_when_fully_empty() {
        assert!(product("", "", "").is_discardable());
        assert!(!product("Widget", "", "").is_discardable());
        assert!(!product("", "", "150 EGP").is_discardable());
    }

    #[test]
    fn test_key_prefers_url() {
        assert_eq!(product("Widget", "https://x/p1", "").key(), "https://x/p1");
        assert_eq!(product("Widget", "", "").key(), "Widget");
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(Availability::Available.as_str(), "Available");
        assert_eq!(Availability::OutOfStock.as_str(), "Out of stock");
        assert_eq!(Availability::Unknown.as_str(), "Unknown");
    }
}
