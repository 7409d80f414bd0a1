//! Heuristic product extraction pipeline.
//!
//! Three concerns: normalizing price/availability text, discovering
//! candidate detail-page links on a listing page, and turning a fetched
//! page into product records through an ordered strategy cascade.

pub mod cards;
pub mod jsonld;
pub mod links;
pub mod price;

pub use cards::extract_products;
pub use links::discover_product_links;
pub use price::{guess_availability, has_price, normalize_space, parse_price};

use url::Url;

/// Resolve an href against the page URL, handling both absolute and
/// relative paths. Unresolvable hrefs pass through untouched.
pub fn resolve_url(base_url: &str, href: &str) -> String {
    if href.is_empty() {
        return String::new();
    }
    Url::parse(base_url)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve_url("https://example.com/cat", "/w1"),
            "https://example.com/w1"
        );
    }

    #[test]
    fn test_resolve_absolute_passthrough() {
        assert_eq!(
            resolve_url("https://example.com/cat", "https://other.com/x"),
            "https://other.com/x"
        );
    }

    #[test]
    fn test_resolve_empty() {
        assert_eq!(resolve_url("https://example.com", ""), "");
    }
}
