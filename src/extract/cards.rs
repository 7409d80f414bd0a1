//! Product extraction strategy cascade.
//!
//! Strategies are tried in order until one yields records: structured
//! JSON-LD data first, then repeating card containers, then a
//! whole-document scan for anchors sitting next to a price.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::price::{self, FALLBACK_CURRENCY};
use super::{jsonld, resolve_url};
use crate::models::Product;

/// Name assigned to priced anchors with no text of their own.
pub(crate) const PLACEHOLDER_NAME: &str = "N/A";

/// Ordered container selectors commonly denoting a product card.
/// Broad class-substring patterns come last.
const CARD_SELECTORS: &[&str] = &[
    ".product-item",
    ".product",
    ".grid-product",
    ".card-product",
    ".product-card",
    ".product-grid-item",
    "li.product",
    "article.product",
    "div[class*=product]",
    "div[class*=card]",
];

static CARD_SELECTOR_LIST: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    CARD_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});

static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

static HEADING_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, h5").unwrap());

type ExtractFn = fn(&Html, &str) -> Vec<Product>;

/// The cascade, in preference order.
const STRATEGIES: &[(&str, ExtractFn)] = &[
    ("jsonld", jsonld::extract),
    ("cards", extract_card_products),
    ("anchor-scan", extract_anchor_products),
];

/// Extract product records from a fetched page.
///
/// The first strategy producing a non-empty result wins. Records are
/// then deduplicated by key (URL when present, name otherwise; first
/// occurrence wins) and records carrying a value without a currency get
/// the canonical fallback code.
pub fn extract_products(html: &str, base_url: &str) -> Vec<Product> {
    let doc = Html::parse_document(html);
    let mut extracted = Vec::new();
    for (name, strategy) in STRATEGIES {
        extracted = strategy(&doc, base_url);
        if !extracted.is_empty() {
            debug!(
                "Strategy {} produced {} records for {}",
                name,
                extracted.len(),
                base_url
            );
            break;
        }
    }
    finalize(extracted)
}

/// Dedup by key and apply the fallback currency. Records without any
/// key are dropped along with fully-empty ones.
fn finalize(products: Vec<Product>) -> Vec<Product> {
    let mut seen = HashSet::new();
    let mut retained = Vec::new();
    for mut product in products {
        let key = product.key().to_string();
        if key.is_empty() || !seen.insert(key) {
            continue;
        }
        if product.price_value.is_some() && product.currency.is_none() {
            product.currency = Some(FALLBACK_CURRENCY.to_string());
        }
        retained.push(product);
    }
    retained
}

/// Card-container strategy: every match of the selector list becomes a
/// candidate record.
fn extract_card_products(doc: &Html, base_url: &str) -> Vec<Product> {
    let mut products = Vec::new();
    for selector in CARD_SELECTOR_LIST.iter() {
        for card in doc.select(selector) {
            if let Some(product) = product_from_card(&card, base_url) {
                products.push(product);
            }
        }
    }
    products
}

/// Card-level extraction: name from the first link or heading, price and
/// availability from the container's visible text, URL from the first
/// link. Containers yielding nothing are discarded.
fn product_from_card(card: &ElementRef, base_url: &str) -> Option<Product> {
    let text = price::normalize_space(&card.text().collect::<Vec<_>>().join(" "));
    let parsed = price::parse_price(&text);

    let link = card.select(&LINK_SELECTOR).next();
    let href = link.and_then(|a| a.value().attr("href")).unwrap_or("");
    let mut name = link
        .map(|a| price::normalize_space(&a.text().collect::<Vec<_>>().join(" ")))
        .unwrap_or_default();
    if name.is_empty() {
        if let Some(heading) = card.select(&HEADING_SELECTOR).next() {
            name = price::normalize_space(&heading.text().collect::<Vec<_>>().join(" "));
        }
    }

    let product = Product {
        name,
        url: resolve_url(base_url, href),
        price_value: parsed.value,
        currency: parsed.currency,
        raw_price_text: parsed.raw,
        status: price::guess_availability(&text),
    };
    if product.is_discardable() {
        None
    } else {
        Some(product)
    }
}

/// Whole-document fallback: any anchor whose own text plus its parent's
/// text contains a price becomes a record.
fn extract_anchor_products(doc: &Html, base_url: &str) -> Vec<Product> {
    let mut products = Vec::new();
    for anchor in doc.select(&LINK_SELECTOR) {
        let own_text = price::normalize_space(&anchor.text().collect::<Vec<_>>().join(" "));
        let mut context = own_text.clone();
        if let Some(parent) = anchor.parent().and_then(ElementRef::wrap) {
            context.push(' ');
            context.push_str(&price::normalize_space(
                &parent.text().collect::<Vec<_>>().join(" "),
            ));
        }
        if !price::has_price(&context) {
            continue;
        }

        let parsed = price::parse_price(&context);
        let href = anchor.value().attr("href").unwrap_or("");
        products.push(Product {
            name: if own_text.is_empty() {
                PLACEHOLDER_NAME.to_string()
            } else {
                own_text
            },
            url: resolve_url(base_url, href),
            price_value: parsed.value,
            currency: parsed.currency,
            raw_price_text: parsed.raw,
            status: price::guess_availability(&context),
        });
    }
    products
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Availability;

    #[test]
    fn test_card_extraction_basic() {
        let html = r#"
            <div class="product-card">
                <a href="/w1">Widget</a>
                <span>150 EGP</span>
                <span>In stock</span>
            </div>
        "#;
        let products = extract_products(html, "https://example.com/cat");
        assert_eq!(products.len(), 1);
        let p = &products[0];
        assert_eq!(p.name, "Widget");
        assert_eq!(p.url, "https://example.com/w1");
        assert_eq!(p.price_value, Some(150.0));
        assert_eq!(p.currency.as_deref(), Some("EGP"));
        assert_eq!(p.raw_price_text, "150 EGP");
        assert_eq!(p.status, Availability::Available);
    }

    #[test]
    fn test_card_name_falls_back_to_heading() {
        let html = r#"
            <div class="product">
                <a href="/w2"><img src="w2.jpg"></a>
                <h3>Headset Pro</h3>
                <span>EGP 2,499</span>
            </div>
        "#;
        let products = extract_products(html, "https://example.com");
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Headset Pro");
        assert_eq!(products[0].price_value, Some(2499.0));
    }

    #[test]
    fn test_duplicate_urls_first_wins() {
        let html = r#"
            <div class="product-card"><a href="/w1">First</a><span>100 EGP</span></div>
            <div class="product-card"><a href="/w1">Second</a><span>200 EGP</span></div>
        "#;
        let products = extract_products(html, "https://example.com");
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "First");
        assert_eq!(products[0].price_value, Some(100.0));
    }

    #[test]
    fn test_empty_cards_discarded() {
        let html = r#"<div class="product-card"><span>no link, no price</span></div>"#;
        let products = extract_products(html, "https://example.com");
        assert!(products.is_empty());
    }

    #[test]
    fn test_anchor_scan_fallback() {
        // No card container anywhere, but an anchor sits next to a price.
        let html = r#"<p><a href="/deal">Bundle</a> — 399 EGP</p>"#;
        let products = extract_products(html, "https://example.com");
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Bundle");
        assert_eq!(products[0].url, "https://example.com/deal");
        assert_eq!(products[0].price_value, Some(399.0));
    }

    #[test]
    fn test_anchor_scan_placeholder_name() {
        let html = r#"<p><a href="/deal"><img src="x.jpg"></a> 399 EGP</p>"#;
        let products = extract_products(html, "https://example.com");
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, PLACEHOLDER_NAME);
    }

    #[test]
    fn test_no_products_anywhere() {
        let html = "<html><body><p>nothing for sale</p></body></html>";
        assert!(extract_products(html, "https://example.com").is_empty());
    }

    #[test]
    fn test_out_of_stock_beats_in_stock_in_card_text() {
        let html = r#"
            <div class="product-card">
                <a href="/w3">Mouse</a>
                <span>75 EGP</span>
                <span>was in stock, now sold out</span>
            </div>
        "#;
        let products = extract_products(html, "https://example.com");
        assert_eq!(products[0].status, Availability::OutOfStock);
    }
}
