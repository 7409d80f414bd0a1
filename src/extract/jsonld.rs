//! Structured product data from JSON-LD blocks.
//!
//! Storefronts that embed schema.org `Product` nodes get exact values;
//! the heuristic strategies only run when no structured data is present.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde_json::{Map, Value};

use super::price::{normalize_currency, normalize_space};
use super::resolve_url;
use crate::models::{Availability, Product};

static LD_JSON_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());

/// Collect products from every JSON-LD block on the page.
/// Blocks that fail to parse are skipped silently.
pub fn extract(doc: &Html, base_url: &str) -> Vec<Product> {
    let mut products = Vec::new();
    for script in doc.select(&LD_JSON_SELECTOR) {
        let blob: String = script.text().collect();
        let Ok(data) = serde_json::from_str::<Value>(&blob) else {
            continue;
        };
        collect(&data, base_url, &mut products);
    }
    products
}

/// Walk the JSON graph; any node typed `Product` yields a record.
fn collect(node: &Value, base_url: &str, out: &mut Vec<Product>) {
    match node {
        Value::Array(items) => {
            for item in items {
                collect(item, base_url, out);
            }
        }
        Value::Object(obj) => {
            if is_product(obj) {
                if let Some(product) = product_from_node(obj, base_url) {
                    out.push(product);
                }
            }
            for value in obj.values() {
                if value.is_object() || value.is_array() {
                    collect(value, base_url, out);
                }
            }
        }
        _ => {}
    }
}

fn is_product(obj: &Map<String, Value>) -> bool {
    match obj.get("@type") {
        Some(Value::String(t)) => t == "Product",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("Product")),
        _ => false,
    }
}

fn product_from_node(obj: &Map<String, Value>, base_url: &str) -> Option<Product> {
    let name = normalize_space(obj.get("name").and_then(Value::as_str).unwrap_or(""));
    let offer = first_offer(obj);

    let (price_value, raw_price_text) = match offer.and_then(|o| o.get("price")) {
        Some(Value::Number(n)) => (n.as_f64(), n.to_string()),
        Some(Value::String(s)) => (s.trim().replace(',', "").parse().ok(), s.clone()),
        _ => (None, String::new()),
    };

    let currency = offer
        .and_then(|o| o.get("priceCurrency"))
        .and_then(Value::as_str)
        .and_then(normalize_currency);

    let status = offer
        .and_then(|o| o.get("availability"))
        .and_then(availability_token)
        .map(schema_availability)
        .unwrap_or_default();

    let url = obj
        .get("url")
        .and_then(Value::as_str)
        .map(|u| resolve_url(base_url, u))
        .unwrap_or_default();

    let product = Product {
        name,
        url,
        price_value,
        currency,
        raw_price_text,
        status,
    };
    if product.is_discardable() {
        None
    } else {
        Some(product)
    }
}

/// First offer: `offers` may be a single object or an array.
fn first_offer(obj: &Map<String, Value>) -> Option<&Map<String, Value>> {
    match obj.get("offers")? {
        Value::Object(offer) => Some(offer),
        Value::Array(offers) => offers.first()?.as_object(),
        _ => None,
    }
}

/// `availability` may be a plain token or an object carrying `@id`.
fn availability_token(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s),
        Value::Object(obj) => obj.get("@id").and_then(Value::as_str),
        _ => None,
    }
}

/// Map a schema.org availability token to the closed status enum.
fn schema_availability(token: &str) -> Availability {
    let lowered = token.to_lowercase();
    if lowered.contains("outofstock") || lowered.contains("soldout") {
        Availability::OutOfStock
    } else if lowered.contains("instock") {
        Availability::Available
    } else {
        Availability::Unknown
    }
}
