//! Candidate product-link discovery on listing pages.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;
use url::Url;

use super::price;

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

/// Path fragments that commonly denote a product detail page.
const PRODUCT_PATH_KEYWORDS: &[&str] = &[
    "/product",
    "/products",
    "/item",
    "/p/",
    "/sku",
    "/collections",
    "/category",
];

/// Extract candidate detail-page URLs from a listing page.
///
/// Anchors with empty, fragment-only, `tel:` or script-protocol targets
/// are skipped. Remaining hrefs are resolved against `base_url`; when
/// `include_paths` is non-empty, resolved URLs must contain at least one
/// of the listed substrings. A URL is retained when the anchor's own
/// text plus its container's text looks priced, or the URL path carries
/// a product-indicating keyword.
pub fn discover_product_links(
    base_url: &str,
    html: &str,
    include_paths: &[String],
) -> HashSet<String> {
    let mut links = HashSet::new();
    let base = match Url::parse(base_url) {
        Ok(base) => base,
        Err(e) => {
            warn!("Unparseable base URL {}: {}", base_url, e);
            return links;
        }
    };

    let doc = Html::parse_document(html);
    for anchor in doc.select(&ANCHOR_SELECTOR) {
        let href = anchor.value().attr("href").unwrap_or("");
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("tel:")
            || href.starts_with("javascript:")
        {
            continue;
        }
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        let full = resolved.to_string();

        if !include_paths.is_empty() && !include_paths.iter().any(|p| full.contains(p.as_str())) {
            continue;
        }

        let lowered = full.to_lowercase();
        if price::has_price(&anchor_context(&anchor))
            || PRODUCT_PATH_KEYWORDS.iter().any(|k| lowered.contains(k))
        {
            links.insert(full);
        }
    }
    links
}

/// The anchor's own text plus its immediate container's text.
fn anchor_context(anchor: &ElementRef) -> String {
    let mut context: String = anchor.text().collect::<Vec<_>>().join(" ");
    if let Some(parent) = anchor.parent().and_then(ElementRef::wrap) {
        context.push(' ');
        context.push_str(&parent.text().collect::<Vec<_>>().join(" "));
    }
    context
}
