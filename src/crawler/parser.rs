//! HTML parser for extracting links
//!
//! Only `<a href>` anchors are followed. Hrefs are resolved against the page's
//! URL and normalized, so the set returned is ready for admission.

use crate::url::normalize_parsed;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use url::Url;

/// Turns a page body into the absolute URLs it links to
pub trait LinkExtractor: Send + Sync {
    /// Extracts normalized absolute URLs from `html`
    ///
    /// Links that cannot be resolved are skipped.
    fn extract_links(&self, html: &str, base_url: &Url) -> BTreeSet<Url>;
}

/// [`LinkExtractor`] backed by the `scraper` HTML parser
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links (same page anchors)
/// - Anything that does not resolve to an `http`/`https` URL with a host
///
/// **Note:** `rel="nofollow"` links ARE followed
#[derive(Debug, Clone, Default)]
pub struct HtmlLinkExtractor;

impl HtmlLinkExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl LinkExtractor for HtmlLinkExtractor {
    fn extract_links(&self, html: &str, base_url: &Url) -> BTreeSet<Url> {
        let document = Html::parse_document(html);
        let mut links = BTreeSet::new();

        let Ok(a_selector) = Selector::parse("a[href]") else {
            return links;
        };

        for element in document.select(&a_selector) {
            // Skip if it has the download attribute
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                match resolve_link(href, base_url) {
                    Some(url) => {
                        links.insert(url);
                    }
                    None => tracing::trace!("Skipping link {:?} on {}", href, base_url),
                }
            }
        }

        links
    }
}

/// Resolves a link href to a normalized absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    // Skip empty hrefs
    if href.is_empty() {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    // Skip fragment-only links (same page anchors)
    if href.starts_with('#') {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    normalize_parsed(absolute_url).ok()
}
