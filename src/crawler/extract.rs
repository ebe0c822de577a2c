//! Search result extraction
//!
//! Prefecture search pages render each hit as a `fr-card` block from the
//! French state design system. `CardExtractor` pulls title, link and
//! description out of those blocks; it is only the default implementation of
//! the `PageProcessor` seam, and the orchestrator never depends on its rules.

use crate::registry::Site;
use crate::store::PageItem;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Turns a fetched page body into candidate items
///
/// Implementations must be pure with respect to the crawl: no network, no
/// storage. An empty result is meaningful (it ends pagination for the unit),
/// so "could not parse" and "nothing found" are deliberately the same answer.
pub trait PageProcessor {
    /// Extracts items from one search result page
    fn extract_items(&self, site: &Site, keyword: &str, html: &str) -> Vec<PageItem>;
}

/// Default processor for design-system card markup
#[derive(Debug, Clone, Copy, Default)]
pub struct CardExtractor;

impl CardExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl PageProcessor for CardExtractor {
    fn extract_items(&self, site: &Site, keyword: &str, html: &str) -> Vec<PageItem> {
        let base_url = match Url::parse(&format!("{}/", site.base_url())) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Unparseable base URL for site {}: {}", site.name, e);
                return Vec::new();
            }
        };

        let items = extract_cards(html, &base_url);
        tracing::debug!(
            "Extracted {} items for {} / {}",
            items.len(),
            site.name,
            keyword
        );
        items
    }
}

/// Extracts all card blocks from the HTML document
fn extract_cards(html: &str, base_url: &Url) -> Vec<PageItem> {
    let document = Html::parse_document(html);
    let mut items = Vec::new();

    if let Ok(card_selector) = Selector::parse("div.fr-card") {
        for card in document.select(&card_selector) {
            if let Some(item) = extract_card(card, base_url) {
                items.push(item);
            }
        }
    }

    items
}

/// Extracts one item from a card block
///
/// A card without a usable title anchor is skipped; partial cards are worse
/// than missing ones downstream.
fn extract_card(card: ElementRef, base_url: &Url) -> Option<PageItem> {
    let anchor = title_anchor(card)?;

    let title = anchor.text().collect::<String>().trim().to_string();
    if title.is_empty() {
        return None;
    }

    let href = anchor.value().attr("href")?;
    let link = resolve_link(href, base_url)?;

    Some(PageItem {
        title,
        link,
        description: extract_description(card),
    })
}

/// Finds the title anchor inside a card
///
/// The design system nests the anchor inside the card title heading; older
/// page templates put a bare anchor in the card body instead.
fn title_anchor(card: ElementRef) -> Option<ElementRef> {
    for selector in [
        "h3.fr-card__title a[href]",
        "h2.fr-card__title a[href]",
        "a[href]",
    ] {
        if let Ok(selector) = Selector::parse(selector) {
            if let Some(anchor) = card.select(&selector).next() {
                return Some(anchor);
            }
        }
    }
    None
}

/// Extracts the card description paragraph, if present and non-empty
fn extract_description(card: ElementRef) -> Option<String> {
    for selector in ["p.fr-card__desc", "p"] {
        if let Ok(selector) = Selector::parse(selector) {
            if let Some(element) = card.select(&selector).next() {
                let text = element.text().collect::<String>().trim().to_string();
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

/// Resolves a card href to an absolute HTTP(S) URL
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
