//! Small helpers over `scraper` shared by the site scrapers.
//!
//! Every helper takes an `ElementRef` scope; pass `document.root_element()` to search a whole page.
//! Selector strings that fail to parse behave like selectors that match nothing.

use scraper::{ElementRef, Selector};
use url::Url;

/// All text below `element`, with ideographic spaces folded and outer whitespace trimmed.
pub fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

/// Folds U+3000 (ideographic space) into a normal space and trims.
pub fn clean_text(text: &str) -> String {
    text.replace('\u{3000}', " ").trim().to_string()
}

/// Text of the first match, if it has any.
pub fn select_first_text(scope: ElementRef<'_>, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    scope
        .select(&selector)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
}

/// Text of every match, skipping empty ones.
pub fn select_all_text(scope: ElementRef<'_>, selector: &str) -> Vec<String> {
    match Selector::parse(selector) {
        Ok(selector) => scope
            .select(&selector)
            .map(element_text)
            .filter(|s| !s.is_empty())
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Attribute value of the first match that carries a non-empty `attr`.
pub fn select_attr(scope: ElementRef<'_>, selector: &str, attr: &str) -> Option<String> {
    select_attrs(scope, selector, attr).into_iter().next()
}

/// Non-empty `attr` values of every match, in document order.
pub fn select_attrs(scope: ElementRef<'_>, selector: &str, attr: &str) -> Vec<String> {
    match Selector::parse(selector) {
        Ok(selector) => scope
            .select(&selector)
            .filter_map(|element| element.value().attr(attr))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Resolves a possibly-relative `href` against the page it was found on.
pub fn resolve_url(base: &Url, href: &str) -> Option<String> {
    base.join(href.trim()).ok().map(|url| url.to_string())
}
