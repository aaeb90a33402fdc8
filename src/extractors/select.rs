//! CSS selector evaluation
//!
//! Thin layer over the scraper crate: scope lookup and raw string reads
//! for the three accessors.

use scraper::{ElementRef, Html, Selector};

use crate::mapping::Accessor;

/// First element of the document matching `selector`
pub fn root_scope<'a>(document: &'a Html, selector: &Selector) -> Option<ElementRef<'a>> {
    document.select(selector).next()
}

/// All descendants of `scope` matching `selector`, in document order
pub fn select_scopes<'a>(scope: ElementRef<'a>, selector: &Selector) -> Vec<ElementRef<'a>> {
    scope.select(selector).collect()
}

/// Raw string of the first descendant of `scope` matching `selector`
pub fn select_first(scope: ElementRef<'_>, selector: &Selector, accessor: &Accessor) -> Option<String> {
    let element = scope.select(selector).next()?;
    read(element, accessor)
}

/// Read an element's value through an accessor.
/// Returns `None` only when a named attribute is missing.
pub fn read(element: ElementRef<'_>, accessor: &Accessor) -> Option<String> {
    match accessor {
        Accessor::Text => Some(normalize_ws(&element.text().collect::<String>())),
        Accessor::OwnText => Some(own_text(element)),
        Accessor::Attr(name) => element.value().attr(name).map(String::from),
    }
}

/// Text nodes that are direct children of `element`, descendants excluded
pub fn own_text(element: ElementRef<'_>) -> String {
    let text: String = element
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|t| &**t)
        .collect();
    normalize_ws(&text)
}

/// Collapse whitespace runs into single spaces and trim
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
