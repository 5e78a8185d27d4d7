use std::collections::HashMap;
use std::sync::LazyLock;

use scraper::node::Element;
use scraper::{ElementRef, Html, Selector};

pub static HEADING_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, h5, h6").unwrap());

/// Read-only view over an `h1`..`h6` element of a parsed page.
#[derive(Debug, Clone, Copy)]
pub struct Heading<'a> {
    pub element: ElementRef<'a>,
    pub level: u8,
    /// Index among the page's headings, in document order.
    pub position: usize,
}

impl<'a> Heading<'a> {
    pub fn text(&self) -> String {
        self.element.text().collect::<String>().trim().to_string()
    }

    pub fn parent(&self) -> Option<ElementRef<'a>> {
        self.element.parent().and_then(ElementRef::wrap)
    }
}

/// `h1` → 1 ... `h6` → 6. Anything else is not a heading.
pub fn heading_level(tag: &str) -> Option<u8> {
    let digit = tag.strip_prefix('h').or_else(|| tag.strip_prefix('H'))?;
    match digit.parse::<u8>() {
        Ok(level @ 1..=6) if digit.len() == 1 => Some(level),
        _ => None,
    }
}

/// Every heading of one document, in document order.
pub struct HeadingIndex<'a> {
    headings: Vec<Heading<'a>>,
    /// Element address → position. Nodes don't move while the `Html` is borrowed.
    positions: HashMap<*const Element, usize>,
}

impl<'a> HeadingIndex<'a> {
    pub fn build(document: &'a Html) -> Self {
        let headings: Vec<Heading<'a>> = document
            .select(&HEADING_SELECTOR)
            .filter_map(|element| Some((element, heading_level(element.value().name())?)))
            .enumerate()
            .map(|(position, (element, level))| Heading {
                element,
                level,
                position,
            })
            .collect();
        let positions = headings
            .iter()
            .map(|h| (h.element.value() as *const Element, h.position))
            .collect();
        Self {
            headings,
            positions,
        }
    }

    pub fn get(&self, element: ElementRef<'a>) -> Option<Heading<'a>> {
        let position = *self.positions.get(&(element.value() as *const Element))?;
        Some(self.headings[position])
    }

    /// Headings strictly before `heading`, nearest first.
    pub fn preceding(&self, heading: &Heading<'a>) -> impl Iterator<Item = Heading<'a>> + '_ {
        self.headings[..heading.position].iter().rev().copied()
    }
}

/// Decides whether a heading's parent is a layout container
/// ("section-like" by tag name or by marker class).
#[derive(Debug, Clone)]
pub struct StructuralMarker {
    pub tags: Vec<String>,
    pub classes: Vec<String>,
}

impl Default for StructuralMarker {
    fn default() -> Self {
        Self {
            tags: vec!["section".to_string()],
            classes: vec!["block-richtext".to_string()],
        }
    }
}

impl StructuralMarker {
    pub fn matches(&self, parent: Option<ElementRef<'_>>) -> bool {
        let Some(parent) = parent else {
            return false;
        };
        let element = parent.value();

        if self.tags.iter().any(|t| element.name().eq_ignore_ascii_case(t)) {
            return true;
        }

        // No class attribute means no marker.
        element
            .attr("class")
            .map(|value| {
                value
                    .split_ascii_whitespace()
                    .any(|class| self.classes.iter().any(|c| c == class))
            })
            .unwrap_or(false)
    }
}

/// Walk backward from `start` to the nearest heading whose parent is
/// structural. `None` once the start of the document is reached.
pub fn resolve_structural<'a>(
    index: &HeadingIndex<'a>,
    start: &Heading<'a>,
    marker: &StructuralMarker,
) -> Option<Heading<'a>> {
    index
        .preceding(start)
        .find(|candidate| marker.matches(candidate.parent()))
}

// ── Tests ──
