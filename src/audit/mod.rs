pub mod component;
pub mod headings;

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use component::SizePolicy;
use headings::{HeadingIndex, StructuralMarker};

/// A component heading that outranks the structural heading before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub url: String,
    pub heading: String,
    pub level: u8,
    pub structural_level: u8,
}

#[derive(Debug, Error)]
#[error("invalid selector {selector:?}: {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub reason: String,
}

fn parse_selector(selector: &str) -> Result<Selector, SelectorError> {
    Selector::parse(selector).map_err(|e| SelectorError {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Which elements on a page are component containers.
#[derive(Debug, Clone)]
pub enum ComponentMatcher {
    /// Elements of one tag carrying a class, e.g. `div` + `hero-banner`.
    Class { tag: Selector, class: String },
    Css(Selector),
}

impl ComponentMatcher {
    pub fn class(tag: &str, class: &str) -> Result<Self, SelectorError> {
        Ok(Self::Class {
            tag: parse_selector(tag)?,
            class: class.to_string(),
        })
    }

    pub fn css(selector: &str) -> Result<Self, SelectorError> {
        Ok(Self::Css(parse_selector(selector)?))
    }

    pub fn select<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        match self {
            Self::Class { tag, class } => document
                .select(tag)
                .filter(|el| {
                    el.value()
                        .attr("class")
                        .is_some_and(|v| v.split_ascii_whitespace().any(|c| c == class))
                })
                .collect(),
            Self::Css(selector) => document.select(selector).collect(),
        }
    }
}

/// Everything one audit needs. Built once from the command line and shared
/// read-only by every page.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub components: ComponentMatcher,
    pub marker: StructuralMarker,
    pub policy: SizePolicy,
}

impl AuditConfig {
    pub fn new(components: ComponentMatcher) -> Self {
        Self {
            components,
            marker: StructuralMarker::default(),
            policy: SizePolicy::default(),
        }
    }
}

/// Parse a page and audit every component container on it, in document order.
pub fn audit_document(html: &str, url: &str, config: &AuditConfig) -> Vec<Finding> {
    let document = Html::parse_document(html);
    let index = HeadingIndex::build(&document);

    config
        .components
        .select(&document)
        .into_iter()
        .filter_map(|container| component::audit_component(container, url, &index, config))
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    fn config_for(class: &str) -> AuditConfig {
        AuditConfig::new(ComponentMatcher::class("div", class).unwrap())
    }

    #[test]
    fn landing_page_findings_in_order() {
        let html = fixture("landing");
        let findings = audit_document(&html, "https://example.com/", &config_for("promo-card"));
        let titles: Vec<&str> = findings.iter().map(|f| f.heading.as_str()).collect();
        assert_eq!(titles, vec!["Save 20% today", "Members only"]);
        assert!(findings.iter().all(|f| f.url == "https://example.com/"));
        assert_eq!(findings[0].level, 2);
        assert_eq!(findings[0].structural_level, 3);
    }

    #[test]
    fn landing_page_strict_adds_equal_sizes() {
        let html = fixture("landing");
        let config = AuditConfig {
            policy: SizePolicy {
                allow_equal_size: false,
            },
            ..config_for("promo-card")
        };
        let titles: Vec<String> = audit_document(&html, "https://example.com/", &config)
            .into_iter()
            .map(|f| f.heading)
            .collect();
        assert_eq!(titles, vec!["Save 20% today", "Same size", "Members only"]);
    }

    #[test]
    fn unstructured_page_has_no_findings() {
        let html = fixture("unstructured");
        assert!(audit_document(&html, "https://example.com/", &config_for("promo-card")).is_empty());
    }

    #[test]
    fn class_matching_is_exact_token() {
        let html = "<section><h4>s</h4></section>\
                    <div class=\"promo-card-wide\"><h1>not a component</h1></div>\
                    <div class=\"x promo-card\"><h1>component</h1></div>\
                    <span class=\"promo-card\"><h1>wrong tag</h1></span>";
        let findings = audit_document(html, "u", &config_for("promo-card"));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].heading, "component");
    }

    #[test]
    fn css_matcher() {
        let html = "<section><h4>s</h4></section>\
                    <aside data-kind=\"promo\"><h2>aside</h2></aside>\
                    <div class=\"promo-card\"><h2>div</h2></div>";
        let config = AuditConfig::new(ComponentMatcher::css("aside[data-kind=promo]").unwrap());
        let findings = audit_document(html, "u", &config);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].heading, "aside");
    }

    #[test]
    fn invalid_css_selector() {
        let err = ComponentMatcher::css("div[").unwrap_err();
        assert_eq!(err.selector, "div[");
    }

    #[test]
    fn auditing_is_repeatable() {
        let html = fixture("landing");
        let config = config_for("promo-card");
        let first = audit_document(&html, "https://example.com/", &config);
        let second = audit_document(&html, "https://example.com/", &config);
        assert_eq!(first, second);
    }
}
