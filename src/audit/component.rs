use scraper::ElementRef;

use super::headings::{resolve_structural, HeadingIndex, HEADING_SELECTOR};
use super::{AuditConfig, Finding};

/// Size comparison between a component heading and its structural heading.
/// Lower levels are visually larger, so a component level below the
/// structural level means the component outranks the section it sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizePolicy {
    pub allow_equal_size: bool,
}

impl Default for SizePolicy {
    fn default() -> Self {
        Self {
            allow_equal_size: true,
        }
    }
}

impl SizePolicy {
    pub fn is_violation(&self, component_level: u8, structural_level: u8) -> bool {
        if self.allow_equal_size {
            component_level < structural_level
        } else {
            component_level <= structural_level
        }
    }
}

/// Audit one component container. `None` when it has no heading, when no
/// structural heading precedes it, or when its heading size is acceptable.
pub fn audit_component<'a>(
    container: ElementRef<'a>,
    url: &str,
    index: &HeadingIndex<'a>,
    config: &AuditConfig,
) -> Option<Finding> {
    let element = container.select(&HEADING_SELECTOR).next()?;
    let heading = index.get(element)?;
    let structural = resolve_structural(index, &heading, &config.marker)?;

    if !config.policy.is_violation(heading.level, structural.level) {
        return None;
    }

    Some(Finding {
        url: url.to_string(),
        heading: heading.text(),
        level: heading.level,
        structural_level: structural.level,
    })
}

// ── Tests ──
