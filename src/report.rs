use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use tracing::info;

use crate::audit::Finding;

/// A URL that could not be retrieved, with the reason shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub url: String,
    pub reason: String,
}

/// All findings of one page, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFindings {
    pub url: String,
    pub findings: Vec<Finding>,
}

/// Outcome of a whole batch. Pages appear in input order; a URL listed
/// twice is merged into its first entry.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub pages: Vec<PageFindings>,
    pub failures: Vec<FetchFailure>,
    /// Pages fetched and audited, with or without findings.
    pub processed: usize,
    pub total: usize,
    slots: HashMap<String, usize>,
}

impl BatchReport {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record_page(&mut self, url: &str, findings: Vec<Finding>) {
        self.processed += 1;
        if findings.is_empty() {
            return;
        }
        match self.slots.get(url) {
            Some(&slot) => self.pages[slot].findings.extend(findings),
            None => {
                self.slots.insert(url.to_string(), self.pages.len());
                self.pages.push(PageFindings {
                    url: url.to_string(),
                    findings,
                });
            }
        }
    }

    pub fn record_failure(&mut self, failure: FetchFailure) {
        self.failures.push(failure);
    }

    pub fn pages_with_issues(&self) -> usize {
        self.pages.len()
    }

    pub fn finding_count(&self) -> usize {
        self.pages.iter().map(|p| p.findings.len()).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Layout {
    /// One row per URL, heading texts joined with "; "
    #[default]
    PerPage,
    /// One row per finding
    PerFinding,
}

#[derive(Serialize)]
struct IssueRow<'a> {
    url: &'a str,
    headings: String,
}

const HEADING_SEPARATOR: &str = "; ";

/// `<dir>/<selector>_issue-list.csv`, with anything unsafe in a file name
/// replaced by `_`.
pub fn output_path(dir: &Path, selector: &str) -> PathBuf {
    let stem: String = selector
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    dir.join(format!("{}_issue-list.csv", stem))
}

/// Write findings as headerless CSV rows of (url, heading text).
pub fn write_report(report: &BatchReport, path: &Path, layout: Layout) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    for page in &report.pages {
        match layout {
            Layout::PerPage => {
                let headings = page
                    .findings
                    .iter()
                    .map(|f| f.heading.as_str())
                    .collect::<Vec<_>>()
                    .join(HEADING_SEPARATOR);
                writer.serialize(IssueRow {
                    url: &page.url,
                    headings,
                })?;
            }
            Layout::PerFinding => {
                for finding in &page.findings {
                    writer.serialize(IssueRow {
                        url: &page.url,
                        headings: finding.heading.clone(),
                    })?;
                }
            }
        }
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write the issue list to `<dir>/<selector>_issue-list.csv`, unless no
/// page was processed at all. A batch with processed pages but no findings
/// still gets an (empty) file.
pub fn write_if_processed(
    report: &BatchReport,
    dir: &Path,
    selector: &str,
    layout: Layout,
) -> Result<Option<PathBuf>> {
    if report.processed == 0 {
        return Ok(None);
    }
    let path = output_path(dir, selector);
    write_report(report, &path, layout)?;
    info!(
        "Wrote {} pages with issues to {}",
        report.pages_with_issues(),
        path.display()
    );
    Ok(Some(path))
}

pub fn print_summary(report: &BatchReport) {
    for failure in &report.failures {
        println!("Bad URL: {} ({})", failure.url, failure.reason);
    }
    println!(
        "Processed {} of {} pages ({} findings).",
        report.processed,
        report.total,
        report.finding_count()
    );
    println!("Pages with issues: {}", report.pages_with_issues());
}

// ── Tests ──
