use indicatif::ProgressBar;
use tracing::{info, warn};

use crate::audit::{audit_document, AuditConfig, Finding};
use crate::fetch::PageFetcher;
use crate::report::{BatchReport, FetchFailure};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Audited(Vec<Finding>),
    Failed(FetchFailure),
}

/// Fetch one page and audit its components. A failed fetch is returned,
/// never raised.
pub async fn process_page<F: PageFetcher>(
    fetcher: &F,
    url: &str,
    config: &AuditConfig,
) -> PageOutcome {
    let html = match fetcher.fetch(url).await {
        Ok(html) => html,
        Err(e) => {
            warn!("Fetch failed for {}: {}", url, e);
            return PageOutcome::Failed(FetchFailure {
                url: url.to_string(),
                reason: e.to_string(),
            });
        }
    };

    let findings = audit_document(&html, url, config);
    for f in &findings {
        info!(
            heading_level = f.level,
            structural_level = f.structural_level,
            "Incorrect sizing on {:?} ({})",
            f.heading,
            url
        );
    }
    PageOutcome::Audited(findings)
}

/// Process every URL in order, one page at a time.
pub async fn run_batch<F: PageFetcher>(
    fetcher: &F,
    urls: &[String],
    config: &AuditConfig,
    pb: &ProgressBar,
) -> BatchReport {
    let total = urls.len();
    let mut report = BatchReport::new(total);

    for (i, url) in urls.iter().enumerate() {
        pb.set_message(url.clone());
        info!("Scraping page {} of {}: {}", i + 1, total, url);

        match process_page(fetcher, url, config).await {
            PageOutcome::Audited(findings) => report.record_page(url, findings),
            PageOutcome::Failed(failure) => report.record_failure(failure),
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        "Audited {} pages ({} failed, {} with issues)",
        report.processed,
        report.failures.len(),
        report.pages_with_issues()
    );
    report
}

// ── Tests ──
