mod audit;
mod fetch;
mod pipeline;
mod report;
mod urls;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use audit::component::SizePolicy;
use audit::headings::StructuralMarker;
use audit::{AuditConfig, ComponentMatcher};
use fetch::HttpFetcher;
use report::Layout;
use urls::{InputFormat, RewriteRule, SourceConfig};

#[derive(Parser)]
#[command(
    name = "heading-audit",
    about = "Flag component headings that are larger than the section heading before them"
)]
struct Cli {
    /// File listing the pages to audit (CSV with a URL column, or one per line)
    url_file: PathBuf,
    /// Class name of the component containers to audit
    component: String,

    /// Also flag component headings the same size as their section heading
    #[arg(long)]
    strict: bool,
    /// Treat COMPONENT as a CSS selector instead of a class name
    #[arg(long)]
    css: bool,
    /// Element carrying the component class
    #[arg(long, default_value = "div")]
    container_tag: String,
    /// Parent tag that makes a heading structural (repeatable)
    #[arg(long = "structural-tag", default_value = "section")]
    structural_tags: Vec<String>,
    /// Parent class that makes a heading structural (repeatable)
    #[arg(long = "structural-class", default_value = "block-richtext")]
    structural_classes: Vec<String>,

    /// Input format (default: from the file extension)
    #[arg(long, value_enum)]
    format: Option<InputFormat>,
    /// CSV column holding the URLs
    #[arg(long, default_value = "url")]
    column: String,
    /// Only keep lines containing this text (line input)
    #[arg(long)]
    marker: Option<String>,
    /// Prefix rewrite FROM=TO applied to each entry (repeatable)
    #[arg(long = "rewrite", default_value = "www.=https://")]
    rewrites: Vec<RewriteRule>,
    /// Max pages to audit (default: all)
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    #[arg(long, value_enum, default_value_t = Layout::PerPage)]
    layout: Layout,
    /// Directory for the issue list
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
    /// Per-request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,
    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn audit_config(&self) -> anyhow::Result<AuditConfig> {
        let components = if self.css {
            ComponentMatcher::css(&self.component)?
        } else {
            ComponentMatcher::class(&self.container_tag, &self.component)?
        };
        Ok(AuditConfig {
            components,
            marker: StructuralMarker {
                tags: self.structural_tags.clone(),
                classes: self.structural_classes.clone(),
            },
            policy: SizePolicy {
                allow_equal_size: !self.strict,
            },
        })
    }

    fn source_config(&self) -> SourceConfig {
        SourceConfig {
            format: self.format,
            column: self.column.clone(),
            marker: self.marker.clone(),
            rewrites: self.rewrites.clone(),
        }
    }
}

fn progress_bar(len: usize, quiet: bool) -> anyhow::Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {wide_msg}")?
            .progress_chars("=> "),
    );
    Ok(pb)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    // Configuration and input problems abort before anything is fetched.
    let config = cli.audit_config()?;
    let mut urls = urls::load_urls(&cli.url_file, &cli.source_config())?;
    if let Some(limit) = cli.limit {
        urls.truncate(limit);
    }
    let fetcher = HttpFetcher::new(Duration::from_secs(cli.timeout_secs))
        .context("Failed to build HTTP client")?;

    println!("Auditing {} pages for {:?} components...", urls.len(), cli.component);
    let pb = progress_bar(urls.len(), cli.quiet)?;
    let report = pipeline::run_batch(&fetcher, &urls, &config, &pb).await;

    report::print_summary(&report);

    match report::write_if_processed(&report, &cli.output_dir, &cli.component, cli.layout)? {
        Some(path) => println!("Issue list: {}", path.display()),
        None => warn!("No page could be fetched; not writing an issue list"),
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_elapsed(elapsed));
    }
    Ok(())
}

/// `1.5s`, `2m 5s`, `1h 2m 5s`.
fn format_elapsed(d: Duration) -> String {
    let total = d.as_secs();
    let (h, m, s) = (total / 3600, total / 60 % 60, total % 60);
    match (h, m) {
        (0, 0) => format!("{:.1}s", d.as_secs_f64()),
        (0, _) => format!("{m}m {s}s"),
        _ => format!("{h}h {m}m {s}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["heading-audit", "pages.csv", "promo-card"]);
        assert_eq!(cli.structural_tags, vec!["section"]);
        assert_eq!(cli.structural_classes, vec!["block-richtext"]);
        assert_eq!(cli.rewrites, urls::default_rewrites());
        assert_eq!(cli.layout, Layout::PerPage);

        let config = cli.audit_config().unwrap();
        assert!(config.policy.allow_equal_size);
        assert!(matches!(config.components, ComponentMatcher::Class { .. }));
    }

    #[test]
    fn cli_overrides() {
        let cli = Cli::parse_from([
            "heading-audit",
            "pages.txt",
            "main .teaser",
            "--css",
            "--strict",
            "--structural-tag",
            "article",
            "--structural-tag",
            "section",
            "--rewrite",
            "/content/=https://example.com/",
            "--layout",
            "per-finding",
            "-n",
            "5",
        ]);
        assert_eq!(cli.structural_tags, vec!["article", "section"]);
        assert_eq!(cli.rewrites[0].from, "/content/");
        assert_eq!(cli.layout, Layout::PerFinding);
        assert_eq!(cli.limit, Some(5));

        let config = cli.audit_config().unwrap();
        assert!(!config.policy.allow_equal_size);
        assert!(matches!(config.components, ComponentMatcher::Css(_)));
    }

    #[test]
    fn bad_selector_fails_config() {
        let cli = Cli::parse_from(["heading-audit", "pages.csv", "div[", "--css"]);
        assert!(cli.audit_config().is_err());
    }

    #[test]
    fn elapsed_formatting() {
        assert_eq!(format_elapsed(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_elapsed(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_elapsed(Duration::from_secs(3600)), "1h 0m 0s");
        assert_eq!(format_elapsed(Duration::from_secs(3725)), "1h 2m 5s");
    }
}
