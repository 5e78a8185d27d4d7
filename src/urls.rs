use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::ValueEnum;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// Header row plus a URL column
    Csv,
    /// One URL (or path) per line
    Lines,
}

impl InputFormat {
    /// `.csv` files are CSV, everything else is read line by line.
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Lines,
        }
    }
}

/// Prefix rewrite applied to every entry, written `FROM=TO` on the command
/// line. `www.=https://` turns `www.example.com/a` into `https://example.com/a`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRule {
    pub from: String,
    pub to: String,
}

impl FromStr for RewriteRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (from, to) = s
            .split_once('=')
            .ok_or_else(|| format!("expected FROM=TO, got {:?}", s))?;
        if from.is_empty() {
            return Err("rewrite prefix must not be empty".to_string());
        }
        Ok(Self {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

impl RewriteRule {
    pub fn apply(&self, entry: &str) -> Option<String> {
        entry
            .strip_prefix(self.from.as_str())
            .map(|rest| format!("{}{}", self.to, rest))
    }
}

pub fn default_rewrites() -> Vec<RewriteRule> {
    vec![RewriteRule {
        from: "www.".to_string(),
        to: "https://".to_string(),
    }]
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// `None` picks the format from the file extension.
    pub format: Option<InputFormat>,
    pub column: String,
    pub marker: Option<String>,
    pub rewrites: Vec<RewriteRule>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            format: None,
            column: "url".to_string(),
            marker: None,
            rewrites: default_rewrites(),
        }
    }
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{path} has no {column:?} column (found: {found})")]
    MissingColumn {
        path: PathBuf,
        column: String,
        found: String,
    },
    #[error("no line of {path} contains the marker {marker:?}")]
    MissingMarker { path: PathBuf, marker: String },
    #[error("line {line}: {value:?} is not an absolute http(s) URL")]
    InvalidUrl { line: usize, value: String },
    #[error("{path} lists no URLs")]
    Empty { path: PathBuf },
}

/// Read the URL list. Every entry is rewritten and validated before
/// anything is fetched; the first bad entry aborts the load.
pub fn load_urls(path: &Path, config: &SourceConfig) -> Result<Vec<String>, InputError> {
    let format = config.format.unwrap_or_else(|| InputFormat::detect(path));
    let entries = match format {
        InputFormat::Csv => read_csv(path, &config.column)?,
        InputFormat::Lines => read_lines(path, config.marker.as_deref())?,
    };
    debug!("{} raw entries in {}", entries.len(), path.display());

    let urls = entries
        .into_iter()
        .map(|(line, entry)| normalize(line, &entry, &config.rewrites))
        .collect::<Result<Vec<_>, _>>()?;

    if urls.is_empty() {
        return Err(InputError::Empty {
            path: path.to_path_buf(),
        });
    }

    info!("Loaded {} URLs from {} ({:?})", urls.len(), path.display(), format);
    Ok(urls)
}

/// (line number, raw entry) for every non-empty cell of the URL column.
fn read_csv(path: &Path, column: &str) -> Result<Vec<(usize, String)>, InputError> {
    let csv_err = |source| InputError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let headers = reader.headers().map_err(csv_err)?.clone();
    let idx = headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| InputError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
            found: headers.iter().collect::<Vec<_>>().join(", "),
        })?;

    let mut entries = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        // Header is line 1.
        let line = record.position().map(|p| p.line() as usize).unwrap_or(i + 2);
        match record.get(idx) {
            Some(cell) if !cell.is_empty() => entries.push((line, cell.to_string())),
            _ => {}
        }
    }
    Ok(entries)
}

fn read_lines(path: &Path, marker: Option<&str>) -> Result<Vec<(usize, String)>, InputError> {
    let text = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let entries: Vec<(usize, String)> = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .filter(|(_, line)| marker.map_or(true, |m| line.contains(m)))
        .map(|(n, line)| (n, line.to_string()))
        .collect();

    if let Some(marker) = marker {
        if entries.is_empty() {
            return Err(InputError::MissingMarker {
                path: path.to_path_buf(),
                marker: marker.to_string(),
            });
        }
    }
    Ok(entries)
}

/// Apply the first matching rewrite and require an absolute http(s) URL.
fn normalize(line: usize, entry: &str, rewrites: &[RewriteRule]) -> Result<String, InputError> {
    let entry = entry.trim();
    let rewritten = rewrites
        .iter()
        .find_map(|rule| rule.apply(entry))
        .unwrap_or_else(|| entry.to_string());

    match Url::parse(&rewritten) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(rewritten),
        _ => Err(InputError::InvalidUrl {
            line,
            value: rewritten,
        }),
    }
}

// ── Tests ──
