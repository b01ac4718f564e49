// src/batch/mod.rs
//! Running extraction over many selected pages. One unreadable page never
//! costs the records of the others.

use anyhow::{Context, Result};
use glob::{glob, Pattern};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info};

use crate::error::ExtractionError;
use crate::record::{extract_with, ExtractOptions, TableRecord};

/// Outcome of a batch: all records in input order, plus one failure per
/// document that could not be read.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub records: Vec<TableRecord>,
    pub failures: Vec<ExtractionError>,
    /// Documents that were read successfully, with or without tables.
    pub documents_ok: usize,
}

impl BatchReport {
    fn push(&mut self, outcome: Result<Vec<TableRecord>, ExtractionError>) {
        match outcome {
            Ok(records) => {
                self.documents_ok += 1;
                self.records.extend(records);
            }
            Err(e) => {
                error!(file = %e.file_name(), error = %e, "failed to parse");
                self.failures.push(e);
            }
        }
    }
}

/// Extract each document in turn.
pub fn extract_all<P: AsRef<Path>>(paths: &[P], opts: &ExtractOptions) -> BatchReport {
    let start = Instant::now();
    let mut report = BatchReport::default();
    for path in paths {
        report.push(extract_with(path, opts));
    }
    info!(
        records = report.records.len(),
        documents = report.documents_ok,
        failures = report.failures.len(),
        elapsed = ?start.elapsed(),
        "batch done"
    );
    report
}

/// Same as [`extract_all`] but spreads documents over the rayon pool.
/// Results keep input order.
pub fn extract_all_parallel<P>(paths: &[P], opts: &ExtractOptions) -> BatchReport
where
    P: AsRef<Path> + Sync,
{
    let start = Instant::now();
    let outcomes: Vec<_> = paths
        .par_iter()
        .map(|path| extract_with(path, opts))
        .collect();

    let mut report = BatchReport::default();
    for outcome in outcomes {
        report.push(outcome);
    }
    info!(
        records = report.records.len(),
        documents = report.documents_ok,
        failures = report.failures.len(),
        elapsed = ?start.elapsed(),
        "parallel batch done"
    );
    report
}

/// `*.html` / `*.htm` files directly inside `dir`, sorted by path.
pub fn discover_html_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let pattern = format!("{}/*", Pattern::escape(&dir.to_string_lossy()));
    let mut files: Vec<PathBuf> = glob(&pattern)
        .with_context(|| format!("listing {:?}", dir))?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file() && is_html(p))
        .collect();
    files.sort();
    Ok(files)
}

/// Expand folders in `inputs` to the HTML files they hold; files pass through.
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for input in inputs {
        if input.is_dir() {
            out.extend(discover_html_files(input)?);
        } else {
            out.push(input.clone());
        }
    }
    Ok(out)
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map_or(false, |ext| {
            ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm")
        })
}
