// src/export/mod.rs
//! CSV export: `<out>/<source>/<source>__<table id>.csv`, one folder per page.

use anyhow::{Context, Result};
use csv::{Terminator, WriterBuilder};
use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};
use tracing::{error, info, instrument};

use crate::names::sanitize_filename;
use crate::record::TableRecord;

#[derive(Debug, Default)]
pub struct ExportSummary {
    pub written: Vec<PathBuf>,
    /// Files that could not be written, with the reason.
    pub failures: Vec<(PathBuf, String)>,
    /// The one folder everything went to, or the export root when several
    /// folders were used.
    pub open_folder: PathBuf,
}

/// Where `record` lands under `out_dir`.
pub fn export_path(out_dir: &Path, record: &TableRecord) -> PathBuf {
    let stem = sanitize_filename(&record.source_stem());
    let file = format!("{}__{}.csv", stem, sanitize_filename(record.table_id()));
    out_dir.join(&stem).join(file)
}

/// Write one record as UTF-8 CSV: header line, then one line per row.
pub fn write_csv(path: &Path, record: &TableRecord) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_path(path)
        .with_context(|| format!("creating {:?}", path))?;
    wtr.write_record(record.columns())
        .with_context(|| format!("writing header to {:?}", path))?;
    for row in record.rows() {
        wtr.write_record(row)
            .with_context(|| format!("writing row to {:?}", path))?;
    }
    wtr.flush().with_context(|| format!("flushing {:?}", path))?;
    Ok(())
}

/// Export every record. A failed file is recorded and the rest still go out;
/// only an unusable export root is an error.
#[instrument(level = "info", skip(out_dir, records), fields(out = %out_dir.as_ref().display(), count = records.len()))]
pub fn export_records(out_dir: impl AsRef<Path>, records: &[TableRecord]) -> Result<ExportSummary> {
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir).with_context(|| format!("creating {:?}", out_dir))?;

    let mut summary = ExportSummary::default();
    let mut folders = BTreeSet::new();

    for record in records {
        let path = export_path(out_dir, record);
        if let Some(parent) = path.parent() {
            folders.insert(parent.to_path_buf());
        }
        match write_csv(&path, record) {
            Ok(()) => summary.written.push(path),
            Err(e) => {
                error!(file = %path.display(), error = %format!("{:#}", e), "failed to save");
                summary.failures.push((path, format!("{:#}", e)));
            }
        }
    }

    summary.open_folder = match folders.len() {
        1 => folders.into_iter().next().unwrap_or_else(|| out_dir.to_path_buf()),
        _ => out_dir.to_path_buf(),
    };
    info!(
        written = summary.written.len(),
        failed = summary.failures.len(),
        folder = %summary.open_folder.display(),
        "export done"
    );
    Ok(summary)
}
