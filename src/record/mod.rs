// src/record/mod.rs
//! Reading a saved page and packaging its tables as [`TableRecord`]s.

use scraper::Html;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

use crate::error::ExtractionError;
use crate::flatten::{dedup_names, flatten_with, PlaceholderRule, FALLBACK_COLUMN};
use crate::locate::{self, RawTable};

/// How many leading bytes are checked for binary content.
const SNIFF_LEN: usize = 8 * 1024;

/// Knobs for a single extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    pub placeholder: PlaceholderRule,
    /// Reject invalid UTF-8 instead of replacing the bad bytes.
    pub strict_utf8: bool,
}

/// A parsed page and where it came from.
pub struct SourceDocument {
    path: PathBuf,
    doc: Html,
    title: Option<String>,
}

impl SourceDocument {
    /// Read and parse `path`. Only I/O, decoding and binary-content problems
    /// are errors; broken markup is left to the parser.
    pub fn load(path: &Path, strict_utf8: bool) -> Result<Self, ExtractionError> {
        let bytes = fs::read(path).map_err(|source| ExtractionError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        if bytes[..bytes.len().min(SNIFF_LEN)].contains(&0) {
            return Err(ExtractionError::NotHtml {
                path: path.to_path_buf(),
            });
        }

        let text = if strict_utf8 {
            std::str::from_utf8(&bytes)
                .map_err(|source| ExtractionError::Encoding {
                    path: path.to_path_buf(),
                    source,
                })?
                .to_string()
        } else {
            String::from_utf8_lossy(&bytes).into_owned()
        };

        Ok(Self::parse(path, &text))
    }

    /// Parse markup that is already in memory.
    pub fn parse(path: &Path, html: &str) -> Self {
        let doc = Html::parse_document(html);
        let title = locate::page_title(&doc);
        Self {
            path: path.to_path_buf(),
            doc,
            title,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn tables(&self) -> Vec<RawTable> {
        locate::locate_in_document(&self.doc)
    }
}

/// One extracted table with its provenance. Immutable once built: `columns`
/// are unique and non-empty, and every row is exactly as wide as `columns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRecord {
    source_file: PathBuf,
    table_id: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    page_title: Option<String>,
}

impl TableRecord {
    /// Build a record, repairing anything that would break its invariants:
    /// blank names become `col`, duplicates are numbered, and the column set
    /// is widened to the widest row before short rows are padded.
    pub fn new(
        source_file: impl Into<PathBuf>,
        table_id: impl Into<String>,
        columns: Vec<String>,
        mut rows: Vec<Vec<String>>,
        page_title: Option<String>,
    ) -> Self {
        let width = rows
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(columns.len());

        let mut names: Vec<String> = columns
            .into_iter()
            .map(|c| {
                let c = c.trim();
                if c.is_empty() {
                    FALLBACK_COLUMN.to_string()
                } else {
                    c.to_string()
                }
            })
            .collect();
        names.resize(width, FALLBACK_COLUMN.to_string());

        for row in &mut rows {
            row.resize(width, String::new());
        }

        Self {
            source_file: source_file.into(),
            table_id: table_id.into(),
            columns: dedup_names(names),
            rows,
            page_title,
        }
    }

    /// Flatten `raw` and attach the provenance of `source`.
    pub fn from_raw(source: &SourceDocument, raw: &RawTable, rule: &PlaceholderRule) -> Self {
        let (columns, rows) = flatten_with(raw, rule);
        Self::new(
            source.path(),
            raw.id.clone(),
            columns,
            rows,
            source.title.clone(),
        )
    }

    pub fn source_file(&self) -> &Path {
        &self.source_file
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn page_title(&self) -> Option<&str> {
        self.page_title.as_deref()
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    /// Stem of the source file name.
    pub fn source_stem(&self) -> String {
        crate::names::file_stem(&self.source_file)
    }
}

/// Extract every table of the page at `document_path` with default options.
pub fn extract(document_path: impl AsRef<Path>) -> Result<Vec<TableRecord>, ExtractionError> {
    extract_with(document_path, &ExtractOptions::default())
}

/// Extract every table of the page at `document_path`. A page with no usable
/// tables gives an empty list, not an error.
#[instrument(level = "info", skip(document_path, opts), fields(path = %document_path.as_ref().display()))]
pub fn extract_with(
    document_path: impl AsRef<Path>,
    opts: &ExtractOptions,
) -> Result<Vec<TableRecord>, ExtractionError> {
    let path = document_path.as_ref();
    let source = SourceDocument::load(path, opts.strict_utf8).map_err(|e| {
        warn!(error = %e, "could not read document");
        e
    })?;

    let records: Vec<TableRecord> = source
        .tables()
        .iter()
        .map(|raw| TableRecord::from_raw(&source, raw, &opts.placeholder))
        .collect();

    if records.is_empty() {
        info!("no tables found");
    } else {
        debug!(
            tables = records.len(),
            title = source.title().unwrap_or_default(),
            "extracted"
        );
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::init_test_logging;
    use anyhow::Result;
    use std::collections::HashSet;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Florian Wirtz Stats, Goals, Records and Goals | FBref.com</title></head>
<body>
<table id="last5">
  <thead><tr><th>Date</th><th>Opponent</th><th>Result</th><th>Opponent</th></tr></thead>
  <tbody>
    <tr><th>2025-05-10</th><td>Dortmund</td><td>W 2-1</td></tr>
    <tr><th>2025-05-17</th><td>Mainz</td><td>D 1-1</td><td>extra</td><td>overflow</td></tr>
  </tbody>
</table>
<div class="placeholder"><!--
<table id="stats_standard_dom_lg">
  <thead>
    <tr><th></th><th></th><th colspan="2">Performance</th></tr>
    <tr><th>Season</th><th>Squad</th><th>Gls</th><th>Ast</th></tr>
  </thead>
  <tbody>
    <tr><th>2023-2024</th><td>Leverkusen</td><td>11</td><td>11</td></tr>
  </tbody>
</table>
--></div>
<table id="stats_broken"><caption>cut off
"#;

    fn write_page(contents: &[u8]) -> Result<NamedTempFile> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(contents)?;
        Ok(tmp)
    }

    #[test]
    fn extracts_dom_and_comment_tables() -> Result<()> {
        init_test_logging();
        let tmp = write_page(PAGE.as_bytes())?;
        let records = extract(tmp.path())?;

        let ids: Vec<_> = records.iter().map(|r| r.table_id()).collect();
        assert_eq!(ids, vec!["last5", "stats_standard_dom_lg"]);

        let hidden = &records[1];
        assert_eq!(
            hidden.columns(),
            ["Season", "Squad", "Performance_Gls", "Performance_Ast"]
        );
        assert_eq!(hidden.rows(), [vec!["2023-2024", "Leverkusen", "11", "11"]]);
        assert_eq!(
            hidden.page_title(),
            Some("Florian Wirtz Stats, Goals, Records and Goals | FBref.com")
        );
        assert_eq!(hidden.source_file(), tmp.path());
        Ok(())
    }

    #[test]
    fn records_are_rectangular_with_unique_columns() -> Result<()> {
        let tmp = write_page(PAGE.as_bytes())?;
        for rec in extract(tmp.path())? {
            let width = rec.columns().len();
            assert!(rec.rows().iter().all(|r| r.len() == width), "{:?}", rec);
            let unique: HashSet<_> = rec.columns().iter().collect();
            assert_eq!(unique.len(), width);
            assert!(rec.columns().iter().all(|c| !c.is_empty()));
        }

        let last5 = &extract(tmp.path())?[0];
        assert_eq!(
            last5.columns(),
            ["Date", "Opponent", "Result", "Opponent_1", "col"]
        );
        assert_eq!(last5.rows()[0], vec!["2025-05-10", "Dortmund", "W 2-1", "", ""]);
        assert_eq!(last5.shape(), (2, 5));
        Ok(())
    }

    #[test]
    fn extraction_is_idempotent() -> Result<()> {
        let tmp = write_page(PAGE.as_bytes())?;
        let first = extract(tmp.path())?;
        let second = extract(tmp.path())?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn table_only_in_comment_gives_one_record() -> Result<()> {
        let html = r#"<html><body><div id="all_stats_standard"><!--
            <table id="stats_standard_dom_lg"><thead><tr><th>Season</th><th>MP</th></tr></thead>
            <tbody><tr><th>2024</th><td>30</td></tr></tbody></table>
        --></div></body></html>"#;
        let tmp = write_page(html.as_bytes())?;
        let records = extract(tmp.path())?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].table_id(), "stats_standard_dom_lg");
        assert_eq!(records[0].columns(), ["Season", "MP"]);
        Ok(())
    }

    #[test]
    fn malformed_table_is_skipped_without_error() -> Result<()> {
        let html = r#"<table id="ok"><tr><th>A</th></tr><tr><td>1</td></tr></table>
            <table id="bad"><caption>oops"#;
        let tmp = write_page(html.as_bytes())?;
        let records = extract(tmp.path())?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].table_id(), "ok");
        Ok(())
    }

    #[test]
    fn page_without_tables_is_empty_not_an_error() -> Result<()> {
        let tmp = write_page(b"<html><body><p>nothing here</p></body></html>")?;
        assert!(extract(tmp.path())?.is_empty());
        Ok(())
    }

    #[test]
    fn header_only_table_keeps_columns() -> Result<()> {
        let tmp = write_page(br#"<table id="empty"><thead><tr><th>A</th><th>B</th></tr></thead></table>"#)?;
        let records = extract(tmp.path())?;
        assert_eq!(records[0].columns(), ["A", "B"]);
        assert!(records[0].rows().is_empty());
        Ok(())
    }

    #[test]
    fn missing_file_is_a_read_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("gone.html");
        let err = extract(&path).unwrap_err();
        assert!(matches!(err, ExtractionError::Read { .. }));
        assert_eq!(err.path(), path);
        assert_eq!(err.file_name(), "gone.html");
        Ok(())
    }

    #[test]
    fn binary_content_is_rejected() -> Result<()> {
        let tmp = write_page(&[0x89, b'P', b'N', b'G', 0, 0, 0, 13])?;
        assert!(matches!(
            extract(tmp.path()).unwrap_err(),
            ExtractionError::NotHtml { .. }
        ));
        Ok(())
    }

    #[test]
    fn invalid_utf8_is_lossy_unless_strict() -> Result<()> {
        let mut bytes = br#"<table id="t"><tr><th>Caf"#.to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b"</th></tr><tr><td>1</td></tr></table>");
        let tmp = write_page(&bytes)?;

        let records = extract(tmp.path())?;
        assert_eq!(records[0].columns(), ["Caf\u{FFFD}"]);

        let strict = ExtractOptions {
            strict_utf8: true,
            ..ExtractOptions::default()
        };
        assert!(matches!(
            extract_with(tmp.path(), &strict).unwrap_err(),
            ExtractionError::Encoding { .. }
        ));
        Ok(())
    }

    #[test]
    fn custom_placeholder_rule_still_drops_blank_header_cells() -> Result<()> {
        let tmp = write_page(
            br#"<table id="stats_shooting">
                <thead>
                  <tr><th></th><th colspan="2">Performance</th><th>Level 2</th></tr>
                  <tr><th>Season</th><th>Gls</th><th>Ast</th><th></th></tr>
                </thead>
                <tbody><tr><td>2024</td><td>10</td><td>7</td><td>x</td></tr></tbody>
              </table>"#,
        )?;
        let opts = ExtractOptions {
            placeholder: PlaceholderRule::new(["Level"]),
            ..ExtractOptions::default()
        };
        let records = extract_with(tmp.path(), &opts)?;
        assert_eq!(
            records[0].columns(),
            ["Season", "Performance_Gls", "Performance_Ast", "col"]
        );

        let records = extract(tmp.path())?;
        assert_eq!(
            records[0].columns(),
            ["Season", "Performance_Gls", "Performance_Ast", "Level 2"]
        );
        Ok(())
    }

    #[test]
    fn new_repairs_invariants() {
        let rec = TableRecord::new(
            "a.html",
            "t",
            vec!["x".into(), "".into(), "x".into()],
            vec![vec!["1".into()], vec!["1".into(), "2".into(), "3".into(), "4".into()]],
            None,
        );
        assert_eq!(rec.columns(), ["x", "col", "x_1", "col_1"]);
        assert!(rec.rows().iter().all(|r| r.len() == 4));
    }
}
