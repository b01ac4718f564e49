// src/locate/mod.rs
//! Finds `table[id]` elements in a page, including the ones the site hides
//! inside HTML comments, and reads each into a [`RawTable`].

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::names::collapse_ws;

/// Identifier used when a table's `id` attribute is present but blank.
pub const FALLBACK_TABLE_ID: &str = "table";

/// Upper bound for `colspan` / `rowspan` values.
const MAX_SPAN: usize = 1_000;

static TABLE_WITH_ID: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table[id]").expect("table[id] selector should parse"));
static TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("title selector should parse"));

/// Where in the page a table was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableOrigin {
    Document,
    Comment,
}

/// A table as read from the markup, before its header is flattened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    /// The element's `id` attribute.
    pub id: String,
    /// Header tiers, top tier first. Spanning cells are already expanded, so
    /// each tier has one label per column it covers.
    pub header: Vec<Vec<String>>,
    /// Body rows, spans expanded.
    pub rows: Vec<Vec<String>>,
    pub origin: TableOrigin,
}

impl RawTable {
    /// Number of columns: the widest header tier or body row.
    pub fn width(&self) -> usize {
        self.header
            .iter()
            .chain(self.rows.iter())
            .map(Vec::len)
            .max()
            .unwrap_or(0)
    }
}

/// Trimmed text of the page's `<title>`, if it has a non-blank one.
pub fn page_title(doc: &Html) -> Option<String> {
    doc.select(&TITLE)
        .next()
        .map(|t| collapse_ws(&t.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

/// Parse `html` and locate its tables. See [`locate_in_document`].
pub fn locate_tables(html: &str) -> Vec<RawTable> {
    locate_in_document(&Html::parse_document(html))
}

/// Every usable `table[id]` of the parsed page: first the ones in the visible
/// tree in document order, then the ones inside comments in comment order.
#[instrument(level = "debug", skip(doc))]
pub fn locate_in_document(doc: &Html) -> Vec<RawTable> {
    let mut tables = tables_in(doc, TableOrigin::Document);
    let dom_count = tables.len();

    for text in comments_with_tables(doc) {
        let fragment = Html::parse_document(&text);
        tables.extend(tables_in(&fragment, TableOrigin::Comment));
    }

    debug!(
        dom = dom_count,
        comment = tables.len() - dom_count,
        "located tables"
    );
    tables
}

/// Text of every comment node that contains a table opening tag, tree order.
fn comments_with_tables(doc: &Html) -> Vec<String> {
    doc.tree
        .root()
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Comment(c) => Some(&*c.comment),
            _ => None,
        })
        .filter(|text| text.to_ascii_lowercase().contains("<table"))
        .map(str::to_string)
        .collect()
}

fn tables_in(doc: &Html, origin: TableOrigin) -> Vec<RawTable> {
    doc.select(&TABLE_WITH_ID)
        .filter_map(|el| {
            let table = parse_table(el, origin);
            if table.is_none() {
                debug!(
                    id = el.value().attr("id").unwrap_or_default(),
                    ?origin,
                    "skipping table without usable structure"
                );
            }
            table
        })
        .collect()
}

/// Read one table element. `None` when it has no cells at all.
pub fn parse_table(table: ElementRef<'_>, origin: TableOrigin) -> Option<RawTable> {
    let id = match table.value().attr("id").map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => FALLBACK_TABLE_ID.to_string(),
    };

    let mut head: Vec<Vec<Cell>> = Vec::new();
    let mut body: Vec<Vec<Cell>> = Vec::new();
    let mut foot: Vec<Vec<Cell>> = Vec::new();
    let mut has_thead = false;

    for section in table.children().filter_map(ElementRef::wrap) {
        match section.value().name() {
            "thead" => {
                has_thead = true;
                head.extend(child_rows(section).map(read_row));
            }
            "tbody" => body.extend(child_rows(section).map(read_row)),
            "tfoot" => foot.extend(child_rows(section).map(read_row)),
            "tr" => body.push(read_row(section)),
            _ => {}
        }
    }

    // Without a thead, leading rows made only of <th> are the header.
    if !has_thead {
        let n = body
            .iter()
            .take_while(|row| !row.is_empty() && row.iter().all(|c| c.is_header))
            .count();
        head = body.drain(..n).collect();
    }
    body.extend(foot);

    let header = pad_tiers(expand_spans(head));
    let rows = expand_spans(body);

    let raw = RawTable {
        id,
        header,
        rows,
        origin,
    };
    let width = raw.width();
    if width == 0 {
        return None;
    }
    trace!(
        id = %raw.id,
        tiers = raw.header.len(),
        rows = raw.rows.len(),
        width,
        "parsed table"
    );
    Some(raw)
}

struct Cell {
    text: String,
    is_header: bool,
    colspan: usize,
    rowspan: usize,
}

fn child_rows<'a>(section: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    section
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "tr")
}

fn read_row(tr: ElementRef<'_>) -> Vec<Cell> {
    tr.children()
        .filter_map(ElementRef::wrap)
        .filter_map(|cell| {
            let is_header = match cell.value().name() {
                "th" => true,
                "td" => false,
                _ => return None,
            };
            Some(Cell {
                text: collapse_ws(&cell.text().collect::<String>()),
                is_header,
                colspan: span(cell, "colspan"),
                rowspan: span(cell, "rowspan"),
            })
        })
        .collect()
}

fn span(cell: ElementRef<'_>, attr: &str) -> usize {
    cell.value()
        .attr(attr)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1)
        .min(MAX_SPAN)
}

/// Lay cells out on a grid, copying spanning cells into every slot they
/// cover. Rows that end up empty are dropped.
fn expand_spans(rows: Vec<Vec<Cell>>) -> Vec<Vec<String>> {
    // Per column: text carried down by a rowspan and how many rows it still covers.
    let mut pending: Vec<Option<(String, usize)>> = Vec::new();
    let mut grid = Vec::with_capacity(rows.len());

    for row in rows {
        let mut out: Vec<String> = Vec::new();
        let mut cells = row.into_iter();
        loop {
            take_carried(&mut pending, &mut out);
            match cells.next() {
                Some(cell) => {
                    for _ in 0..cell.colspan {
                        take_carried(&mut pending, &mut out);
                        let col = out.len();
                        if pending.len() <= col {
                            pending.resize(col + 1, None);
                        }
                        pending[col] = (cell.rowspan > 1)
                            .then(|| (cell.text.clone(), cell.rowspan - 1));
                        out.push(cell.text.clone());
                    }
                }
                None => {
                    let more_pending = pending
                        .get(out.len()..)
                        .map_or(false, |rest| rest.iter().any(Option::is_some));
                    if !more_pending {
                        break;
                    }
                    out.push(String::new());
                }
            }
        }
        if !out.is_empty() {
            grid.push(out);
        }
    }
    grid
}

/// Push text carried down by earlier rowspans until `out` reaches a free column.
fn take_carried(pending: &mut [Option<(String, usize)>], out: &mut Vec<String>) {
    while let Some(slot) = pending.get_mut(out.len()) {
        let Some((text, left)) = slot.take() else {
            break;
        };
        if left > 1 {
            *slot = Some((text.clone(), left - 1));
        }
        out.push(text);
    }
}

/// Pad every header tier to the same width. Blank cells stay blank.
fn pad_tiers(mut tiers: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let width = tiers.iter().map(Vec::len).max().unwrap_or(0);
    for tier in &mut tiers {
        tier.resize(width, String::new());
    }
    tiers
}
