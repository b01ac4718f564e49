// src/flatten/mod.rs
//! Turns a [`RawTable`]'s one- or many-tier header into a flat list of
//! unique, non-empty column names and squares the rows up to it.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::trace;

use crate::locate::RawTable;

/// Name given to a column with nothing to call it.
pub const FALLBACK_COLUMN: &str = "col";

/// Default placeholder prefix, the `Unnamed: ...` labels other table readers
/// write for blank header cells.
pub const PLACEHOLDER_PREFIX: &str = "Unnamed";

/// Decides which header labels in the source are filler for a blank cell.
/// A label is a placeholder if it starts with any of `prefixes`. Cells that
/// are actually blank never need a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderRule {
    pub prefixes: Vec<String>,
}

impl Default for PlaceholderRule {
    fn default() -> Self {
        Self {
            prefixes: vec![PLACEHOLDER_PREFIX.to_string()],
        }
    }
}

impl PlaceholderRule {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_placeholder(&self, label: &str) -> bool {
        self.prefixes
            .iter()
            .any(|p| !p.is_empty() && label.starts_with(p.as_str()))
    }
}

/// Flatten with the default placeholder rule.
pub fn flatten(raw: &RawTable) -> (Vec<String>, Vec<Vec<String>>) {
    flatten_with(raw, &PlaceholderRule::default())
}

pub fn flatten_with(raw: &RawTable, rule: &PlaceholderRule) -> (Vec<String>, Vec<Vec<String>>) {
    let width = raw.width();

    let names: Vec<String> = match raw.header.len() {
        0 => vec![FALLBACK_COLUMN.to_string(); width],
        1 => (0..width)
            .map(|c| {
                let label = raw.header[0].get(c).map(|s| s.trim()).unwrap_or("");
                if label.is_empty() || rule.is_placeholder(label) {
                    FALLBACK_COLUMN.to_string()
                } else {
                    label.to_string()
                }
            })
            .collect(),
        _ => (0..width)
            .map(|c| {
                let parts: Vec<&str> = raw
                    .header
                    .iter()
                    .filter_map(|tier| tier.get(c))
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty() && !rule.is_placeholder(s))
                    .collect();
                if parts.is_empty() {
                    FALLBACK_COLUMN.to_string()
                } else {
                    parts.join("_")
                }
            })
            .collect(),
    };

    let columns = dedup_names(names);
    let rows = raw
        .rows
        .iter()
        .map(|row| {
            let mut out = row.clone();
            out.resize(width, String::new());
            out
        })
        .collect();

    trace!(id = %raw.id, ?columns, "flattened header");
    (columns, rows)
}

/// First occurrence keeps its name, later ones get `_1`, `_2`, ... per base
/// name. A suffixed name that is already taken moves on to the next number.
pub fn dedup_names(names: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(names.len());
    let mut collisions: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(names.len());

    for name in names {
        if taken.insert(name.clone()) {
            out.push(name);
            continue;
        }
        let counter = collisions.entry(name.clone()).or_insert(0);
        let unique = loop {
            *counter += 1;
            let candidate = format!("{}_{}", name, counter);
            if !taken.contains(&candidate) {
                break candidate;
            }
        };
        taken.insert(unique.clone());
        out.push(unique);
    }
    out
}
