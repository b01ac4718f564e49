// src/label/mod.rs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::names::subject_name;
use crate::record::TableRecord;

/// Short names for the well-known FBref table ids.
pub const FRIENDLY_NAMES: &[(&str, &str)] = &[
    ("stats_standard_dom_lg", "Standard"),
    ("stats_shooting_dom_lg", "Shooting"),
    ("stats_passing_dom_lg", "Passing"),
    ("stats_passing_types_dom_lg", "Pass Types"),
    ("stats_gca_dom_lg", "Goal & Shot Creation"),
    ("stats_possession_dom_lg", "Possession"),
    ("stats_misc_dom_lg", "Misc"),
];

static DOMESTIC_LEAGUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Domestic League").expect("domestic league regex"));
static LAST_N: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)last[_\s-]?(\d+)").expect("last n regex"));

pub fn friendly_name(table_id: &str) -> Option<&'static str> {
    FRIENDLY_NAMES
        .iter()
        .find(|(id, _)| *id == table_id)
        .map(|(_, name)| *name)
}

/// `Florian Wirtz – Shooting`, or `Florian Wirtz Last 5 matches (domestic league)`
/// when the page is a "last N matches" log.
pub fn label_for(record: &TableRecord) -> String {
    let stem = record.source_stem();
    let subject = subject_name(&stem);
    let haystack = format!("{} {}", record.page_title().unwrap_or_default(), stem);

    if let Some(caps) = LAST_N.captures(&haystack) {
        let suffix = if DOMESTIC_LEAGUE.is_match(&haystack) {
            " (domestic league)"
        } else {
            ""
        };
        return format!("{} Last {} matches{}", subject, &caps[1], suffix);
    }

    let friendly = friendly_name(record.table_id()).unwrap_or(record.table_id());
    format!("{} \u{2013} {}", subject, friendly)
}

/// Label plus shape, as shown in table lists: `Florian Wirtz – Standard :: 12x31`.
pub fn list_label(record: &TableRecord) -> String {
    let (rows, cols) = record.shape();
    format!("{} :: {}x{}", label_for(record), rows, cols)
}
