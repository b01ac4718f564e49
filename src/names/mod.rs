// src/names/mod.rs
//! Subject names and file-name helpers derived from scraped page names.
//!
//! Saved pages carry the site's boilerplate in their file names, e.g.
//! `Florian Wirtz Stats, Goals, Records and Goals | FBref.com.html`. The
//! subject is what remains after the boilerplate is cut away.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::trace;

/// Extension used for display file names.
pub const DISPLAY_EXTENSION: &str = "html";

// Applied in order; each rule assumes the previous ones already ran.
static BOILERPLATE_RULES: Lazy<[Regex; 4]> = Lazy::new(|| {
    [
        Regex::new(r"(?i)\s*\|\s*[^|]*$").expect("brand suffix regex"),
        Regex::new(r"(?i)\s*(Domestic League)?\s*Stats.*$").expect("league stats regex"),
        Regex::new(r"(?i)\s*Stats,\s*Goals,\s*Records.*$").expect("stats goals regex"),
        Regex::new(r"(?i)\s*Match Logs.*$").expect("match logs regex"),
    ]
});

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

static UNSAFE_FILENAME_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\-.]+").expect("filename regex"));

static UNDERSCORE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").expect("underscore regex"));

/// Collapse whitespace runs to one space and trim.
pub fn collapse_ws(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s, " ").trim().to_string()
}

/// Strip the known boilerplate from a file stem, returning the bare subject.
/// Falls back to `stem` untouched when nothing is left.
pub fn subject_name(stem: &str) -> String {
    let mut name = stem.to_string();
    for rule in BOILERPLATE_RULES.iter() {
        name = rule.replace(&name, "").into_owned();
    }
    let name = collapse_ws(&name);
    if name.is_empty() {
        trace!(stem, "boilerplate consumed whole stem, keeping it");
        stem.to_string()
    } else {
        name
    }
}

/// `Florian Wirtz Stats | FBref.com` -> `Florian Wirtz.html`
pub fn display_file_name(stem: &str) -> String {
    format!("{}.{}", subject_name(stem), DISPLAY_EXTENSION)
}

/// Stem of `path` as a string, empty if there is none.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Reduce `text` to word characters, `-` and `.`, with single underscores in
/// between. Never returns an empty string.
pub fn sanitize_filename(text: &str) -> String {
    let replaced = UNSAFE_FILENAME_RUN.replace_all(text, "_");
    let collapsed = UNDERSCORE_RUN.replace_all(&replaced, "_");
    let trimmed = collapsed.trim_matches('_');
    if trimmed.is_empty() {
        "table".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_brand_suffix() {
        assert_eq!(subject_name("Florian Wirtz | SiteName"), "Florian Wirtz");
        assert_eq!(subject_name("Florian Wirtz | fbref.com"), "Florian Wirtz");
    }

    #[test]
    fn strips_stats_goals_records() {
        assert_eq!(
            subject_name("Florian Wirtz Stats, Goals, Records and Goals"),
            "Florian Wirtz"
        );
    }

    #[test]
    fn strips_domestic_league_and_match_logs() {
        assert_eq!(
            subject_name("Florian Wirtz Domestic League Stats | FBref.com"),
            "Florian Wirtz"
        );
        assert_eq!(
            subject_name("Florian  Wirtz   Match Logs (Last 5) | FBref.com"),
            "Florian Wirtz"
        );
        assert_eq!(subject_name("Bukayo Saka MATCH LOGS"), "Bukayo Saka");
    }

    #[test]
    fn empty_result_falls_back_to_stem() {
        assert_eq!(subject_name("Stats | FBref.com"), "Stats | FBref.com");
        assert_eq!(subject_name("   "), "   ");
    }

    #[test]
    fn display_name_uses_html_extension() {
        assert_eq!(
            display_file_name("Florian Wirtz Stats, Goals, Records | FBref.com"),
            "Florian Wirtz.html"
        );
    }

    #[test]
    fn sanitize_collapses_unsafe_runs() {
        assert_eq!(
            sanitize_filename("Florian Wirtz | FBref.com"),
            "Florian_Wirtz_FBref.com"
        );
        assert_eq!(sanitize_filename("stats_standard_dom_lg"), "stats_standard_dom_lg");
        assert_eq!(sanitize_filename("__a  //  b__"), "a_b");
        assert_eq!(sanitize_filename("///"), "table");
    }
}
