use anyhow::Result;
use serde::Serialize;
use stattables::{extract, label_for, names::display_file_name, TableRecord};
use std::{env, path::Path, process::exit};

#[derive(Serialize)]
struct Inspected<'a> {
    label: String,
    #[serde(flatten)]
    record: &'a TableRecord,
}

fn main() {
    // Expect exactly one CLI argument: path to a saved HTML page.
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <HTML_FILE>", args[0]);
        exit(1);
    }
    if let Err(e) = inspect_tables(Path::new(&args[1])) {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

/// Print every table of the page as pretty JSON, labelled the way lists show them.
fn inspect_tables(path: &Path) -> Result<()> {
    let records = extract(path)?;
    let stem = stattables::names::file_stem(path);
    eprintln!(
        "=== {} ({} table(s)) ===",
        display_file_name(&stem),
        records.len()
    );

    let out: Vec<Inspected<'_>> = records
        .iter()
        .map(|record| Inspected {
            label: label_for(record),
            record,
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
