use anyhow::{anyhow, bail, Context, Result};
use stattables::{
    batch::{self, BatchReport},
    config::Settings,
    export, list_label,
};
use std::{env, path::PathBuf, process::ExitCode};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str = "\
Usage:
  stattables [--config <settings.yaml>] list   [PATH ...]
  stattables [--config <settings.yaml>] export [--out <DIR>] [PATH ...]

PATH may be an HTML file or a folder of them. Without PATH the configured
html_dir is scanned.";

enum Command {
    List,
    Export { out: Option<PathBuf> },
}

struct Args {
    config: Option<PathBuf>,
    command: Command,
    inputs: Vec<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut config = None;
    let mut command = None;
    let mut out = None;
    let mut inputs = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config = Some(PathBuf::from(
                    args.next().ok_or_else(|| anyhow!("--config needs a path"))?,
                ))
            }
            "--out" => {
                out = Some(PathBuf::from(
                    args.next().ok_or_else(|| anyhow!("--out needs a folder"))?,
                ))
            }
            "-h" | "--help" => bail!("{}", USAGE),
            "list" if command.is_none() => command = Some("list"),
            "export" if command.is_none() => command = Some("export"),
            flag if flag.starts_with("--") => bail!("unknown option {}\n\n{}", flag, USAGE),
            _ if command.is_none() => bail!("unknown command {}\n\n{}", arg, USAGE),
            _ => inputs.push(PathBuf::from(&arg)),
        }
    }

    let command = match command {
        Some("list") if out.is_none() => Command::List,
        Some("list") => bail!("--out only applies to export"),
        Some(_) => Command::Export { out },
        None => bail!("{}", USAGE),
    };
    Ok(Args {
        config,
        command,
        inputs,
    })
}

fn run(args: Args) -> Result<BatchReport> {
    let cwd = env::current_dir().context("reading working directory")?;
    let settings = Settings::load(args.config.as_deref(), &cwd)?;
    let opts = settings.extract_options();

    let inputs = if args.inputs.is_empty() {
        info!(dir = %settings.html_dir.display(), "scanning default folder");
        vec![settings.html_dir.clone()]
    } else {
        args.inputs
    };
    let files = batch::expand_inputs(&inputs)?;
    info!("{} HTML file(s) selected", files.len());

    let report = if settings.parallel {
        batch::extract_all_parallel(&files, &opts)
    } else {
        batch::extract_all(&files, &opts)
    };

    match args.command {
        Command::List => {
            for record in &report.records {
                println!("{}", list_label(record));
            }
        }
        Command::Export { out } => {
            let out_dir = out.unwrap_or_else(|| settings.out_dir.clone());
            let summary = export::export_records(&out_dir, &report.records)?;
            for (path, reason) in &summary.failures {
                eprintln!("Failed to save {}: {}", path.display(), reason);
            }
            println!(
                "Exported {} CSV file(s) into: {}",
                summary.written.len(),
                summary.open_folder.display()
            );
        }
    }

    for failure in &report.failures {
        eprintln!("Failed to parse {}: {}", failure.file_name(), failure);
    }
    println!(
        "Loaded {} table(s) from {} file(s).",
        report.records.len(),
        report.documents_ok
    );
    Ok(report)
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stattables=info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(report) if report.documents_ok == 0 && !report.failures.is_empty() => {
            warn!("every document failed");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
