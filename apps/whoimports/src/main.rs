mod config;
mod output;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use log::{debug, info};
use std::env;
use std::io::{BufWriter, Write};
use std::time::Instant;
use whoimports_core::{ImportFinder, LogReporter, ScanOutcome, collect_source_files};

use crate::config::Config;

fn main() -> Result<()> {
    env_logger::init();

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let mut cfg = Config::parse();
    debug!("Parsed CLI arguments: {:?}", cfg);

    let start = Instant::now();
    let root = cfg.initialize()?;

    let files = collect_source_files(&cfg.collector_config(root.clone()))?;
    info!("Scanning {} source files (concurrency {})", files.len(), cfg.concurrency);

    let finder = ImportFinder::new(&root, &LogReporter)?.with_concurrency(cfg.concurrency);
    let outcome = if cfg.dir {
        ScanOutcome::Directory(finder.find_directory_importers(&cfg.target, &files)?)
    } else {
        finder.find(&cfg.target, &files)?
    };

    if cfg.json {
        output::write_json(&mut stdout, &outcome)?;
        return Ok(());
    }

    let base = env::current_dir().unwrap_or_else(|_| root.clone());
    output::print_outcome(&mut stdout, &outcome, &base)?;

    let elapsed_ms = start.elapsed().as_millis();
    writeln!(
        stdout,
        "\n{} Finished in {}ms on {} files.",
        "●".bright_blue(),
        elapsed_ms.to_string().cyan(),
        files.len().to_string().cyan()
    )?;
    stdout.flush()?;

    Ok(())
}
