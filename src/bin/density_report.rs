//! Prints keyword figures for a markdown file.
//!
//! Usage: `density_report <file> <keyword> [--threshold N]`

use clap::Parser;
use seo_article_analyzer::{cli, telemetry};

fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();
    let args = cli::Args::parse();
    print!("{}", cli::run(&args)?);
    Ok(())
}
