// src/cli.rs
//! `density_report`: keyword figures for a markdown file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::report::{KeywordReport, DEFAULT_CAUTION_THRESHOLD};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Markdown or plain-text file to score
    pub file: PathBuf,

    /// Target keyword or phrase
    pub keyword: String,

    /// Density (percent) above which the band is "caution"
    #[arg(short, long, default_value_t = DEFAULT_CAUTION_THRESHOLD)]
    pub threshold: f64,
}

/// Reads the file and renders the report. IO failures are errors; a blank
/// keyword is not.
pub fn run(args: &Args) -> Result<String> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("read {}", args.file.display()))?;
    Ok(match KeywordReport::score(&text, &args.keyword, args.threshold) {
        Some(report) => render(&report),
        None => "nothing to score: keyword is blank\n".to_string(),
    })
}

pub fn render(report: &KeywordReport) -> String {
    format!(
        "keyword:     {}\nwords:       {}\noccurrences: {}\ndensity:     {}%\nband:        {}\n",
        report.keyword,
        report.total_words,
        report.occurrence_count,
        report.density_display,
        report.band.as_str()
    )
}
