//! `labdoc-pandoc-filter`: the JSON filter executable handed to pandoc.
//!
//! pandoc runs it as `labdoc-pandoc-filter <format>` with the document on
//! stdin. A filter must never fail a render, so configuration problems fall
//! back to the defaults.

mod logging;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use labdoc_shared::{AppConfig, load_config};
use tracing::warn;

use logging::LogFormat;

#[derive(Parser)]
#[command(
    name = "labdoc-pandoc-filter",
    version,
    about = "Pandoc JSON filter: page breaks, version appendix, and preview banner.",
    long_about = None,
)]
struct Args {
    /// Output format pandoc is producing (e.g. docx, latex, html).
    format: String,

    /// Path to labdoc.toml (defaults to ./labdoc.toml).
    #[arg(long, env = "LABDOC_CONFIG")]
    config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    logging::init_tracing(args.log_format, args.verbose, "warn");

    let config = load_config(args.config.as_deref()).unwrap_or_else(|e| {
        warn!(error = %e, "invalid configuration, using defaults");
        AppConfig::default()
    });

    labdoc_pandoc::run_stdio_filter(&config.filters, &args.format)?;
    Ok(())
}
