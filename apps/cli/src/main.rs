//! labdoc CLI: automation for the lab manual's render and preview workflow.
//!
//! Detects changed chapters, runs the pandoc filter chain, and post-processes
//! rendered preview sites.

mod commands;
mod logging;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    logging::init_tracing(cli.log_format, cli.verbose, "info");
    commands::run(cli)
}
