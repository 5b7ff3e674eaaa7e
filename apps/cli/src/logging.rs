//! Tracing setup shared by both binaries.
//!
//! Logs always go to stderr: stdout carries filter documents and CI output.

use tracing_subscriber::{EnvFilter, fmt};

/// Log output format.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub(crate) enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Initialize tracing. `quiet_level` is the level used without `-v`.
pub(crate) fn init_tracing(format: LogFormat, verbose: u8, quiet_level: &str) {
    let filter = match verbose {
        0 => format!("labdoc={quiet_level}"),
        1 => "labdoc=debug".to_string(),
        _ => "labdoc=trace".to_string(),
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
