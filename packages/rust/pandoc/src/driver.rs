//! pandoc's JSON filter protocol: document JSON in, document JSON out.

use std::io::{Read, Write};

use tracing::{info, instrument, warn};

use labdoc_git::GitCli;
use labdoc_shared::{FiltersConfig, LabdocError, OutputFormat, Result};

use crate::ast::Pandoc;
use crate::git_info::ci_branch_from_env;
use crate::transform::{FilterChain, FilterContext};

/// Run `chain` over one serialized document.
///
/// Input that does not parse as a pandoc document is returned unchanged, so a
/// renderer speaking a newer AST version still gets its document back.
#[instrument(skip_all, fields(format = %ctx.format, input_len = input.len()))]
pub fn filter_json(input: &str, chain: &FilterChain, ctx: &FilterContext) -> String {
    let doc: Pandoc = match serde_json::from_str(input) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(error = %e, "could not parse document, passing it through unchanged");
            return input.to_string();
        }
    };

    let doc = chain.run(doc, ctx);
    match serde_json::to_string(&doc) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "could not serialize filtered document, passing input through");
            input.to_string()
        }
    }
}

/// Read a document from `reader`, filter it, and write it to `writer`.
pub fn run_filter(
    mut reader: impl Read,
    mut writer: impl Write,
    chain: &FilterChain,
    ctx: &FilterContext,
) -> Result<()> {
    let mut input = String::new();
    reader
        .read_to_string(&mut input)
        .map_err(|e| LabdocError::io("<stdin>", e))?;

    let output = filter_json(&input, chain, ctx);
    writer
        .write_all(output.as_bytes())
        .and_then(|()| writer.flush())
        .map_err(|e| LabdocError::io("<stdout>", e))?;

    info!(filters = ?chain.names(), "document filtered");
    Ok(())
}

/// Filter stdin to stdout with the configured chain, the way pandoc invokes
/// a JSON filter: `format` is the output format pandoc passes as argument.
pub fn run_stdio_filter(config: &FiltersConfig, format: &str) -> Result<()> {
    let chain = FilterChain::from_config(config, GitCli::new(), ci_branch_from_env());
    let ctx = FilterContext::new(OutputFormat::parse(format));
    run_filter(std::io::stdin().lock(), std::io::stdout().lock(), &chain, &ctx)
}
