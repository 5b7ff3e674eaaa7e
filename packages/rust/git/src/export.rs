//! Publishing a [`ChangeSet`] to the CI job's key/value state.
//!
//! The format is the GitHub Actions one: `key=value` lines, with multi-line
//! values written as `key<<DELIM ... DELIM` heredocs.

use std::io::Write;
use std::path::Path;

use tracing::{debug, instrument};

use labdoc_shared::{ChangeSet, ChangedChapters, LabdocError, Result};

const DELIMITER: &str = "LABDOC_EOF";

/// Job outputs: the file list under `files_key` and `true`/`false` under `flag_key`.
///
/// An empty set still writes an (empty) list, so consumers never see a missing key.
pub fn render_outputs(set: &ChangeSet, files_key: &str, flag_key: &str) -> String {
    let mut out = heredoc(files_key, &set.files);
    out.push_str(&format!("{flag_key}={}\n", !set.is_empty()));
    out
}

/// Environment export of the file list under `env_key`.
pub fn render_env(set: &ChangeSet, env_key: &str) -> String {
    heredoc(env_key, &set.files)
}

fn heredoc(key: &str, lines: &[String]) -> String {
    let mut delimiter = DELIMITER.to_string();
    while lines.iter().any(|l| *l == delimiter) {
        delimiter.push('_');
    }

    let mut out = format!("{key}<<{delimiter}\n");
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(&delimiter);
    out.push('\n');
    out
}

/// Append `content` to the state file at `path`, creating it if needed.
#[instrument(skip(content))]
pub fn append_to_file(path: &Path, content: &str) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LabdocError::io(path, e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| LabdocError::io(path, e))?;
    debug!(bytes = content.len(), "appended key/value state");
    Ok(())
}

/// Write `changed-chapters.json` for the home-page banner.
pub fn write_chapters_json(path: &Path, set: &ChangeSet) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| LabdocError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(&ChangedChapters::from(set))?;
    std::fs::write(path, json).map_err(|e| LabdocError::io(path, e))?;
    debug!(?path, chapters = set.len(), "wrote changed chapters");
    Ok(())
}
