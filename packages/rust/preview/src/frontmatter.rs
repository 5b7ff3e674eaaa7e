//! Flagging changed sources in their YAML front matter.
//!
//! The renderer exposes front matter as document metadata, which is how the
//! preview-banner filter learns a page changed.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use labdoc_shared::{LabdocError, Result};

/// Outcome of [`mark_changed_files`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MarkReport {
    /// Files whose front matter was updated.
    pub marked: Vec<PathBuf>,
    /// Files that already carried the flag.
    pub already_marked: Vec<PathBuf>,
    /// Listed files that do not exist.
    pub missing: Vec<PathBuf>,
}

/// Return `content` with `<key>: true` in its front matter.
///
/// A document without a well-formed front matter block (opening `---` on the
/// first line and a closing `---` line) gets a new block prepended. Lines are
/// written with the document's own ending, `\n` or `\r\n`. Returns `None`
/// when the key is already present.
pub fn mark_changed(content: &str, key: &str) -> Option<String> {
    let eol = line_ending(content);
    let fence = format!("---{eol}");
    let closing = format!("{eol}---{eol}");
    let flag = format!("{key}: true");
    let prepend = || Some(format!("{fence}{flag}{eol}{fence}{content}"));

    let Some(rest) = content.strip_prefix(fence.as_str()) else {
        return prepend();
    };

    let (front, body) = if let Some(body) = rest.strip_prefix(fence.as_str()) {
        ("", body)
    } else if let Some(end) = rest.find(closing.as_str()) {
        (&rest[..end], &rest[end + closing.len()..])
    } else {
        return prepend();
    };

    let prefix = format!("{key}:");
    if front.lines().any(|line| line.trim_start().starts_with(&prefix)) {
        return None;
    }

    let front = front.trim_end();
    let separator = if front.is_empty() { "" } else { eol };
    Some(format!("{fence}{front}{separator}{flag}{closing}{body}"))
}

/// Line ending of the first line: `\r\n` or `\n`.
fn line_ending(content: &str) -> &'static str {
    match content.find('\n') {
        Some(at) if content[..at].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

/// Apply [`mark_changed`] to every listed file that exists.
#[instrument(skip_all, fields(files = files.len(), key = %key))]
pub fn mark_changed_files(files: &[PathBuf], key: &str) -> Result<MarkReport> {
    let mut report = MarkReport::default();

    for path in files {
        if !path.is_file() {
            warn!(?path, "changed file not found");
            report.missing.push(path.clone());
            continue;
        }

        let content = read(path)?;
        match mark_changed(&content, key) {
            Some(updated) => {
                std::fs::write(path, updated).map_err(|e| LabdocError::io(path, e))?;
                debug!(?path, "marked as changed");
                report.marked.push(path.clone());
            }
            None => report.already_marked.push(path.clone()),
        }
    }

    info!(
        marked = report.marked.len(),
        already_marked = report.already_marked.len(),
        missing = report.missing.len(),
        "front matter updated"
    );
    Ok(report)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| LabdocError::io(path, e))
}
