//! Changed documentation sources between a base revision and the working head.

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use labdoc_shared::{ChangeSet, ChangesConfig};

use crate::repo::GitSource;

/// Inputs for [`detect_changes`].
#[derive(Debug, Clone)]
pub struct DetectOptions {
    /// Base branch or revision.
    pub base_ref: String,
    /// Revision compared against the base, normally `HEAD`.
    pub head: String,
    /// Remote the base is fetched from; empty means the base is local only.
    pub remote: String,
    /// Extension (without the dot) of the files of interest.
    pub extension: String,
    /// Fetch the base from the remote before diffing.
    pub fetch: bool,
}

impl From<&ChangesConfig> for DetectOptions {
    fn from(config: &ChangesConfig) -> Self {
        Self {
            base_ref: config.base_ref.clone(),
            head: "HEAD".into(),
            remote: config.remote.clone(),
            extension: config.extension.clone(),
            fetch: config.fetch,
        }
    }
}

impl DetectOptions {
    /// Diff ranges to try, most specific first.
    fn ranges(&self) -> Vec<String> {
        let mut ranges = Vec::with_capacity(2);
        if !self.remote.is_empty() {
            ranges.push(format!("{}/{}...{}", self.remote, self.base_ref, self.head));
        }
        ranges.push(format!("{}...{}", self.base_ref, self.head));
        ranges
    }
}

/// List the documentation files that differ between `opts.base_ref` and `opts.head`.
///
/// Never fails: a failed fetch is logged and ignored, and if no diff range can
/// be resolved the result is the empty change set.
#[instrument(skip_all, fields(base = %opts.base_ref, head = %opts.head))]
pub fn detect_changes(git: &dyn GitSource, opts: &DetectOptions) -> ChangeSet {
    if opts.base_ref == opts.head {
        debug!("base and head are the same revision");
        return ChangeSet::default();
    }

    if opts.fetch && !opts.remote.is_empty() {
        if let Err(e) = git.fetch(&opts.remote, &opts.base_ref) {
            warn!(remote = %opts.remote, error = %e, "could not fetch base, diffing against local refs");
        }
    }

    let names = opts.ranges().into_iter().find_map(|range| match git.diff_names(&range) {
        Ok(names) => {
            debug!(%range, total = names.len(), "diff resolved");
            Some(names)
        }
        Err(e) => {
            debug!(%range, error = %e, "diff range unavailable");
            None
        }
    });

    let Some(names) = names else {
        warn!("no diff range could be resolved, reporting no changes");
        return ChangeSet::default();
    };

    let set = ChangeSet::new(filter_by_extension(names, &opts.extension));
    info!(changed = set.len(), "detected changed documentation files");
    set
}

/// Keep paths whose extension matches `extension` (case-insensitive), preserving order.
pub fn filter_by_extension(paths: Vec<String>, extension: &str) -> Vec<String> {
    let wanted = extension.trim_start_matches('.');
    paths
        .into_iter()
        .filter(|p| {
            Path::new(p)
                .extension()
                .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(wanted))
        })
        .collect()
}
